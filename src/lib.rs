//! # facturier
//!
//! Invoicing back-end core: the Draft → Published invoice lifecycle,
//! line items with derived totals, and generation of Factur-X invoice
//! documents — a visual PDF with the matching EN 16931 CII XML embedded
//! as `factur-x.xml`.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point — and the stored totals always satisfy
//! `total_ttc == total_ht + total_vat` exactly.
//!
//! Persistence, master data, and visual rendering are collaborator
//! interfaces ([`store::Store`], [`store::Directory`],
//! [`document::VisualRenderer`]); services are wired once at process
//! start. The in-memory implementations back the example below.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use facturier::core::*;
//! use facturier::invoice::InvoiceService;
//! use facturier::items::ItemService;
//! use facturier::store::{MemoryDirectory, MemoryStore};
//! use rust_decimal_macros::dec;
//!
//! let store = Arc::new(MemoryStore::new());
//! let directory = Arc::new(MemoryDirectory::new());
//!
//! let company = Company {
//!     id: CompanyId::new(),
//!     name: "ACME SARL".into(),
//!     siret: "12345678901234".into(),
//!     vat_number: "FR12345678901".into(),
//!     phone: "+33123456789".into(),
//!     address: Address {
//!         street: "123 rue de Rivoli".into(),
//!         zipcode: "75001".into(),
//!         city: "Paris".into(),
//!         country: "FR".into(),
//!     },
//!     logo_url: None,
//!     terms_conditions: Some("Paiement à 30 jours.".into()),
//! };
//! let client = Client {
//!     id: ClientId::new(),
//!     name: "Client & Fils".into(),
//!     siret: "98765432109876".into(),
//!     vat_number: "FR98765432109".into(),
//!     phone: "+33100000000".into(),
//!     address: Address {
//!         street: "1 avenue des Champs".into(),
//!         zipcode: "75008".into(),
//!         city: "Paris".into(),
//!         country: "FR".into(),
//!     },
//! };
//! directory.add_client(client.clone(), &[company.id]);
//! directory.add_payment_detail(PaymentDetail {
//!     id: PaymentDetailId::new(),
//!     company_id: company.id,
//!     bank_name: "Banque de Paris".into(),
//!     iban: "FR7630006000011234567890189".into(),
//!     bic: "BDFEFRPP".into(),
//!     owner_name: "ACME SARL".into(),
//! });
//! directory.add_company(company.clone());
//!
//! let items = ItemService::new(Arc::clone(&store));
//! let invoices = InvoiceService::new(Arc::clone(&store), Arc::clone(&directory));
//!
//! let item = items
//!     .create(NewInvoiceItem {
//!         label: "Location de voiture".into(),
//!         description: Some("rouge".into()),
//!         quantity: 3,
//!         unit_price: dec!(117.91),
//!         vat_rate: dec!(20),
//!     })
//!     .unwrap();
//!
//! let detail = invoices
//!     .create(NewInvoice {
//!         company_id: company.id,
//!         client_id: client.id,
//!         due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
//!         items: vec![item.id],
//!     })
//!     .unwrap();
//! assert_eq!(detail.invoice.total_ht, dec!(353.73));
//! assert_eq!(detail.invoice.total_ttc, dec!(424.48));
//!
//! let published = invoices.publish(detail.invoice.id).unwrap();
//! assert!(published.is_published());
//! assert!(published.issue_date.is_some());
//! ```

pub mod core;
pub mod document;
pub mod invoice;
pub mod items;
pub mod store;

// Re-export core types at crate root for convenience
pub use crate::core::*;
