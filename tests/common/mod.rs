#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use facturier::core::*;
use facturier::document::{RenderedPage, VisualRenderer};
use facturier::invoice::InvoiceService;
use facturier::items::ItemService;
use facturier::store::{MemoryDirectory, MemoryStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct Env {
    pub store: Arc<MemoryStore>,
    pub directory: Arc<MemoryDirectory>,
    pub items: ItemService<MemoryStore>,
    pub invoices: InvoiceService<MemoryStore, MemoryDirectory>,
    pub company: Company,
    pub client: Client,
}

/// Fully configured environment: company with terms and one payment
/// detail, client associated with the company.
pub fn env() -> Env {
    env_with(true, true)
}

pub fn env_without_terms() -> Env {
    env_with(false, true)
}

pub fn env_without_payment_details() -> Env {
    env_with(true, false)
}

fn env_with(terms: bool, payment_details: bool) -> Env {
    let store = Arc::new(MemoryStore::new());
    let directory = Arc::new(MemoryDirectory::new());

    let company = Company {
        id: CompanyId::new(),
        name: "ACME SARL".into(),
        siret: "12345678901234".into(),
        vat_number: "FR12345678901".into(),
        phone: "+33123456789".into(),
        address: Address {
            street: "123 rue de Rivoli".into(),
            zipcode: "75001".into(),
            city: "Paris".into(),
            country: "FR".into(),
        },
        logo_url: None,
        terms_conditions: terms.then(|| "Paiement à 30 jours, pénalités de retard 10%.".into()),
    };
    let client = Client {
        id: ClientId::new(),
        name: "Client & Fils".into(),
        siret: "98765432109876".into(),
        vat_number: "FR98765432109".into(),
        phone: "+33100000000".into(),
        address: Address {
            street: "1 avenue des Champs".into(),
            zipcode: "75008".into(),
            city: "Paris".into(),
            country: "FR".into(),
        },
    };

    directory.add_company(company.clone());
    directory.add_client(client.clone(), &[company.id]);
    if payment_details {
        directory.add_payment_detail(PaymentDetail {
            id: PaymentDetailId::new(),
            company_id: company.id,
            bank_name: "Banque de Paris".into(),
            iban: "FR7630006000011234567890189".into(),
            bic: "BDFEFRPP".into(),
            owner_name: "ACME SARL".into(),
        });
    }

    Env {
        items: ItemService::new(Arc::clone(&store)),
        invoices: InvoiceService::new(Arc::clone(&store), Arc::clone(&directory)),
        store,
        directory,
        company,
        client,
    }
}

/// The worked scenario: 3 x 117.91 at 20% VAT.
pub fn car_rental() -> NewInvoiceItem {
    NewInvoiceItem {
        label: "Location de voiture".into(),
        description: Some("rouge".into()),
        quantity: 3,
        unit_price: dec!(117.91),
        vat_rate: dec!(20),
    }
}

pub fn new_item(quantity: u32, unit_price: Decimal, vat_rate: Decimal) -> NewInvoiceItem {
    NewInvoiceItem {
        label: "Prestation".into(),
        description: None,
        quantity,
        unit_price,
        vat_rate,
    }
}

pub fn due_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
}

/// Renderer producing a minimal single-page PDF and recording the
/// markup it was handed.
#[derive(Default)]
pub struct StubRenderer {
    pub last_page: Mutex<Option<RenderedPage>>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self) -> String {
        self.last_page
            .lock()
            .unwrap()
            .as_ref()
            .expect("renderer was never called")
            .html
            .clone()
    }
}

impl VisualRenderer for StubRenderer {
    fn render(&self, page: &RenderedPage) -> Result<Vec<u8>, InvoicingError> {
        *self.last_page.lock().unwrap() = Some(page.clone());
        Ok(minimal_pdf())
    }
}

/// Renderer standing in for a crashed headless backend.
pub struct FailingRenderer;

impl VisualRenderer for FailingRenderer {
    fn render(&self, _page: &RenderedPage) -> Result<Vec<u8>, InvoicingError> {
        Err(InvoicingError::generation("headless renderer exited"))
    }
}

/// Create a minimal valid PDF in memory using lopdf.
pub fn minimal_pdf() -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(font_id),
        },
    });
    let content = Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 100 700 Td (Facture) Tj ET".to_vec(),
    );
    let content_id = doc.add_object(content);
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("save minimal PDF");
    output
}
