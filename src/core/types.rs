use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque invoice identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

/// Opaque line-item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

/// Opaque company identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub Uuid);

/// Opaque client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

/// Opaque payment-detail identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentDetailId(pub Uuid);

macro_rules! impl_id {
    ($($name:ident),+) => {$(
        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    )+};
}

impl_id!(InvoiceId, ItemId, CompanyId, ClientId, PaymentDetailId);

/// Row stamp embedded by value in every persisted entity.
///
/// Reads through the store exclude rows with `deleted_at` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// A fresh stamp for a row created now.
    pub fn now() -> Self {
        let at = Utc::now();
        Self {
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Invoice lifecycle state. `Published` is terminal — there is no
/// un-publish or archive transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Published,
}

/// Settlement state, an axis independent from [`InvoiceStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    PartiallyPaid,
}

/// An invoice row. Totals are derived — recomputed whenever the attached
/// item set changes, never set by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Globally unique `YYYYMMDD-NNNN` reference; immutable after creation.
    pub reference: String,
    /// Absent while Draft; set to the publish date, never modified after.
    pub issue_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    /// Pre-tax total (HT), 2-decimal scale.
    pub total_ht: Decimal,
    /// Tax amount, 2-decimal scale.
    pub total_vat: Decimal,
    /// Tax-inclusive total (TTC) — always `total_ht + total_vat` exactly.
    pub total_ttc: Decimal,
    /// Owning company; immutable after creation.
    pub company_id: CompanyId,
    /// Billed client; must belong to the owning company.
    pub client_id: ClientId,
    #[serde(flatten)]
    pub record: Record,
}

impl Invoice {
    pub fn is_published(&self) -> bool {
        self.status == InvoiceStatus::Published
    }
}

/// A billable line item. Exists independently of any invoice; the
/// nullable `invoice_id` is the only link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: ItemId,
    pub label: String,
    pub description: Option<String>,
    /// Positive integer quantity (>= 1).
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Flat VAT rate in percent for this line.
    pub vat_rate: Decimal,
    /// Derived `quantity * unit_price`; never allowed to drift.
    pub unit_total_ht: Decimal,
    pub invoice_id: Option<InvoiceId>,
    #[serde(flatten)]
    pub record: Record,
}

/// Postal address used verbatim in rendered documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub zipcode: String,
    pub city: String,
    pub country: String,
}

/// Seller-side master data (managed by an external collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// 14-digit legal registration identifier.
    pub siret: String,
    pub vat_number: String,
    pub phone: String,
    pub address: Address,
    pub logo_url: Option<String>,
    /// Required before any of this company's invoices can be published
    /// or exported.
    pub terms_conditions: Option<String>,
}

/// Buyer-side master data (managed by an external collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub siret: String,
    pub vat_number: String,
    pub phone: String,
    pub address: Address,
}

/// A company bank account; at least one is required before publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub id: PaymentDetailId,
    pub company_id: CompanyId,
    pub bank_name: String,
    pub iban: String,
    pub bic: String,
    pub owner_name: String,
}

/// Input for creating a line item (unattached).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Defaults to 0 when omitted.
    #[serde(default)]
    pub vat_rate: Decimal,
}

/// Partial update for a line item; `None` leaves a field unchanged.
/// Invoice linkage is never touched here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceItemPatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
}

/// Input for creating an invoice in Draft with the given items attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<ItemId>,
}

/// Metadata update for a draft invoice. The owning company cannot be
/// changed after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<ClientId>,
}
