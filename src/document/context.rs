//! Render context — the fully-populated template payload handed to the
//! visual rendering backend. Amounts are pre-formatted 2-decimal
//! strings; dates use the French `DD/MM/YYYY` form.

use chrono::NaiveDate;
use serde::Serialize;

use super::InvoiceSnapshot;
use super::xml::format_amount;
use crate::core::{Address, PaymentDetail};

/// Shown in place of the issue date when previewing a draft.
pub const ISSUE_DATE_PLACEHOLDER: &str = "--/--/----";

/// Template payload for the visual invoice document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub invoice_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub logo_url: Option<String>,
    pub sender: PartyBlock,
    pub client: PartyBlock,
    pub items: Vec<ItemRow>,
    pub total_ht: String,
    pub total_vat: String,
    pub total_ttc: String,
    pub terms_and_conditions: String,
    pub bank: Option<BankBlock>,
}

/// Identity block rendered for the seller and the buyer.
#[derive(Debug, Clone, Serialize)]
pub struct PartyBlock {
    pub name: String,
    pub full_address: String,
    pub phone: String,
    pub siret: String,
    pub vat_number: String,
}

/// One row of the line-item table.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRow {
    pub label: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub vat_rate: String,
    pub line_total: String,
}

/// Bank block from the company's first payment detail.
#[derive(Debug, Clone, Serialize)]
pub struct BankBlock {
    pub iban: String,
    pub bic: String,
    pub bank_name: String,
    pub owner_name: String,
}

impl RenderContext {
    /// Build the payload from one consistent snapshot.
    pub fn from_snapshot(snapshot: &InvoiceSnapshot) -> Self {
        let invoice = &snapshot.invoice;
        Self {
            invoice_number: invoice.reference.clone(),
            issue_date: invoice
                .issue_date
                .map(locale_date)
                .unwrap_or_else(|| ISSUE_DATE_PLACEHOLDER.to_string()),
            due_date: locale_date(invoice.due_date),
            logo_url: snapshot.company.logo_url.clone(),
            sender: PartyBlock {
                name: snapshot.company.name.clone(),
                full_address: full_address(&snapshot.company.address),
                phone: snapshot.company.phone.clone(),
                siret: snapshot.company.siret.clone(),
                vat_number: snapshot.company.vat_number.clone(),
            },
            client: PartyBlock {
                name: snapshot.client.name.clone(),
                full_address: full_address(&snapshot.client.address),
                phone: snapshot.client.phone.clone(),
                siret: snapshot.client.siret.clone(),
                vat_number: snapshot.client.vat_number.clone(),
            },
            items: snapshot
                .items
                .iter()
                .map(|item| ItemRow {
                    label: item.label.clone(),
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: format_amount(item.unit_price),
                    vat_rate: format!("{}%", format_amount(item.vat_rate)),
                    line_total: format_amount(item.unit_total_ht),
                })
                .collect(),
            total_ht: format_amount(invoice.total_ht),
            total_vat: format_amount(invoice.total_vat),
            total_ttc: format_amount(invoice.total_ttc),
            terms_and_conditions: snapshot
                .company
                .terms_conditions
                .clone()
                .unwrap_or_default(),
            bank: snapshot.payment_details.first().map(bank_block),
        }
    }
}

fn locale_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn full_address(address: &Address) -> String {
    format!(
        "{}\n{} {}, {}",
        address.street, address.zipcode, address.city, address.country
    )
}

fn bank_block(detail: &PaymentDetail) -> BankBlock {
    BankBlock {
        iban: detail.iban.clone(),
        bic: detail.bic.clone(),
        bank_name: detail.bank_name.clone(),
        owner_name: detail.owner_name.clone(),
    }
}
