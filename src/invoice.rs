//! Invoice state machine: Draft → Published.
//!
//! An invoice is created in Draft with zero totals, accumulates items
//! while Draft (each link change recomputes the stored totals inside
//! the same transaction), and transitions to Published exactly once.
//! Publishing requires the owning company to carry terms and conditions
//! and at least one payment detail.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{
    Company, InvoicingError, Invoice, InvoiceId, InvoiceItem, InvoiceStatus, InvoiceUpdate, ItemId,
    NewInvoice, PaymentDetail, PaymentStatus, Record, compute_totals, reference,
};
use crate::document::{DocumentEngine, GeneratedDocument, InvoiceSnapshot, VisualRenderer};
use crate::store::{Directory, Store, StoreTx};

/// How many times creation regenerates the reference when the store
/// reports a uniqueness conflict.
const REFERENCE_ATTEMPTS: usize = 3;

/// An invoice together with its attached items.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// Service owning the invoice lifecycle.
pub struct InvoiceService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S: Store, D: Directory> InvoiceService<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    /// Create a draft invoice and attach the given items — creation,
    /// linking, and the totals recompute commit in one transaction.
    pub fn create(&self, input: NewInvoice) -> Result<InvoiceDetail, InvoicingError> {
        self.directory.company(input.company_id)?;
        self.directory.client(input.client_id)?;
        self.ensure_client_of(input.client_id, input.company_id)?;

        let mut rng = rand::thread_rng();
        let today = Utc::now().date_naive();

        for attempt in 1..=REFERENCE_ATTEMPTS {
            let invoice = Invoice {
                id: InvoiceId::new(),
                reference: reference::generate(today, &mut rng),
                issue_date: None,
                due_date: input.due_date,
                status: InvoiceStatus::Draft,
                payment_status: PaymentStatus::Unpaid,
                total_ht: Decimal::ZERO,
                total_vat: Decimal::ZERO,
                total_ttc: Decimal::ZERO,
                company_id: input.company_id,
                client_id: input.client_id,
                record: Record::now(),
            };

            let result = self.store.transaction(|tx| {
                tx.insert_invoice(&invoice)?;
                link_items(tx, invoice.id, &input.items)?;
                let invoice = refresh_totals(tx, invoice.id)?;
                let items = tx.items_of(invoice.id)?;
                Ok(InvoiceDetail { invoice, items })
            });

            match result {
                Ok(detail) => {
                    info!(
                        invoice = %detail.invoice.id,
                        reference = %detail.invoice.reference,
                        company = %input.company_id,
                        "invoice created"
                    );
                    return Ok(detail);
                }
                // A fresh invoice has no attached items yet, so the only
                // conflict reachable here is the reference constraint.
                Err(InvoicingError::Conflict(_)) if attempt < REFERENCE_ATTEMPTS => {
                    debug!(reference = %invoice.reference, "reference collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }
        unreachable!("loop returns on the last attempt");
    }

    pub fn get(&self, id: InvoiceId) -> Result<InvoiceDetail, InvoicingError> {
        self.store.transaction(|tx| {
            Ok(InvoiceDetail {
                invoice: tx.invoice(id)?,
                items: tx.items_of(id)?,
            })
        })
    }

    pub fn list(&self) -> Result<Vec<Invoice>, InvoicingError> {
        self.store.transaction(|tx| tx.invoices())
    }

    pub fn list_for_company(
        &self,
        company_id: crate::core::CompanyId,
    ) -> Result<Vec<Invoice>, InvoicingError> {
        let mut rows = self.list()?;
        rows.retain(|invoice| invoice.company_id == company_id);
        Ok(rows)
    }

    /// Update due date and/or client while Draft. A new client is
    /// re-validated against the invoice's immutable company.
    pub fn update_metadata(
        &self,
        id: InvoiceId,
        update: InvoiceUpdate,
    ) -> Result<Invoice, InvoicingError> {
        let updated = self.store.transaction(|tx| {
            let mut invoice = tx.invoice(id)?;
            ensure_draft(&invoice, "Cannot update a published invoice")?;

            if let Some(due_date) = update.due_date {
                invoice.due_date = due_date;
            }
            if let Some(client_id) = update.client_id {
                self.directory.client(client_id)?;
                self.ensure_client_of(client_id, invoice.company_id)?;
                invoice.client_id = client_id;
            }
            invoice.record.touch();
            tx.update_invoice(&invoice)?;
            Ok(invoice)
        })?;
        info!(invoice = %id, "invoice updated");
        Ok(updated)
    }

    /// Payment status is an independent axis; allowed in any lifecycle
    /// state.
    pub fn set_payment_status(
        &self,
        id: InvoiceId,
        status: PaymentStatus,
    ) -> Result<Invoice, InvoicingError> {
        let updated = self.store.transaction(|tx| {
            let mut invoice = tx.invoice(id)?;
            invoice.payment_status = status;
            invoice.record.touch();
            tx.update_invoice(&invoice)?;
            Ok(invoice)
        })?;
        info!(invoice = %id, status = ?status, "invoice payment status updated");
        Ok(updated)
    }

    /// Attach items to a draft; all-or-nothing with totals recompute.
    /// Re-attaching an id already linked to this invoice (including the
    /// same id twice in one call) is a conflict, not a no-op.
    pub fn attach_items(
        &self,
        id: InvoiceId,
        item_ids: &[ItemId],
    ) -> Result<InvoiceDetail, InvoicingError> {
        let detail = self.store.transaction(|tx| {
            let invoice = tx.invoice(id)?;
            ensure_draft(&invoice, "Cannot add items to a published invoice")?;
            link_items(tx, id, item_ids)?;
            let invoice = refresh_totals(tx, id)?;
            let items = tx.items_of(id)?;
            Ok(InvoiceDetail { invoice, items })
        })?;
        info!(invoice = %id, count = item_ids.len(), "items added to invoice");
        Ok(detail)
    }

    /// Detach one item from a draft and recompute totals.
    pub fn detach_item(
        &self,
        id: InvoiceId,
        item_id: ItemId,
    ) -> Result<InvoiceDetail, InvoicingError> {
        let detail = self.store.transaction(|tx| {
            let invoice = tx.invoice(id)?;
            ensure_draft(&invoice, "Cannot remove items from a published invoice")?;

            let mut item = tx.item(item_id)?;
            if item.invoice_id != Some(id) {
                return Err(InvoicingError::bad_request("Item not found in this invoice"));
            }
            item.invoice_id = None;
            item.record.touch();
            tx.update_item(&item)?;

            let invoice = refresh_totals(tx, id)?;
            let items = tx.items_of(id)?;
            Ok(InvoiceDetail { invoice, items })
        })?;
        info!(invoice = %id, item = %item_id, "item removed from invoice");
        Ok(detail)
    }

    /// The single irreversible transition: Draft → Published. Stamps
    /// `issue_date` with the publish date.
    pub fn publish(&self, id: InvoiceId) -> Result<Invoice, InvoicingError> {
        let published = self.store.transaction(|tx| {
            let mut invoice = tx.invoice(id)?;
            if invoice.status != InvoiceStatus::Draft {
                return Err(InvoicingError::bad_request(
                    "Invoice already published or not in draft status",
                ));
            }
            self.ensure_company_configured(invoice.company_id, "publish invoice")?;

            invoice.status = InvoiceStatus::Published;
            invoice.issue_date = Some(Utc::now().date_naive());
            invoice.record.touch();
            tx.update_invoice(&invoice)?;
            Ok(invoice)
        })?;
        info!(invoice = %id, reference = %published.reference, "invoice published");
        Ok(published)
    }

    /// Hard delete a draft; attached items are removed with it.
    pub fn delete(&self, id: InvoiceId) -> Result<(), InvoicingError> {
        self.store.transaction(|tx| {
            let invoice = tx.invoice(id)?;
            if invoice.is_published() {
                return Err(InvoicingError::bad_request("Cannot delete a published invoice"));
            }
            tx.remove_invoice(id)
        })?;
        info!(invoice = %id, "invoice deleted");
        Ok(())
    }

    /// Produce the distributable Factur-X document for the invoice.
    ///
    /// Company preconditions are the same as for publishing, checked
    /// independently of lifecycle state — a draft can be previewed as
    /// long as the company is fully configured. Read-only: generation
    /// never mutates the invoice.
    pub fn generate_document<R: VisualRenderer>(
        &self,
        id: InvoiceId,
        engine: &DocumentEngine<R>,
    ) -> Result<GeneratedDocument, InvoicingError> {
        // One consistent load: the visual page and the XML must derive
        // from the same snapshot.
        let (invoice, items) = self
            .store
            .transaction(|tx| Ok((tx.invoice(id)?, tx.items_of(id)?)))?;

        let (company, payment_details) =
            self.ensure_company_configured(invoice.company_id, "generate invoice PDF")?;
        let client = self.directory.client(invoice.client_id)?;

        let snapshot = InvoiceSnapshot {
            invoice,
            items,
            company,
            client,
            payment_details,
        };
        let document = engine.generate(&snapshot)?;
        info!(invoice = %id, reference = %document.reference, "invoice document generated");
        Ok(document)
    }

    fn ensure_client_of(
        &self,
        client_id: crate::core::ClientId,
        company_id: crate::core::CompanyId,
    ) -> Result<(), InvoicingError> {
        if !self.directory.is_client_of(client_id, company_id)? {
            return Err(InvoicingError::bad_request(format!(
                "Client is not associated with this company. \
                 Please use a client that belongs to company {company_id}"
            )));
        }
        Ok(())
    }

    fn ensure_company_configured(
        &self,
        company_id: crate::core::CompanyId,
        action: &str,
    ) -> Result<(Company, Vec<PaymentDetail>), InvoicingError> {
        let company = self.directory.company(company_id)?;
        if company.terms_conditions.is_none() {
            return Err(InvoicingError::bad_request(format!(
                "Cannot {action}: Company terms and conditions not set"
            )));
        }
        let payment_details = self.directory.payment_details(company_id)?;
        if payment_details.is_empty() {
            return Err(InvoicingError::bad_request(format!(
                "Cannot {action}: Company payment details not set"
            )));
        }
        Ok((company, payment_details))
    }
}

fn ensure_draft(invoice: &Invoice, message: &str) -> Result<(), InvoicingError> {
    if invoice.is_published() {
        return Err(InvoicingError::bad_request(message));
    }
    Ok(())
}

/// Link items to an invoice inside an open transaction.
///
/// Ids are processed in order; an id already linked to this invoice —
/// pre-existing or earlier in the same call — is a conflict. An item
/// linked to another draft is re-linked and the former owner's totals
/// are refreshed; stealing from a published invoice is rejected.
fn link_items(
    tx: &mut dyn StoreTx,
    invoice_id: InvoiceId,
    item_ids: &[ItemId],
) -> Result<(), InvoicingError> {
    for &item_id in item_ids {
        let mut item = tx.item(item_id)?;
        match item.invoice_id {
            Some(owner) if owner == invoice_id => {
                return Err(InvoicingError::conflict(format!(
                    "Items already attached: {item_id}"
                )));
            }
            Some(owner) => {
                let former = tx.invoice(owner)?;
                ensure_draft(&former, "Cannot remove items from a published invoice")?;
                item.invoice_id = Some(invoice_id);
                item.record.touch();
                tx.update_item(&item)?;
                refresh_totals(tx, owner)?;
            }
            None => {
                item.invoice_id = Some(invoice_id);
                item.record.touch();
                tx.update_item(&item)?;
            }
        }
    }
    Ok(())
}

/// Recompute and persist an invoice's stored totals from its currently
/// attached items. Must run inside the transaction that changed the
/// item set.
pub(crate) fn refresh_totals(
    tx: &mut dyn StoreTx,
    invoice_id: InvoiceId,
) -> Result<Invoice, InvoicingError> {
    let mut invoice = tx.invoice(invoice_id)?;
    let items = tx.items_of(invoice_id)?;
    let totals = compute_totals(&items);
    invoice.total_ht = totals.total_ht;
    invoice.total_vat = totals.total_vat;
    invoice.total_ttc = totals.total_ttc;
    invoice.record.touch();
    tx.update_invoice(&invoice)?;
    Ok(invoice)
}
