//! Persistence and master-data collaborator interfaces.
//!
//! The engine consumes storage through the narrow traits here and the
//! surrounding application decides the backend. Services are handed
//! their collaborators once at construction — no service locator.
//! [`MemoryStore`] and [`MemoryDirectory`] are the in-crate reference
//! implementation, used by the tests.

mod memory;

pub use memory::{MemoryDirectory, MemoryStore};

use crate::core::{
    Client, ClientId, Company, CompanyId, Invoice, InvoiceId, InvoiceItem, InvoicingError, ItemId,
    PaymentDetail,
};

/// Read access to company and client master data (managed elsewhere).
pub trait Directory {
    /// Load a company with its terms and conditions eagerly attached.
    fn company(&self, id: CompanyId) -> Result<Company, InvoicingError>;

    fn client(&self, id: ClientId) -> Result<Client, InvoicingError>;

    /// Whether the client is associated with the company.
    fn is_client_of(
        &self,
        client_id: ClientId,
        company_id: CompanyId,
    ) -> Result<bool, InvoicingError>;

    /// Payment details registered for the company.
    fn payment_details(&self, company_id: CompanyId) -> Result<Vec<PaymentDetail>, InvoicingError>;
}

/// Transactional access to invoice and line-item rows.
pub trait Store: Send + Sync {
    /// Run `f` against a consistent view of the data.
    ///
    /// Every change staged through the transaction commits atomically
    /// when `f` returns `Ok` and is discarded when it returns `Err`.
    /// Transactions touching the same invoice are serialized by the
    /// implementation; an observer can never see an invoice whose totals
    /// disagree with its attached items.
    fn transaction<T, F>(&self, f: F) -> Result<T, InvoicingError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, InvoicingError>;
}

/// Row operations available inside a [`Store::transaction`].
///
/// Reads exclude soft-deleted rows. `insert_invoice` enforces reference
/// uniqueness and reports a duplicate as [`InvoicingError::Conflict`].
pub trait StoreTx {
    fn invoice(&self, id: InvoiceId) -> Result<Invoice, InvoicingError>;

    fn invoices(&self) -> Result<Vec<Invoice>, InvoicingError>;

    /// Items currently attached to the invoice.
    fn items_of(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceItem>, InvoicingError>;

    fn item(&self, id: ItemId) -> Result<InvoiceItem, InvoicingError>;

    fn items(&self) -> Result<Vec<InvoiceItem>, InvoicingError>;

    fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), InvoicingError>;

    fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), InvoicingError>;

    /// Hard delete; attached items are removed with the invoice.
    fn remove_invoice(&mut self, id: InvoiceId) -> Result<(), InvoicingError>;

    fn insert_item(&mut self, item: &InvoiceItem) -> Result<(), InvoicingError>;

    fn update_item(&mut self, item: &InvoiceItem) -> Result<(), InvoicingError>;

    fn remove_item(&mut self, id: ItemId) -> Result<(), InvoicingError>;
}
