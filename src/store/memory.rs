use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{Directory, Store, StoreTx};
use crate::core::{
    Client, ClientId, Company, CompanyId, Invoice, InvoiceId, InvoiceItem, InvoicingError, ItemId,
    PaymentDetail,
};

/// In-memory invoice/item store.
///
/// A single interior lock serializes transactions — stricter than the
/// required per-invoice ordering. Rollback works by snapshot copy: the
/// transaction runs against a copy of the tables which replaces the
/// committed state only on `Ok`, giving exact all-or-nothing semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    invoices: HashMap<InvoiceId, Invoice>,
    items: HashMap<ItemId, InvoiceItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T, InvoicingError>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, InvoicingError>,
    {
        let mut committed = self
            .inner
            .lock()
            .map_err(|_| InvoicingError::storage("store lock poisoned"))?;
        let mut tx = MemoryTx {
            tables: committed.clone(),
        };
        let out = f(&mut tx)?;
        *committed = tx.tables;
        Ok(out)
    }
}

struct MemoryTx {
    tables: Tables,
}

impl MemoryTx {
    fn live_invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.tables
            .invoices
            .get(&id)
            .filter(|invoice| !invoice.record.is_deleted())
    }

    fn live_item(&self, id: ItemId) -> Option<&InvoiceItem> {
        self.tables
            .items
            .get(&id)
            .filter(|item| !item.record.is_deleted())
    }
}

impl StoreTx for MemoryTx {
    fn invoice(&self, id: InvoiceId) -> Result<Invoice, InvoicingError> {
        self.live_invoice(id)
            .cloned()
            .ok_or(InvoicingError::NotFound("invoice"))
    }

    fn invoices(&self) -> Result<Vec<Invoice>, InvoicingError> {
        let mut rows: Vec<Invoice> = self
            .tables
            .invoices
            .values()
            .filter(|invoice| !invoice.record.is_deleted())
            .cloned()
            .collect();
        rows.sort_by_key(|invoice| invoice.record.created_at);
        Ok(rows)
    }

    fn items_of(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceItem>, InvoicingError> {
        let mut rows: Vec<InvoiceItem> = self
            .tables
            .items
            .values()
            .filter(|item| item.invoice_id == Some(invoice_id) && !item.record.is_deleted())
            .cloned()
            .collect();
        rows.sort_by_key(|item| item.record.created_at);
        Ok(rows)
    }

    fn item(&self, id: ItemId) -> Result<InvoiceItem, InvoicingError> {
        self.live_item(id)
            .cloned()
            .ok_or(InvoicingError::NotFound("invoice item"))
    }

    fn items(&self) -> Result<Vec<InvoiceItem>, InvoicingError> {
        let mut rows: Vec<InvoiceItem> = self
            .tables
            .items
            .values()
            .filter(|item| !item.record.is_deleted())
            .cloned()
            .collect();
        rows.sort_by_key(|item| item.record.created_at);
        Ok(rows)
    }

    fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), InvoicingError> {
        // Unique constraint on `reference`, soft-deleted rows included.
        let duplicate = self
            .tables
            .invoices
            .values()
            .any(|existing| existing.reference == invoice.reference);
        if duplicate {
            return Err(InvoicingError::conflict(format!(
                "invoice reference {} already exists",
                invoice.reference
            )));
        }
        if self.tables.invoices.contains_key(&invoice.id) {
            return Err(InvoicingError::conflict(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }
        self.tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), InvoicingError> {
        if self.live_invoice(invoice.id).is_none() {
            return Err(InvoicingError::NotFound("invoice"));
        }
        self.tables.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    fn remove_invoice(&mut self, id: InvoiceId) -> Result<(), InvoicingError> {
        if self.live_invoice(id).is_none() {
            return Err(InvoicingError::NotFound("invoice"));
        }
        self.tables.invoices.remove(&id);
        self.tables
            .items
            .retain(|_, item| item.invoice_id != Some(id));
        Ok(())
    }

    fn insert_item(&mut self, item: &InvoiceItem) -> Result<(), InvoicingError> {
        if self.tables.items.contains_key(&item.id) {
            return Err(InvoicingError::conflict(format!(
                "invoice item {} already exists",
                item.id
            )));
        }
        self.tables.items.insert(item.id, item.clone());
        Ok(())
    }

    fn update_item(&mut self, item: &InvoiceItem) -> Result<(), InvoicingError> {
        if self.live_item(item.id).is_none() {
            return Err(InvoicingError::NotFound("invoice item"));
        }
        self.tables.items.insert(item.id, item.clone());
        Ok(())
    }

    fn remove_item(&mut self, id: ItemId) -> Result<(), InvoicingError> {
        if self.live_item(id).is_none() {
            return Err(InvoicingError::NotFound("invoice item"));
        }
        self.tables.items.remove(&id);
        Ok(())
    }
}

/// In-memory company/client master data for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    inner: Mutex<Master>,
}

#[derive(Debug, Clone, Default)]
struct Master {
    companies: HashMap<CompanyId, Company>,
    clients: HashMap<ClientId, Client>,
    memberships: HashSet<(ClientId, CompanyId)>,
    payment_details: Vec<PaymentDetail>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_company(&self, company: Company) {
        self.lock().companies.insert(company.id, company);
    }

    /// Register a client and its company associations.
    pub fn add_client(&self, client: Client, companies: &[CompanyId]) {
        let mut master = self.lock();
        for &company_id in companies {
            master.memberships.insert((client.id, company_id));
        }
        master.clients.insert(client.id, client);
    }

    pub fn add_payment_detail(&self, detail: PaymentDetail) {
        self.lock().payment_details.push(detail);
    }

    /// Set or clear a company's terms and conditions.
    pub fn set_terms(&self, company_id: CompanyId, terms: Option<String>) {
        if let Some(company) = self.lock().companies.get_mut(&company_id) {
            company.terms_conditions = terms;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Master> {
        self.inner.lock().expect("directory lock poisoned")
    }
}

impl Directory for MemoryDirectory {
    fn company(&self, id: CompanyId) -> Result<Company, InvoicingError> {
        self.lock()
            .companies
            .get(&id)
            .cloned()
            .ok_or(InvoicingError::NotFound("company"))
    }

    fn client(&self, id: ClientId) -> Result<Client, InvoicingError> {
        self.lock()
            .clients
            .get(&id)
            .cloned()
            .ok_or(InvoicingError::NotFound("client"))
    }

    fn is_client_of(
        &self,
        client_id: ClientId,
        company_id: CompanyId,
    ) -> Result<bool, InvoicingError> {
        Ok(self.lock().memberships.contains(&(client_id, company_id)))
    }

    fn payment_details(&self, company_id: CompanyId) -> Result<Vec<PaymentDetail>, InvoicingError> {
        Ok(self
            .lock()
            .payment_details
            .iter()
            .filter(|detail| detail.company_id == company_id)
            .cloned()
            .collect())
    }
}
