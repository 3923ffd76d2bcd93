//! Line item store.
//!
//! Items are created standalone (unattached) and later linked to an
//! invoice by the state machine. `unit_total_ht` is derived from
//! quantity and unit price on every write, never stored stale.

use std::sync::Arc;

use tracing::info;

use crate::core::{
    InvoiceItem, InvoiceItemPatch, InvoicingError, ItemId, NewInvoiceItem, Record, line_total,
    reject_invalid, validate_item_patch, validate_new_item,
};
use crate::invoice::refresh_totals;
use crate::store::Store;

/// Service owning invoice line items.
pub struct ItemService<S> {
    store: Arc<S>,
}

impl<S: Store> ItemService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a standalone item; `unit_total_ht` is derived.
    pub fn create(&self, input: NewInvoiceItem) -> Result<InvoiceItem, InvoicingError> {
        reject_invalid(validate_new_item(&input))?;
        let item = build_item(input);
        self.store.transaction(|tx| tx.insert_item(&item))?;
        info!(item = %item.id, "invoice item created");
        Ok(item)
    }

    /// Create a batch atomically, returning the new ids in input order.
    pub fn create_many(&self, inputs: Vec<NewInvoiceItem>) -> Result<Vec<ItemId>, InvoicingError> {
        for input in &inputs {
            reject_invalid(validate_new_item(input))?;
        }
        let items: Vec<InvoiceItem> = inputs.into_iter().map(build_item).collect();
        self.store.transaction(|tx| {
            for item in &items {
                tx.insert_item(item)?;
            }
            Ok(())
        })?;
        let ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        info!(count = ids.len(), "invoice items created");
        Ok(ids)
    }

    pub fn get(&self, id: ItemId) -> Result<InvoiceItem, InvoicingError> {
        self.store.transaction(|tx| tx.item(id))
    }

    pub fn list(&self) -> Result<Vec<InvoiceItem>, InvoicingError> {
        self.store.transaction(|tx| tx.items())
    }

    /// Apply a partial update, recomputing `unit_total_ht` when quantity
    /// or unit price change. Invoice linkage is untouched; when the item
    /// is attached to a draft, the draft's totals are refreshed in the
    /// same transaction. Items on a published invoice cannot change.
    pub fn update(&self, id: ItemId, patch: InvoiceItemPatch) -> Result<InvoiceItem, InvoicingError> {
        reject_invalid(validate_item_patch(&patch))?;
        let updated = self.store.transaction(|tx| {
            let mut item = tx.item(id)?;

            if let Some(invoice_id) = item.invoice_id {
                let invoice = tx.invoice(invoice_id)?;
                if invoice.is_published() {
                    return Err(InvoicingError::bad_request(
                        "Cannot update an item attached to a published invoice",
                    ));
                }
            }

            if let Some(label) = patch.label {
                item.label = label;
            }
            if let Some(description) = patch.description {
                item.description = Some(description);
            }
            if let Some(quantity) = patch.quantity {
                item.quantity = quantity;
            }
            if let Some(unit_price) = patch.unit_price {
                item.unit_price = unit_price;
            }
            if let Some(vat_rate) = patch.vat_rate {
                item.vat_rate = vat_rate;
            }
            item.unit_total_ht = line_total(item.quantity, item.unit_price);
            item.record.touch();
            tx.update_item(&item)?;

            if let Some(invoice_id) = item.invoice_id {
                refresh_totals(tx, invoice_id)?;
            }
            Ok(item)
        })?;
        info!(item = %id, "invoice item updated");
        Ok(updated)
    }

    /// Hard delete. Items attached to a published invoice cannot be
    /// deleted; deleting from a draft refreshes the draft's totals.
    pub fn delete(&self, id: ItemId) -> Result<(), InvoicingError> {
        self.store.transaction(|tx| {
            let item = tx.item(id)?;
            if let Some(invoice_id) = item.invoice_id {
                let invoice = tx.invoice(invoice_id)?;
                if invoice.is_published() {
                    return Err(InvoicingError::bad_request(
                        "Cannot delete an item attached to a published invoice",
                    ));
                }
                tx.remove_item(id)?;
                refresh_totals(tx, invoice_id)?;
            } else {
                tx.remove_item(id)?;
            }
            Ok(())
        })?;
        info!(item = %id, "invoice item deleted");
        Ok(())
    }
}

fn build_item(input: NewInvoiceItem) -> InvoiceItem {
    InvoiceItem {
        id: ItemId::new(),
        label: input.label,
        description: input.description,
        quantity: input.quantity,
        unit_price: input.unit_price,
        vat_rate: input.vat_rate,
        unit_total_ht: line_total(input.quantity, input.unit_price),
        invoice_id: None,
        record: Record::now(),
    }
}
