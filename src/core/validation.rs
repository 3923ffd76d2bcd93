use rust_decimal::Decimal;

use super::error::{InvoicingError, ValidationError};
use super::types::{InvoiceItemPatch, NewInvoiceItem};

/// Validate input for item creation. Returns all errors found (not just
/// the first).
pub fn validate_new_item(input: &NewInvoiceItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if input.label.trim().is_empty() {
        errors.push(ValidationError::new("label", "label must not be empty"));
    }
    if input.quantity < 1 {
        errors.push(ValidationError::new(
            "quantity",
            "quantity must be at least 1",
        ));
    }
    check_amount(&input.unit_price, "unit_price", &mut errors);
    check_amount(&input.vat_rate, "vat_rate", &mut errors);

    errors
}

/// Validate a partial item update. Only supplied fields are checked.
pub fn validate_item_patch(patch: &InvoiceItemPatch) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(label) = &patch.label {
        if label.trim().is_empty() {
            errors.push(ValidationError::new("label", "label must not be empty"));
        }
    }
    if let Some(quantity) = patch.quantity {
        if quantity < 1 {
            errors.push(ValidationError::new(
                "quantity",
                "quantity must be at least 1",
            ));
        }
    }
    if let Some(unit_price) = &patch.unit_price {
        check_amount(unit_price, "unit_price", &mut errors);
    }
    if let Some(vat_rate) = &patch.vat_rate {
        check_amount(vat_rate, "vat_rate", &mut errors);
    }

    errors
}

/// Fold validation errors into a single BadRequest, or Ok when empty.
pub fn reject_invalid(errors: Vec<ValidationError>) -> Result<(), InvoicingError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(InvoicingError::BadRequest(message))
}

fn check_amount(value: &Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if value.is_sign_negative() {
        errors.push(ValidationError::new(
            field,
            format!("{field} must not be negative"),
        ));
    }
    // Monetary scale is 2; finer values would silently lose precision.
    if *value != value.round_dp(2) {
        errors.push(ValidationError::new(
            field,
            format!("{value} has more than 2 decimal places"),
        ));
    }
}
