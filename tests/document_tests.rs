mod common;

use chrono::Utc;
use common::*;
use facturier::core::*;
use facturier::document::{
    DocumentEngine, FACTURX_GUIDELINE, InvoiceSnapshot, ISSUE_DATE_PLACEHOLDER, extract_facturx,
};
use rust_decimal_macros::dec;

fn create_invoice(env: &Env, item_ids: Vec<ItemId>) -> facturier::invoice::InvoiceDetail {
    env.invoices
        .create(NewInvoice {
            company_id: env.company.id,
            client_id: env.client.id,
            due_date: due_date(),
            items: item_ids,
        })
        .expect("create invoice")
}

// ---------------------------------------------------------------------------
// Cross-artifact consistency
// ---------------------------------------------------------------------------

#[test]
fn embedded_xml_matches_the_stored_totals() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);
    env.invoices.publish(detail.invoice.id).unwrap();

    let engine = DocumentEngine::new(StubRenderer::new());
    let document = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap();
    assert_eq!(document.reference, detail.invoice.reference);

    let xml = extract_facturx(&document.bytes).unwrap();
    assert!(xml.contains(FACTURX_GUIDELINE));
    assert!(xml.contains(&format!("<ram:ID>{}</ram:ID>", detail.invoice.reference)));
    assert!(xml.contains("<ram:TypeCode>380</ram:TypeCode>"));

    // Monetary summation figures equal the stored totals, 2-decimal.
    assert!(xml.contains("<ram:LineTotalAmount>353.73</ram:LineTotalAmount>"));
    assert!(xml.contains("<ram:TaxBasisTotalAmount>353.73</ram:TaxBasisTotalAmount>"));
    assert!(xml.contains(r#"<ram:TaxTotalAmount currencyID="EUR">70.75</ram:TaxTotalAmount>"#));
    assert!(xml.contains("<ram:GrandTotalAmount>424.48</ram:GrandTotalAmount>"));
    assert!(xml.contains("<ram:DuePayableAmount>424.48</ram:DuePayableAmount>"));

    // Line block carries the item figures.
    assert!(xml.contains("<ram:Name>Location de voiture</ram:Name>"));
    assert!(xml.contains("<ram:ChargeAmount>117.91</ram:ChargeAmount>"));
    assert!(xml.contains(r#"<ram:BilledQuantity unitCode="C62">3</ram:BilledQuantity>"#));
    assert!(xml.contains("<ram:RateApplicablePercent>20.00</ram:RateApplicablePercent>"));

    // Issue date in compact numeric form, format 102.
    let issue = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert!(xml.contains(&format!(
        r#"<udt:DateTimeString format="102">{issue}</udt:DateTimeString>"#
    )));

    // Seller/buyer registration identifiers with scheme ids.
    assert!(xml.contains(r#"<ram:ID schemeID="0002">12345678901234</ram:ID>"#));
    assert!(xml.contains(r#"<ram:ID schemeID="VA">FR12345678901</ram:ID>"#));

    // Payment means from the first payment detail.
    assert!(xml.contains("<ram:IBANID>FR7630006000011234567890189</ram:IBANID>"));
    assert!(xml.contains("<ram:BICID>BDFEFRPP</ram:BICID>"));
}

#[test]
fn visual_document_shows_the_same_figures_as_the_xml() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);
    env.invoices.publish(detail.invoice.id).unwrap();

    let engine = DocumentEngine::new(StubRenderer::new());
    env.invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap();

    let html = engine.renderer().html();
    assert!(html.contains(&detail.invoice.reference));
    assert!(html.contains("353.73"));
    assert!(html.contains("70.75"));
    assert!(html.contains("424.48"));
    assert!(html.contains("Location de voiture"));
    assert!(html.contains("ACME SARL"));
    assert!(html.contains("Client &amp; Fils"));
    assert!(html.contains("FR7630006000011234567890189"));
    assert!(html.contains("Paiement à 30 jours"));
    // Published invoice shows a real issue date, DD/MM/YYYY.
    let issue = Utc::now().date_naive().format("%d/%m/%Y").to_string();
    assert!(html.contains(&issue));
    assert!(!html.contains(ISSUE_DATE_PLACEHOLDER));
}

#[test]
fn draft_preview_uses_the_placeholder_date() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);

    let engine = DocumentEngine::new(StubRenderer::new());
    let document = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap();

    // Visual side: placeholder. Structured side: falls back to today.
    assert!(engine.renderer().html().contains(ISSUE_DATE_PLACEHOLDER));
    let xml = extract_facturx(&document.bytes).unwrap();
    let today = Utc::now().date_naive().format("%Y%m%d").to_string();
    assert!(xml.contains(&today));

    // Generation never mutates the invoice.
    let reloaded = env.invoices.get(detail.invoice.id).unwrap();
    assert_eq!(reloaded.invoice.status, InvoiceStatus::Draft);
    assert_eq!(reloaded.invoice.issue_date, None);
}

// ---------------------------------------------------------------------------
// PDF container metadata
// ---------------------------------------------------------------------------

fn info_string(info: &lopdf::Dictionary, key: &[u8]) -> String {
    match info.get(key).unwrap() {
        lopdf::Object::String(bytes, _) => String::from_utf8_lossy(bytes).to_string(),
        other => panic!("expected string for {:?}, got {other:?}", String::from_utf8_lossy(key)),
    }
}

#[test]
fn pdf_carries_attachment_and_descriptive_metadata() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);
    env.invoices.publish(detail.invoice.id).unwrap();

    let engine = DocumentEngine::new(StubRenderer::new());
    let document = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap();

    let pdf = lopdf::Document::load_mem(&document.bytes).unwrap();
    let catalog = pdf.catalog().unwrap();
    assert!(catalog.get(b"AF").is_ok());
    assert!(catalog.get(b"Names").is_ok());
    assert!(catalog.get(b"Metadata").is_ok());

    let info_id = pdf.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = pdf.get_dictionary(info_id).unwrap();
    assert_eq!(
        info_string(info, b"Title"),
        format!("Facture {}", detail.invoice.reference)
    );
    assert!(info_string(info, b"Keywords").contains(&detail.invoice.reference));
    assert_eq!(info_string(info, b"Producer"), "facturier");

    // XMP block declares the Factur-X extension schema.
    let metadata_id = catalog.get(b"Metadata").unwrap().as_reference().unwrap();
    let metadata = pdf.get_object(metadata_id).unwrap().as_stream().unwrap();
    let xmp = String::from_utf8_lossy(&metadata.content);
    assert!(xmp.contains("<fx:DocumentFileName>factur-x.xml</fx:DocumentFileName>"));
    assert!(xmp.contains("<fx:ConformanceLevel>EXTENDED</fx:ConformanceLevel>"));
}

// ---------------------------------------------------------------------------
// Preconditions and failure modes
// ---------------------------------------------------------------------------

#[test]
fn generation_requires_company_configuration_even_for_drafts() {
    let engine = DocumentEngine::new(StubRenderer::new());

    let env = env_without_terms();
    let detail = create_invoice(&env, vec![]);
    let err = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap_err();
    match err {
        InvoicingError::BadRequest(message) => {
            assert_eq!(
                message,
                "Cannot generate invoice PDF: Company terms and conditions not set"
            );
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }

    let env = env_without_payment_details();
    let detail = create_invoice(&env, vec![]);
    let err = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap_err();
    match err {
        InvoicingError::BadRequest(message) => {
            assert_eq!(
                message,
                "Cannot generate invoice PDF: Company payment details not set"
            );
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[test]
fn renderer_failure_propagates_as_generation_error() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);

    let engine = DocumentEngine::new(FailingRenderer);
    let err = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap_err();
    assert!(matches!(err, InvoicingError::Generation(_)));

    // Failure leaves the invoice untouched.
    let reloaded = env.invoices.get(detail.invoice.id).unwrap();
    assert_eq!(reloaded.invoice.status, InvoiceStatus::Draft);
}

#[test]
fn generating_for_an_unknown_invoice_is_not_found() {
    let env = env();
    let engine = DocumentEngine::new(StubRenderer::new());
    let err = env
        .invoices
        .generate_document(InvoiceId::new(), &engine)
        .unwrap_err();
    assert!(matches!(err, InvoicingError::NotFound("invoice")));
}

// ---------------------------------------------------------------------------
// Engine called directly with a hand-built snapshot
// ---------------------------------------------------------------------------

#[test]
fn engine_rejects_an_unconfigured_snapshot() {
    let env = env();
    let item = env.items.create(car_rental()).unwrap();
    let detail = create_invoice(&env, vec![item.id]);

    let mut company = env.company.clone();
    company.terms_conditions = None;
    let snapshot = InvoiceSnapshot {
        invoice: detail.invoice.clone(),
        items: detail.items.clone(),
        company,
        client: env.client.clone(),
        payment_details: vec![],
    };

    let engine = DocumentEngine::new(StubRenderer::new());
    let err = engine.generate(&snapshot).unwrap_err();
    assert!(matches!(err, InvoicingError::BadRequest(_)));
}

#[test]
fn totals_in_the_xml_are_always_two_decimal_strings() {
    let env = env();
    // 1 x 0.10 at 0% — exercises zero VAT and sub-1 amounts.
    let item = env.items.create(new_item(1, dec!(0.10), dec!(0))).unwrap();
    let detail = create_invoice(&env, vec![item.id]);

    let engine = DocumentEngine::new(StubRenderer::new());
    let document = env
        .invoices
        .generate_document(detail.invoice.id, &engine)
        .unwrap();
    let xml = extract_facturx(&document.bytes).unwrap();

    assert!(xml.contains("<ram:LineTotalAmount>0.10</ram:LineTotalAmount>"));
    assert!(xml.contains(r#"<ram:TaxTotalAmount currencyID="EUR">0.00</ram:TaxTotalAmount>"#));
    assert!(xml.contains("<ram:GrandTotalAmount>0.10</ram:GrandTotalAmount>"));
}
