//! Factur-X structured document generation.
//!
//! Builds the UN/CEFACT Cross Industry Invoice XML for the EN 16931
//! Factur-X profile. Every figure comes from the snapshot the visual
//! document was rendered from, so both artifacts always agree.

use chrono::{NaiveDate, Utc};

use super::InvoiceSnapshot;
use super::xml::{XmlWriter, format_amount};
use crate::core::{Address, InvoicingError};

/// BT-24: Factur-X extended profile guideline identifier.
pub const FACTURX_GUIDELINE: &str =
    "urn:cen.eu:en16931:2017#compliant#urn:factur-x.eu:1p0:extended";

/// CII namespace URIs.
mod cii_ns {
    pub const RSM: &str = "urn:un:unece:uncefact:data:standard:CrossIndustryInvoice:100";
    pub const RAM: &str =
        "urn:un:unece:uncefact:data:standard:ReusableAggregateBusinessInformationEntity:100";
    pub const QDT: &str = "urn:un:unece:uncefact:data:standard:QualifiedDataType:100";
    pub const UDT: &str = "urn:un:unece:uncefact:data:standard:UnqualifiedDataType:100";
    pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
}

/// Generate the Factur-X CII XML for a snapshot.
///
/// A draft without an issue date falls back to the current date — the
/// `format="102"` date element requires a value (accepted preview
/// limitation; the visual document shows a placeholder instead).
pub fn to_facturx_xml(snapshot: &InvoiceSnapshot) -> Result<String, InvoicingError> {
    let invoice = &snapshot.invoice;
    let company = &snapshot.company;
    let client = &snapshot.client;
    let issue_date = invoice
        .issue_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let terms = company.terms_conditions.as_deref().unwrap_or_default();

    let mut w = XmlWriter::new()?;

    w.start_element_with_attrs(
        "rsm:CrossIndustryInvoice",
        &[
            ("xmlns:rsm", cii_ns::RSM),
            ("xmlns:qdt", cii_ns::QDT),
            ("xmlns:ram", cii_ns::RAM),
            ("xmlns:xs", cii_ns::XS),
            ("xmlns:udt", cii_ns::UDT),
        ],
    )?;

    // --- ExchangedDocumentContext ---
    w.start_element("rsm:ExchangedDocumentContext")?;
    w.start_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.text_element("ram:ID", FACTURX_GUIDELINE)?;
    w.end_element("ram:GuidelineSpecifiedDocumentContextParameter")?;
    w.end_element("rsm:ExchangedDocumentContext")?;

    // --- ExchangedDocument ---
    w.start_element("rsm:ExchangedDocument")?;
    w.text_element("ram:ID", &invoice.reference)?;
    // 380 = commercial invoice (UNTDID 1001)
    w.text_element("ram:TypeCode", "380")?;
    write_date(&mut w, "ram:IssueDateTime", issue_date)?;
    w.start_element("ram:IncludedNote")?;
    w.text_element("ram:Content", terms)?;
    w.end_element("ram:IncludedNote")?;
    w.end_element("rsm:ExchangedDocument")?;

    // --- SupplyChainTradeTransaction ---
    w.start_element("rsm:SupplyChainTradeTransaction")?;

    for (index, item) in snapshot.items.iter().enumerate() {
        w.start_element("ram:IncludedSupplyChainTradeLineItem")?;

        w.start_element("ram:AssociatedDocumentLineDocument")?;
        w.text_element("ram:LineID", &(index + 1).to_string())?;
        w.end_element("ram:AssociatedDocumentLineDocument")?;

        w.start_element("ram:SpecifiedTradeProduct")?;
        w.text_element("ram:Name", &item.label)?;
        w.text_element("ram:Description", item.description.as_deref().unwrap_or(""))?;
        w.end_element("ram:SpecifiedTradeProduct")?;

        w.start_element("ram:SpecifiedLineTradeAgreement")?;
        w.start_element("ram:NetPriceProductTradePrice")?;
        w.text_element("ram:ChargeAmount", &format_amount(item.unit_price))?;
        w.end_element("ram:NetPriceProductTradePrice")?;
        w.end_element("ram:SpecifiedLineTradeAgreement")?;

        w.start_element("ram:SpecifiedLineTradeDelivery")?;
        // C62 = unit (UN/CEFACT Rec 20)
        w.text_element_with_attrs(
            "ram:BilledQuantity",
            &item.quantity.to_string(),
            &[("unitCode", "C62")],
        )?;
        w.end_element("ram:SpecifiedLineTradeDelivery")?;

        w.start_element("ram:SpecifiedLineTradeSettlement")?;
        w.start_element("ram:ApplicableTradeTax")?;
        w.text_element("ram:TypeCode", "VAT")?;
        // S = standard rate (UNTDID 5305)
        w.text_element("ram:CategoryCode", "S")?;
        w.text_element("ram:RateApplicablePercent", &format_amount(item.vat_rate))?;
        w.end_element("ram:ApplicableTradeTax")?;
        w.start_element("ram:SpecifiedTradeSettlementLineMonetarySummation")?;
        w.text_element("ram:LineTotalAmount", &format_amount(item.unit_total_ht))?;
        w.end_element("ram:SpecifiedTradeSettlementLineMonetarySummation")?;
        w.end_element("ram:SpecifiedLineTradeSettlement")?;

        w.end_element("ram:IncludedSupplyChainTradeLineItem")?;
    }

    // --- ApplicableHeaderTradeAgreement ---
    w.start_element("ram:ApplicableHeaderTradeAgreement")?;
    write_trade_party(
        &mut w,
        "ram:SellerTradeParty",
        &company.name,
        &company.siret,
        &company.vat_number,
        &company.address,
    )?;
    write_trade_party(
        &mut w,
        "ram:BuyerTradeParty",
        &client.name,
        &client.siret,
        &client.vat_number,
        &client.address,
    )?;
    w.end_element("ram:ApplicableHeaderTradeAgreement")?;

    // --- ApplicableHeaderTradeDelivery ---
    w.start_element("ram:ApplicableHeaderTradeDelivery")?;
    w.start_element("ram:ActualDeliverySupplyChainEvent")?;
    write_date(&mut w, "ram:OccurrenceDateTime", issue_date)?;
    w.end_element("ram:ActualDeliverySupplyChainEvent")?;
    w.end_element("ram:ApplicableHeaderTradeDelivery")?;

    // --- ApplicableHeaderTradeSettlement ---
    w.start_element("ram:ApplicableHeaderTradeSettlement")?;
    w.text_element("ram:InvoiceCurrencyCode", "EUR")?;

    if let Some(detail) = snapshot.payment_details.first() {
        w.start_element("ram:SpecifiedTradeSettlementPaymentMeans")?;
        // 30 = credit transfer (UNTDID 4461)
        w.text_element("ram:TypeCode", "30")?;
        w.start_element("ram:PayeePartyCreditorFinancialAccount")?;
        w.text_element("ram:IBANID", &detail.iban)?;
        w.text_element("ram:AccountName", &detail.owner_name)?;
        w.end_element("ram:PayeePartyCreditorFinancialAccount")?;
        w.start_element("ram:PayeeSpecifiedCreditorFinancialInstitution")?;
        w.text_element("ram:BICID", &detail.bic)?;
        w.text_element("ram:Name", &detail.bank_name)?;
        w.end_element("ram:PayeeSpecifiedCreditorFinancialInstitution")?;
        w.end_element("ram:SpecifiedTradeSettlementPaymentMeans")?;
    }

    w.start_element("ram:ApplicableTradeTax")?;
    w.text_element("ram:CalculatedAmount", &format_amount(invoice.total_vat))?;
    w.text_element("ram:TypeCode", "VAT")?;
    w.text_element("ram:BasisAmount", &format_amount(invoice.total_ht))?;
    w.text_element("ram:CategoryCode", "S")?;
    w.end_element("ram:ApplicableTradeTax")?;

    w.start_element("ram:SpecifiedTradePaymentTerms")?;
    write_date(&mut w, "ram:DueDateDateTime", invoice.due_date)?;
    w.end_element("ram:SpecifiedTradePaymentTerms")?;

    w.start_element("ram:SpecifiedTradeSettlementHeaderMonetarySummation")?;
    w.text_element("ram:LineTotalAmount", &format_amount(invoice.total_ht))?;
    w.text_element("ram:TaxBasisTotalAmount", &format_amount(invoice.total_ht))?;
    w.text_element_with_attrs(
        "ram:TaxTotalAmount",
        &format_amount(invoice.total_vat),
        &[("currencyID", "EUR")],
    )?;
    w.text_element("ram:GrandTotalAmount", &format_amount(invoice.total_ttc))?;
    w.text_element("ram:DuePayableAmount", &format_amount(invoice.total_ttc))?;
    w.end_element("ram:SpecifiedTradeSettlementHeaderMonetarySummation")?;

    w.end_element("ram:ApplicableHeaderTradeSettlement")?;
    w.end_element("rsm:SupplyChainTradeTransaction")?;
    w.end_element("rsm:CrossIndustryInvoice")?;

    w.into_string()
}

/// Write a `format="102"` (CCYYMMDD) qualified date element.
fn write_date(w: &mut XmlWriter, element: &str, date: NaiveDate) -> Result<(), InvoicingError> {
    w.start_element(element)?;
    w.text_element_with_attrs(
        "udt:DateTimeString",
        &date.format("%Y%m%d").to_string(),
        &[("format", "102")],
    )?;
    w.end_element(element)?;
    Ok(())
}

/// Seller/buyer trade party: name, legal registration (SIRET, scheme
/// 0002), postal address, VAT registration (scheme VA).
fn write_trade_party(
    w: &mut XmlWriter,
    element: &str,
    name: &str,
    siret: &str,
    vat_number: &str,
    address: &Address,
) -> Result<(), InvoicingError> {
    w.start_element(element)?;
    w.text_element("ram:Name", name)?;

    w.start_element("ram:SpecifiedLegalOrganization")?;
    w.text_element_with_attrs("ram:ID", siret, &[("schemeID", "0002")])?;
    w.end_element("ram:SpecifiedLegalOrganization")?;

    w.start_element("ram:PostalTradeAddress")?;
    w.text_element("ram:LineOne", &address.street)?;
    w.text_element("ram:CityName", &address.city)?;
    w.text_element("ram:PostcodeCode", &address.zipcode)?;
    w.text_element("ram:CountryID", &address.country)?;
    w.end_element("ram:PostalTradeAddress")?;

    w.start_element("ram:SpecifiedTaxRegistration")?;
    w.text_element_with_attrs("ram:ID", vat_number, &[("schemeID", "VA")])?;
    w.end_element("ram:SpecifiedTaxRegistration")?;

    w.end_element(element)?;
    Ok(())
}
