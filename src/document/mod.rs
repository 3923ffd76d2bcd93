//! Invoice document generation: visual PDF + embedded Factur-X XML.
//!
//! The generator is read-only. It takes one consistent
//! [`InvoiceSnapshot`], renders the visual page through the
//! [`VisualRenderer`] collaborator, builds the CII XML from the same
//! snapshot, and embeds the XML into the PDF — so the printed figures
//! and the machine-readable figures cannot disagree.

mod cii;
mod context;
mod embed;
mod extract;
mod html;
pub(crate) mod xml;
mod xmp;

pub use cii::{FACTURX_GUIDELINE, to_facturx_xml};
pub use context::{BankBlock, ISSUE_DATE_PLACEHOLDER, ItemRow, PartyBlock, RenderContext};
pub use embed::{FACTURX_FILENAME, embed_facturx};
pub use extract::extract_facturx;

use crate::core::{Client, Company, Invoice, InvoiceItem, InvoicingError, PaymentDetail};

/// Everything the generator reads, loaded in one consistent view:
/// the invoice, its attached items, and the company context.
#[derive(Debug, Clone)]
pub struct InvoiceSnapshot {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub company: Company,
    pub client: Client,
    pub payment_details: Vec<PaymentDetail>,
}

/// A finished document: the reference it was generated for plus the PDF
/// bytes with `factur-x.xml` attached.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub reference: String,
    pub bytes: Vec<u8>,
}

/// Markup for one paginated document: the page body and the footer
/// fragment repeated on every page (page numbering).
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub footer_html: String,
}

/// Rendering backend turning visual markup into paginated PDF bytes.
///
/// Implementations typically drive a sandboxed headless browser and
/// should bound their own execution time; a failure surfaces as
/// [`InvoicingError::Generation`] and nothing is persisted.
pub trait VisualRenderer {
    fn render(&self, page: &RenderedPage) -> Result<Vec<u8>, InvoicingError>;
}

/// Document pipeline: render context → visual PDF → CII XML → embed.
pub struct DocumentEngine<R> {
    renderer: R,
}

impl<R: VisualRenderer> DocumentEngine<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Generate the distributable invoice document from a snapshot.
    ///
    /// The company preconditions are re-checked here so the engine is
    /// safe to call directly; the state machine enforces them upstream
    /// with the same messages.
    pub fn generate(
        &self,
        snapshot: &InvoiceSnapshot,
    ) -> Result<GeneratedDocument, InvoicingError> {
        if snapshot.company.terms_conditions.is_none() {
            return Err(InvoicingError::bad_request(
                "Cannot generate invoice PDF: Company terms and conditions not set",
            ));
        }
        if snapshot.payment_details.is_empty() {
            return Err(InvoicingError::bad_request(
                "Cannot generate invoice PDF: Company payment details not set",
            ));
        }

        let render_context = RenderContext::from_snapshot(snapshot);
        let page = RenderedPage {
            html: html::render_page(&render_context),
            footer_html: html::render_footer(),
        };
        let pdf = self.renderer.render(&page)?;

        let facturx_xml = cii::to_facturx_xml(snapshot)?;
        let bytes = embed::embed_facturx(&pdf, &facturx_xml, &snapshot.invoice.reference)?;

        Ok(GeneratedDocument {
            reference: snapshot.invoice.reference.clone(),
            bytes,
        })
    }
}
