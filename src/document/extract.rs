use lopdf::{Dictionary, Document, Object};

use super::embed::FACTURX_FILENAME;
use crate::core::InvoicingError;

/// Extract the embedded `factur-x.xml` from a generated PDF.
///
/// Looks in the catalog's AF array first, then in the EmbeddedFiles name
/// tree. Used to verify that the machine-readable figures match the
/// visual document they travel with.
pub fn extract_facturx(pdf_bytes: &[u8]) -> Result<String, InvoicingError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| InvoicingError::generation(format!("failed to load PDF: {e}")))?;

    via_af(&doc)
        .or_else(|_| via_names(&doc))
        .map_err(|e| InvoicingError::generation(format!("no Factur-X XML found in PDF: {e}")))
}

fn via_af(doc: &Document) -> Result<String, String> {
    let catalog = doc.catalog().map_err(|e| e.to_string())?;
    let af = catalog
        .get(b"AF")
        .map_err(|e| e.to_string())?
        .as_array()
        .map_err(|e| e.to_string())?;

    for entry in af {
        let filespec = resolve_dict(doc, entry)?;
        let filename = filespec
            .get(b"UF")
            .or_else(|_| filespec.get(b"F"))
            .ok()
            .and_then(string_value)
            .unwrap_or_default();
        if filename == FACTURX_FILENAME {
            return read_filespec(doc, filespec);
        }
    }
    Err(format!("{FACTURX_FILENAME} not found in AF array"))
}

fn via_names(doc: &Document) -> Result<String, String> {
    let catalog = doc.catalog().map_err(|e| e.to_string())?;
    let names = resolve_dict(doc, catalog.get(b"Names").map_err(|e| e.to_string())?)?;
    let tree = resolve_dict(doc, names.get(b"EmbeddedFiles").map_err(|e| e.to_string())?)?;
    let pairs = tree
        .get(b"Names")
        .map_err(|e| e.to_string())?
        .as_array()
        .map_err(|e| e.to_string())?;

    // The name tree alternates [name, filespec, name, filespec, ...].
    for pair in pairs.chunks(2) {
        let [name, filespec] = pair else { continue };
        if string_value(name).as_deref() == Some(FACTURX_FILENAME) {
            return read_filespec(doc, resolve_dict(doc, filespec)?);
        }
    }
    Err(format!("{FACTURX_FILENAME} not found in EmbeddedFiles name tree"))
}

fn read_filespec(doc: &Document, filespec: &Dictionary) -> Result<String, String> {
    let ef = resolve_dict(doc, filespec.get(b"EF").map_err(|e| e.to_string())?)?;
    let stream_obj = match ef.get(b"F").map_err(|e| e.to_string())? {
        Object::Reference(id) => doc.get_object(*id).map_err(|e| e.to_string())?,
        other => other,
    };
    let stream = stream_obj.as_stream().map_err(|e| e.to_string())?;

    // Uncompressed streams have no Filter key and make
    // decompressed_content fail; fall back to the raw bytes.
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    String::from_utf8(content).map_err(|e| e.to_string())
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Dictionary, String> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).map_err(|e| e.to_string()),
        Object::Dictionary(dict) => Ok(dict),
        _ => Err("expected dictionary or reference".to_string()),
    }
}

fn string_value(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}
