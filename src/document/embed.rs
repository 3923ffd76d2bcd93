use lopdf::{Document, Object, Stream, dictionary};

use super::xmp;
use crate::core::InvoicingError;

/// The embedded XML filename per the Factur-X 1.0 specification.
pub const FACTURX_FILENAME: &str = "factur-x.xml";

/// Embed the Factur-X XML into the rendered PDF, producing the single
/// distributable unit: the visual pages with `factur-x.xml` attached,
/// XMP metadata, and a document information dictionary naming the
/// invoice reference.
pub fn embed_facturx(
    pdf_bytes: &[u8],
    xml: &str,
    reference: &str,
) -> Result<Vec<u8>, InvoicingError> {
    let mut doc = Document::load_mem(pdf_bytes)
        .map_err(|e| InvoicingError::generation(format!("failed to load PDF: {e}")))?;

    attach_xml(&mut doc, xml.as_bytes(), reference)?;

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| InvoicingError::generation(format!("failed to save PDF: {e}")))?;

    Ok(output)
}

fn attach_xml(doc: &mut Document, xml_bytes: &[u8], reference: &str) -> Result<(), InvoicingError> {
    // EmbeddedFile stream holding the XML.
    let ef_stream = Stream::new(
        dictionary! {
            "Type" => "EmbeddedFile",
            "Subtype" => Object::Name(b"text#2Fxml".to_vec()),
            "Params" => dictionary! {
                "Size" => Object::Integer(xml_bytes.len() as i64),
            },
        },
        xml_bytes.to_vec(),
    );
    let ef_stream_id = doc.add_object(ef_stream);

    // FileSpec pointing at the stream.
    let filespec = dictionary! {
        "Type" => "Filespec",
        "F" => Object::string_literal(FACTURX_FILENAME),
        "UF" => Object::string_literal(FACTURX_FILENAME),
        "Desc" => Object::string_literal(format!("Factur-X XML pour la facture {reference}")),
        "AFRelationship" => Object::Name(b"Alternative".to_vec()),
        "EF" => dictionary! {
            "F" => Object::Reference(ef_stream_id),
            "UF" => Object::Reference(ef_stream_id),
        },
    };
    let filespec_id = doc.add_object(filespec);

    // EmbeddedFiles name tree.
    let ef_name_tree = dictionary! {
        "Names" => Object::Array(vec![
            Object::string_literal(FACTURX_FILENAME),
            Object::Reference(filespec_id),
        ]),
    };
    let ef_name_tree_id = doc.add_object(ef_name_tree);
    let names_id = doc.add_object(dictionary! {
        "EmbeddedFiles" => Object::Reference(ef_name_tree_id),
    });

    // XMP metadata stream — must not be compressed per PDF/A.
    let metadata_stream = Stream::new(
        dictionary! {
            "Type" => "Metadata",
            "Subtype" => "XML",
        },
        xmp::build_xmp(reference).into_bytes(),
    )
    .with_compression(false);
    let metadata_id = doc.add_object(metadata_stream);

    // Document information dictionary.
    let info = dictionary! {
        "Title" => Object::string_literal(format!("Facture {reference}")),
        "Subject" => Object::string_literal("Factur-X Facture"),
        "Keywords" => Object::string_literal(format!("facture, factur-x, {reference}")),
        "Producer" => Object::string_literal("facturier"),
        "Creator" => Object::string_literal("Système de facturation facturier"),
    };
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));

    let catalog = doc
        .catalog_mut()
        .map_err(|e| InvoicingError::generation(format!("failed to get catalog: {e}")))?;
    catalog.set("AF", Object::Array(vec![Object::Reference(filespec_id)]));
    catalog.set("Names", Object::Reference(names_id));
    catalog.set("Metadata", Object::Reference(metadata_id));
    // PDF/A-3 marker.
    catalog.set(
        "MarkInfo",
        dictionary! { "Marked" => Object::Boolean(true) },
    );

    Ok(())
}
