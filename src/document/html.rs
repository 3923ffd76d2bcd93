//! Visual invoice markup.
//!
//! The page body and the repeating footer fragment handed to the
//! rendering backend, which paginates them into A4 PDF pages.

use super::context::RenderContext;

const STYLES: &str = "\
  body { font-family: Inter, Arial, sans-serif; font-size: 12px; color: #1a1a1a; margin: 0; }\n\
  .header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 32px; }\n\
  .header h1 { font-size: 24px; margin: 0 0 4px 0; }\n\
  .header .dates { text-align: right; color: #444; }\n\
  .logo { max-height: 64px; }\n\
  .parties { display: flex; justify-content: space-between; margin-bottom: 32px; }\n\
  .party { width: 46%; }\n\
  .party h2 { font-size: 13px; text-transform: uppercase; color: #666; margin-bottom: 6px; }\n\
  .party .address { white-space: pre-line; }\n\
  table.items { width: 100%; border-collapse: collapse; margin-bottom: 24px; }\n\
  table.items th { text-align: left; border-bottom: 2px solid #1a1a1a; padding: 6px 4px; }\n\
  table.items td { border-bottom: 1px solid #ddd; padding: 6px 4px; vertical-align: top; }\n\
  table.items .num { text-align: right; white-space: nowrap; }\n\
  .item-description { color: #666; font-size: 11px; }\n\
  .totals { margin-left: auto; width: 40%; margin-bottom: 32px; }\n\
  .totals td { padding: 4px; }\n\
  .totals .grand td { font-weight: bold; border-top: 2px solid #1a1a1a; }\n\
  .bank, .terms { margin-bottom: 24px; }\n\
  .bank h2, .terms h2 { font-size: 13px; text-transform: uppercase; color: #666; margin-bottom: 6px; }\n\
  .terms p { white-space: pre-line; }\n";

/// Render the full page for the context.
pub(crate) fn render_page(ctx: &RenderContext) -> String {
    let mut page = String::with_capacity(4096);
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    page.push_str(STYLES);
    page.push_str("</style>\n</head>\n<body>\n");

    // Header: title, reference, dates, optional logo.
    page.push_str("<div class=\"header\">\n<div>\n<h1>FACTURE</h1>\n");
    push_tag(&mut page, "div", &ctx.invoice_number);
    page.push_str("</div>\n<div class=\"dates\">\n");
    push_tag(
        &mut page,
        "div",
        &format!("Date d'émission : {}", ctx.issue_date),
    );
    push_tag(
        &mut page,
        "div",
        &format!("Date d'échéance : {}", ctx.due_date),
    );
    if let Some(logo_url) = &ctx.logo_url {
        page.push_str(&format!(
            "<img class=\"logo\" src=\"{}\" alt=\"\">\n",
            escape(logo_url)
        ));
    }
    page.push_str("</div>\n</div>\n");

    // Seller and buyer identity blocks.
    page.push_str("<div class=\"parties\">\n");
    push_party(&mut page, "Émetteur", &ctx.sender);
    push_party(&mut page, "Client", &ctx.client);
    page.push_str("</div>\n");

    // Line-item table.
    page.push_str(
        "<table class=\"items\">\n<thead>\n<tr>\
         <th>Désignation</th><th class=\"num\">Qté</th>\
         <th class=\"num\">PU HT</th><th class=\"num\">TVA</th>\
         <th class=\"num\">Total HT</th></tr>\n</thead>\n<tbody>\n",
    );
    for item in &ctx.items {
        page.push_str("<tr><td>");
        page.push_str(&escape(&item.label));
        if let Some(description) = &item.description {
            page.push_str("<div class=\"item-description\">");
            page.push_str(&escape(description));
            page.push_str("</div>");
        }
        page.push_str(&format!(
            "</td><td class=\"num\">{}</td><td class=\"num\">{} €</td>\
             <td class=\"num\">{}</td><td class=\"num\">{} €</td></tr>\n",
            item.quantity,
            escape(&item.unit_price),
            escape(&item.vat_rate),
            escape(&item.line_total),
        ));
    }
    page.push_str("</tbody>\n</table>\n");

    // Totals block.
    page.push_str("<table class=\"totals\">\n");
    push_total_row(&mut page, "Total HT", &ctx.total_ht, false);
    push_total_row(&mut page, "TVA", &ctx.total_vat, false);
    push_total_row(&mut page, "Total TTC", &ctx.total_ttc, true);
    page.push_str("</table>\n");

    // Bank block from the first payment detail.
    if let Some(bank) = &ctx.bank {
        page.push_str("<div class=\"bank\">\n<h2>Coordonnées bancaires</h2>\n");
        push_tag(&mut page, "div", &format!("IBAN : {}", bank.iban));
        push_tag(&mut page, "div", &format!("BIC : {}", bank.bic));
        push_tag(&mut page, "div", &format!("Banque : {}", bank.bank_name));
        push_tag(&mut page, "div", &format!("Titulaire : {}", bank.owner_name));
        page.push_str("</div>\n");
    }

    // Terms and conditions.
    page.push_str("<div class=\"terms\">\n<h2>Conditions générales</h2>\n<p>");
    page.push_str(&escape(&ctx.terms_and_conditions));
    page.push_str("</p>\n</div>\n</body>\n</html>\n");

    page
}

/// Footer fragment repeated on every page by the rendering backend.
pub(crate) fn render_footer() -> String {
    "<div style=\"width: 100%; font-size: 10px; padding: 10px 20px; \
     text-align: right; color: #444; font-family: Inter, Arial, sans-serif;\">\
     <span>Page <span class=\"pageNumber\"></span>/<span class=\"totalPages\"></span></span>\
     </div>"
        .to_string()
}

fn push_party(page: &mut String, title: &str, block: &super::context::PartyBlock) {
    page.push_str("<div class=\"party\">\n");
    push_tag(page, "h2", title);
    page.push_str("<div><strong>");
    page.push_str(&escape(&block.name));
    page.push_str("</strong></div>\n<div class=\"address\">");
    page.push_str(&escape(&block.full_address));
    page.push_str("</div>\n");
    push_tag(page, "div", &format!("Tél : {}", block.phone));
    push_tag(page, "div", &format!("SIRET : {}", block.siret));
    push_tag(page, "div", &format!("N° TVA : {}", block.vat_number));
    page.push_str("</div>\n");
}

fn push_total_row(page: &mut String, label: &str, amount: &str, grand: bool) {
    let class = if grand { " class=\"grand\"" } else { "" };
    page.push_str(&format!(
        "<tr{class}><td>{}</td><td class=\"num\">{} €</td></tr>\n",
        escape(label),
        escape(amount)
    ));
}

fn push_tag(page: &mut String, tag: &str, text: &str) {
    page.push_str(&format!("<{tag}>{}</{tag}>\n", escape(text)));
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
