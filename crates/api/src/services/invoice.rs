//! Invoice PDF renderer.
//!
//! Pure function: renders a fixed-layout A4 invoice for one webinar
//! registration payment and returns the PDF bytes.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

use crate::config::CompanyConfig;

/// Errors from invoice rendering.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("failed to render invoice: {0}")]
    Render(String),
}

/// Everything printed on an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceData {
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_company: Option<String>,
    pub webinar_title: String,
    pub webinar_date: DateTime<Utc>,
    pub amount: f64,
    pub payment_method: String,
}

/// Renders the invoice document and returns the PDF bytes.
pub fn render_invoice(data: &InvoiceData, company: &CompanyConfig) -> Result<Vec<u8>, InvoiceError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {}", data.invoice_number),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InvoiceError::Render(e.to_string()))?;

    let layer = doc.get_page(page).get_layer(layer);

    // Header
    layer.use_text("INVOICE", 20.0, Mm(150.0), Mm(272.0), &bold);
    layer.use_text(
        format!("No. {}", data.invoice_number),
        10.0,
        Mm(150.0),
        Mm(264.0),
        &regular,
    );
    layer.use_text(
        format!("Date: {}", data.invoice_date.format("%Y-%m-%d")),
        10.0,
        Mm(150.0),
        Mm(259.0),
        &regular,
    );

    // Issuer block
    let mut y = 250.0;
    layer.use_text(&company.name, 12.0, Mm(20.0), Mm(y), &bold);
    y -= 6.0;
    if !company.address.is_empty() {
        layer.use_text(&company.address, 10.0, Mm(20.0), Mm(y), &regular);
        y -= 5.0;
    }
    if !company.registration_number.is_empty() {
        layer.use_text(
            format!("Reg. no.: {}", company.registration_number),
            10.0,
            Mm(20.0),
            Mm(y),
            &regular,
        );
        y -= 5.0;
    }
    if !company.vat_number.is_empty() {
        layer.use_text(
            format!("VAT: {}", company.vat_number),
            10.0,
            Mm(20.0),
            Mm(y),
            &regular,
        );
    }

    // Customer block
    layer.use_text("BILLED TO:", 10.0, Mm(20.0), Mm(218.0), &bold);
    layer.use_text(&data.customer_name, 10.0, Mm(20.0), Mm(212.0), &regular);
    layer.use_text(&data.customer_email, 10.0, Mm(20.0), Mm(207.0), &regular);
    if let Some(customer_company) = &data.customer_company {
        layer.use_text(customer_company, 10.0, Mm(20.0), Mm(202.0), &regular);
    }

    // Line-item table
    layer.use_text("Description", 10.0, Mm(20.0), Mm(185.0), &bold);
    layer.use_text("Date", 10.0, Mm(115.0), Mm(185.0), &bold);
    layer.use_text("Amount", 10.0, Mm(165.0), Mm(185.0), &bold);

    layer.use_text("Webinar registration:", 10.0, Mm(20.0), Mm(177.0), &regular);
    layer.use_text(
        format!("\"{}\"", data.webinar_title),
        10.0,
        Mm(20.0),
        Mm(172.0),
        &regular,
    );
    layer.use_text(
        data.webinar_date.format("%Y-%m-%d %H:%M").to_string(),
        10.0,
        Mm(115.0),
        Mm(177.0),
        &regular,
    );
    layer.use_text(
        format!("{:.2} EUR", data.amount),
        10.0,
        Mm(165.0),
        Mm(177.0),
        &regular,
    );

    // Total
    layer.use_text("TOTAL", 12.0, Mm(125.0), Mm(155.0), &bold);
    layer.use_text(
        format!("{:.2} EUR", data.amount),
        12.0,
        Mm(165.0),
        Mm(155.0),
        &bold,
    );

    // Payment info
    layer.use_text(
        format!("Payment method: {}", data.payment_method),
        10.0,
        Mm(20.0),
        Mm(140.0),
        &regular,
    );
    layer.use_text(
        "Payment received - no action required",
        10.0,
        Mm(20.0),
        Mm(135.0),
        &regular,
    );

    // Footer
    layer.use_text(
        "This invoice is an official document. Please retain it.",
        8.0,
        Mm(20.0),
        Mm(25.0),
        &regular,
    );
    if !company.address.is_empty() {
        layer.use_text(
            format!("{} - {}", company.name, company.address),
            8.0,
            Mm(20.0),
            Mm(21.0),
            &regular,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| InvoiceError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_company() -> CompanyConfig {
        CompanyConfig {
            name: "Acme Webinars".to_string(),
            address: "1 Example Street, Paris".to_string(),
            registration_number: "123 456 789".to_string(),
            vat_number: "FR00123456789".to_string(),
        }
    }

    fn test_data() -> InvoiceData {
        InvoiceData {
            invoice_number: "INV-202608-0001".to_string(),
            invoice_date: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_company: Some("Doe Consulting".to_string()),
            webinar_title: "Rust in production".to_string(),
            webinar_date: Utc.with_ymd_and_hms(2026, 9, 15, 14, 0, 0).unwrap(),
            amount: 49.0,
            payment_method: "SumUp".to_string(),
        }
    }

    #[test]
    fn test_render_invoice_produces_pdf_bytes() {
        let bytes = render_invoice(&test_data(), &test_company()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn test_render_invoice_without_customer_company() {
        let mut data = test_data();
        data.customer_company = None;
        let bytes = render_invoice(&data, &test_company()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_render_invoice_with_minimal_company() {
        let company = CompanyConfig {
            name: "Acme".to_string(),
            address: String::new(),
            registration_number: String::new(),
            vat_number: String::new(),
        };
        let bytes = render_invoice(&test_data(), &company).unwrap();
        assert!(!bytes.is_empty());
    }
}
