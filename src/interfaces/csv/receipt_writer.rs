use crate::domain::order::OrderRecord;
use crate::domain::pricing::PriceBreakdown;
use crate::domain::settings::{BindingType, ColorMode, DeliveryMode, PaperSize, PaperType};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReceiptRow<'a> {
    order_id: &'a str,
    reference: &'a str,
    total: String,
    file: &'a str,
    size_bytes: u64,
    analysis: &'a str,
    copies: u32,
    pages_per_copy: u32,
    color_mode: ColorMode,
    paper_type: PaperType,
    binding: BindingType,
    paper_size: PaperSize,
    double_sided: bool,
    delivery_mode: DeliveryMode,
    express: bool,
}

#[derive(Serialize)]
struct QuoteRow {
    per_page_rate: String,
    document_subtotal: String,
    binding_subtotal: String,
    delivery_fee: String,
    express_surcharge: String,
    total: String,
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

/// Writes quotes and placed orders as CSV.
pub struct ReceiptWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReceiptWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One header line and one row with the price breakdown.
    pub fn write_quote(&mut self, breakdown: &PriceBreakdown) -> Result<()> {
        self.writer.serialize(QuoteRow {
            per_page_rate: money(breakdown.per_page_rate),
            document_subtotal: money(breakdown.document_subtotal),
            binding_subtotal: money(breakdown.binding_subtotal),
            delivery_fee: money(breakdown.delivery_fee),
            express_surcharge: money(breakdown.express_surcharge),
            total: money(breakdown.total),
        })?;
        self.writer.flush()?;
        Ok(())
    }

    /// One row per file of the order, each repeating the order details.
    pub fn write_receipt(&mut self, record: &OrderRecord) -> Result<()> {
        let settings = record.settings();
        for file in record.files() {
            self.writer.serialize(ReceiptRow {
                order_id: &record.order_id().0,
                reference: record.reference().as_str(),
                total: money(record.total_cost()),
                file: &file.name,
                size_bytes: file.size,
                analysis: file.analysis.as_deref().unwrap_or_default(),
                copies: settings.copies,
                pages_per_copy: settings.pages_per_copy,
                color_mode: settings.color_mode,
                paper_type: settings.paper_type,
                binding: settings.binding,
                paper_size: settings.paper_size,
                double_sided: settings.double_sided,
                delivery_mode: settings.delivery_mode,
                express: settings.is_express,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
