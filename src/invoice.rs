use chrono::NaiveDate;

/// One billed row. `quantity` and `rate` are non-negative by convention but
/// never clamped; a discount larger than the gross amount leaves a negative
/// line amount on purpose.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub item_code: String,
    pub hsn: String,
    pub quantity: f64,
    pub rate: f64,
    pub discount: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            item_code: String::new(),
            hsn: String::new(),
            quantity: 1.0,
            rate: 0.0,
            discount: 0.0,
        }
    }

    pub fn amount(&self) -> f64 {
        self.quantity * self.rate - self.discount
    }
}

/// The enumerated GST slabs the renderer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxRate {
    Gst9,
    Gst14,
}

impl TaxRate {
    pub fn percent(self) -> f64 {
        match self {
            TaxRate::Gst9 => 9.0,
            TaxRate::Gst14 => 14.0,
        }
    }

    pub fn from_percent(value: u8) -> Option<Self> {
        match value {
            9 => Some(TaxRate::Gst9),
            14 => Some(TaxRate::Gst14),
            _ => None,
        }
    }
}

/// Immutable render input. Built transiently (usually by `InvoiceForm`) and
/// discarded after the document is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub bill_no: String,
    pub client_name: String,
    pub order_no: String,
    pub challan_no: String,
    pub gst_no: String,
    pub invoice_date: NaiveDate,
    pub tax_rate: TaxRate,
    pub items: Vec<LineItem>,
}

impl InvoiceRecord {
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::amount).sum()
    }
}

/// Static letterhead data. Not user-editable at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub address: String,
    /// Comma-separated list, rendered one number per line.
    pub phone: String,
    pub gstin: String,
    pub email: Option<String>,
    pub motto: Option<String>,
}

/// Split-tax aggregate: one tax computed once on the subtotal, applied under
/// the SGST and CGST labels. Values stay untruncated; truncation happens at
/// display only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBreakdown {
    pub subtotal: f64,
    pub tax: f64,
    pub grand_total: f64,
}

impl TaxBreakdown {
    pub fn compute(record: &InvoiceRecord) -> Self {
        let subtotal = record.subtotal();
        let tax = subtotal * (record.tax_rate.percent() / 100.0);
        Self {
            subtotal,
            tax,
            grand_total: subtotal + 2.0 * tax,
        }
    }

    pub fn sgst(&self) -> f64 {
        self.tax
    }

    pub fn cgst(&self) -> f64 {
        self.tax
    }
}

/// Truncate toward zero at two decimals. Display-only; totals are always
/// computed from the untruncated values.
pub fn trunc_2dp(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", trunc_2dp(value))
}

pub fn format_money(value: f64) -> String {
    format!("Rs. {}", format_amount(value))
}

/// Quantities print without a trailing `.0`.
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Blank optional metadata renders as "N/A".
pub fn or_na(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "N/A".to_string()
    } else {
        trimmed.to_string()
    }
}
