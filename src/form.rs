use crate::invoice::{InvoiceRecord, LineItem, TaxRate};
use chrono::{Local, NaiveDate};

/// Item attribute addressed by `InvoiceForm::update_item`. Text fields store
/// the raw input verbatim; numeric fields coerce through
/// `parse_decimal_or_zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    ItemCode,
    Hsn,
    Quantity,
    Rate,
    Discount,
}

/// Pure numeric coercion: the trimmed input parsed as f64, with parse
/// failures and non-finite values both collapsing to zero.
pub fn parse_decimal_or_zero(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn default_item() -> LineItem {
    LineItem {
        description: String::new(),
        item_code: String::new(),
        hsn: String::new(),
        quantity: 1.0,
        rate: 0.0,
        discount: 0.0,
    }
}

/// Accumulates invoice metadata and an ordered item list, then produces an
/// immutable `InvoiceRecord` on demand. The form always holds at least one
/// item row; ordering is stable under every operation.
#[derive(Debug, Clone)]
pub struct InvoiceForm {
    pub bill_no: String,
    pub client_name: String,
    pub order_no: String,
    pub challan_no: String,
    pub gst_no: String,
    pub invoice_date: NaiveDate,
    pub tax_rate: TaxRate,
    items: Vec<LineItem>,
}

impl InvoiceForm {
    pub fn new() -> Self {
        Self {
            bill_no: String::new(),
            client_name: String::new(),
            order_no: String::new(),
            challan_no: String::new(),
            gst_no: String::new(),
            invoice_date: Local::now().date_naive(),
            tax_rate: TaxRate::Gst9,
            items: vec![default_item()],
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn add_item(&mut self) {
        self.items.push(default_item());
    }

    /// Refuses to drop below one remaining row; returns whether a row was
    /// removed.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if self.items.len() <= 1 || index >= self.items.len() {
            return false;
        }
        self.items.remove(index);
        true
    }

    /// Returns false when the index is out of bounds.
    pub fn update_item(&mut self, index: usize, field: ItemField, value: &str) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        match field {
            ItemField::Description => item.description = value.to_string(),
            ItemField::ItemCode => item.item_code = value.to_string(),
            ItemField::Hsn => item.hsn = value.to_string(),
            ItemField::Quantity => item.quantity = parse_decimal_or_zero(value),
            ItemField::Rate => item.rate = parse_decimal_or_zero(value),
            ItemField::Discount => item.discount = parse_decimal_or_zero(value),
        }
        true
    }

    /// Finalize the current state. Items whose description is blank are
    /// filtered out; everything else is cloned in insertion order.
    pub fn record(&self) -> InvoiceRecord {
        InvoiceRecord {
            bill_no: self.bill_no.clone(),
            client_name: self.client_name.clone(),
            order_no: self.order_no.clone(),
            challan_no: self.challan_no.clone(),
            gst_no: self.gst_no.clone(),
            invoice_date: self.invoice_date,
            tax_rate: self.tax_rate,
            items: self
                .items
                .iter()
                .filter(|item| !item.description.trim().is_empty())
                .cloned()
                .collect(),
        }
    }
}

impl Default for InvoiceForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_default_item() {
        let form = InvoiceForm::new();
        assert_eq!(form.items().len(), 1);
        assert_eq!(form.items()[0].quantity, 1.0);
        assert_eq!(form.items()[0].rate, 0.0);
    }

    #[test]
    fn refuses_to_remove_the_last_item() {
        let mut form = InvoiceForm::new();
        assert!(!form.remove_item(0));
        assert_eq!(form.items().len(), 1);
    }

    #[test]
    fn remove_preserves_ordering() {
        let mut form = InvoiceForm::new();
        form.update_item(0, ItemField::Description, "first");
        form.add_item();
        form.update_item(1, ItemField::Description, "second");
        form.add_item();
        form.update_item(2, ItemField::Description, "third");

        assert!(form.remove_item(1));
        let names: Vec<&str> = form
            .items()
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        assert_eq!(names, vec!["first", "third"]);
    }

    #[test]
    fn out_of_bounds_operations_are_rejected() {
        let mut form = InvoiceForm::new();
        assert!(!form.remove_item(7));
        assert!(!form.update_item(7, ItemField::Rate, "10"));
    }

    #[test]
    fn numeric_coercion_defaults_to_zero() {
        assert_eq!(parse_decimal_or_zero("12.5"), 12.5);
        assert_eq!(parse_decimal_or_zero("  3 "), 3.0);
        assert_eq!(parse_decimal_or_zero("12abc"), 0.0);
        assert_eq!(parse_decimal_or_zero(""), 0.0);
        assert_eq!(parse_decimal_or_zero("NaN"), 0.0);
        assert_eq!(parse_decimal_or_zero("inf"), 0.0);
    }

    #[test]
    fn text_fields_store_input_verbatim() {
        let mut form = InvoiceForm::new();
        form.update_item(0, ItemField::Description, "  spaced out  ");
        form.update_item(0, ItemField::Hsn, "8413");
        assert_eq!(form.items()[0].description, "  spaced out  ");
        assert_eq!(form.items()[0].hsn, "8413");
    }

    #[test]
    fn record_filters_blank_descriptions() {
        let mut form = InvoiceForm::new();
        form.bill_no = "42".to_string();
        form.client_name = "Acme".to_string();
        form.update_item(0, ItemField::Description, "kept");
        form.add_item();
        form.add_item();
        form.update_item(2, ItemField::Description, "   ");
        let record = form.record();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].description, "kept");
    }

    #[test]
    fn record_preserves_item_order() {
        let mut form = InvoiceForm::new();
        form.update_item(0, ItemField::Description, "a");
        for name in ["b", "c", "d"] {
            form.add_item();
            let last = form.items().len() - 1;
            form.update_item(last, ItemField::Description, name);
        }
        let record = form.record();
        let names: Vec<&str> = record
            .items
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }
}
