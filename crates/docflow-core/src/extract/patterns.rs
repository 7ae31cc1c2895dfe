//! Regex patterns for invoice field extraction.
//!
//! Label/value patterns use horizontal whitespace (`[ \t]*`) between the
//! label and the captured token: a bare `INVOICE` heading on its own line
//! must not swallow the labeled value on the next line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number patterns, in priority order
    pub static ref INVOICE_NUMBER_HASH: Regex = Regex::new(
        r"(?i)invoice[ \t]*#?[ \t]*:?[ \t]*([A-Za-z0-9-]+)"
    ).unwrap();

    pub static ref NUMBER_LABELED: Regex = Regex::new(
        r"(?i)number[ \t]*:?[ \t]*([A-Za-z0-9-]+)"
    ).unwrap();

    pub static ref INVOICE_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)invoice number[ \t]*:?[ \t]*([A-Za-z0-9-]+)"
    ).unwrap();

    // Date patterns, in priority order
    pub static ref DATE_ISO_LABELED: Regex = Regex::new(
        r"(?i)date[ \t]*:?[ \t]*(\d{4}-\d{2}-\d{2})"
    ).unwrap();

    pub static ref ISSUE_DATE_DMY: Regex = Regex::new(
        r"(?i)issue date[ \t]*:?[ \t]*(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    pub static ref DATE_DMY_BARE: Regex = Regex::new(
        r"(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    pub static ref DATE_ISO_BARE: Regex = Regex::new(
        r"(\d{4}-\d{2}-\d{2})"
    ).unwrap();

    // Amount patterns, in priority order
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)total.*?[\$R]?[ \t]*([0-9,]+\.\d{2})"
    ).unwrap();

    pub static ref AMOUNT_LABELED: Regex = Regex::new(
        r"(?i)amount.*?[\$R]?[ \t]*([0-9,]+\.\d{2})"
    ).unwrap();

    pub static ref TOTAL_DUE: Regex = Regex::new(
        r"(?i)total due.*?\$[ \t]*([0-9,]+\.\d{2})"
    ).unwrap();

    pub static ref AMOUNT_BARE: Regex = Regex::new(
        r"\$[ \t]*([0-9,]+\.\d{2})"
    ).unwrap();

    // Line item: quantity, unit label, unit price
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"(?i)(\d+)[ \t]*(hours?|unit?|month)[ \t]*[@x]?[ \t]*\$[ \t]*([0-9,]+\.\d{2})"
    ).unwrap();

    // Accepted invoice number shape (validator)
    pub static ref INVOICE_NUMBER_SHAPE: Regex = Regex::new(
        r"^[A-Za-z0-9_-]+$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_number_does_not_cross_lines() {
        let text = "INVOICE\nInvoice #: INV-9\n";
        let caps = INVOICE_NUMBER_HASH.captures(text).unwrap();
        assert_eq!(&caps[1], "INV-9");
    }

    #[test]
    fn test_total_skips_label_noise() {
        let caps = TOTAL_AMOUNT.captures("Total Amount: $2,850.50").unwrap();
        assert_eq!(&caps[1], "2,850.50");
    }

    #[test]
    fn test_line_item_variants() {
        let caps = LINE_ITEM.captures("15 hours x $190.03").unwrap();
        assert_eq!(&caps[1], "15");
        assert_eq!(&caps[2], "hours");
        assert_eq!(&caps[3], "190.03");

        let caps = LINE_ITEM.captures("1 month @ $3,199.99").unwrap();
        assert_eq!(&caps[2], "month");
        assert_eq!(&caps[3], "3,199.99");
    }
}
