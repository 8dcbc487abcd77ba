//! Utility functions and helpers

use rust_decimal::{Decimal, RoundingStrategy};

/// Group the digits of an unsigned integer string with a separator
pub fn format_number<T: ToString>(n: T, separator: &str) -> String {
    let s = n.to_string();
    if separator.is_empty() {
        return s;
    }
    let mut result = String::new();
    let mut count = 0;
    for c in s.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format a monetary amount with a fixed number of decimal places.
///
/// Rounds half away from zero. An empty `thousands_separator` disables grouping.
pub fn format_amount(
    amount: Decimal,
    decimal_places: u32,
    thousands_separator: &str,
    decimal_separator: &str,
) -> String {
    let rounded = amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.*}", decimal_places as usize, rounded.abs());

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&format_number(int_part, thousands_separator));
    if let Some(frac) = frac_part {
        out.push_str(decimal_separator);
        out.push_str(&frac);
    }
    out
}

/// Replace every run of whitespace with a single underscore
pub fn sanitize_file_stem(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Generate a unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567, ","), "1,234,567");
        assert_eq!(format_number(123, ","), "123");
        assert_eq!(format_number(1234, ""), "1234");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(123456789, 2), 2, ",", "."), "1,234,567.89");
        assert_eq!(format_amount(Decimal::from(50), 2, "", "."), "50.00");
        assert_eq!(format_amount(Decimal::new(-2005, 1), 2, ",", "."), "-200.50");
        assert_eq!(format_amount(Decimal::new(1005, 3), 2, "", "."), "1.01");
        assert_eq!(format_amount(Decimal::new(12345, 1), 0, ".", ","), "1.235");
    }

    #[test]
    fn test_format_amount_negative_zero() {
        assert_eq!(format_amount(Decimal::new(-1, 3), 2, ",", "."), "0.00");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Petty  Cash\tBox"), "Petty_Cash_Box");
        assert_eq!(sanitize_file_stem("Bank"), "Bank");
    }

    #[test]
    fn test_generate_id_is_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
