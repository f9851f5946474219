//! Display formatting for prices and counters shown by storefront front-ends.

/// Format an amount expressed in cents as a currency string with two fraction digits.
///
/// Known codes use their symbol (`$`, `€`, `£`, `¥`); other codes are used as a prefix
/// (`CHF 12.00`).
pub fn format_currency(cents: i64, currency: &str) -> String {
    let negative = cents < 0;
    let magnitude = cents.unsigned_abs();
    let whole = format_number(i64::try_from(magnitude / 100).unwrap_or(i64::MAX));
    let fraction = magnitude % 100;

    let prefix = match currency.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{other} "),
    };
    let sign = if negative { "-" } else { "" };

    format!("{sign}{prefix}{whole}.{fraction:02}")
}

/// Format an integer with comma thousands separators.
pub fn format_number(value: i64) -> String {
    let grouped = group_thousands(value.unsigned_abs());
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_usd_by_default_style() {
        assert_eq!(format_currency(10_000, "USD"), "$100.00");
        assert_eq!(format_currency(9_999, "USD"), "$99.99");
        assert_eq!(format_currency(0, "USD"), "$0.00");
        assert_eq!(format_currency(100_000, "USD"), "$1,000.00");
        assert_eq!(format_currency(1_050, "usd"), "$10.50");
    }

    #[test]
    fn formats_other_currencies() {
        assert_eq!(format_currency(10_000, "EUR"), "€100.00");
        assert_eq!(format_currency(10_000, "GBP"), "£100.00");
        assert_eq!(format_currency(1_200, "CHF"), "CHF 12.00");
    }

    #[test]
    fn negative_amounts_put_the_sign_first() {
        assert_eq!(format_currency(-10_000, "USD"), "-$100.00");
    }

    #[test]
    fn large_amounts_group_the_whole_part() {
        assert_eq!(format_currency(123_456_789, "EUR"), "€1,234,567.89");
        assert_eq!(
            format_currency(i64::MIN, "USD"),
            "-$92,233,720,368,547,758.08"
        );
    }

    #[test]
    fn groups_numbers() {
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_000_000), "1,000,000");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(-1_000), "-1,000");
    }
}
