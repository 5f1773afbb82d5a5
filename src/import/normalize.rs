//! Pure value normalization for spreadsheet cells. Everything here is
//! deterministic and side-effect free.

use rust_decimal::{Decimal, RoundingStrategy};

/// Trims and collapses internal whitespace runs to a single space.
/// Case is preserved. Idempotent.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleans a free-text price cell into a canonical amount.
///
/// Empty input yields `None` — absence is distinct from zero. Currency
/// symbols and whitespace are stripped. When both `,` and `.` appear, the
/// right-most separator is the decimal point and the other is a thousands
/// separator; a lone `,` is a decimal comma. Non-numeric or negative input
/// yields `None`. The result is rounded to 2 decimals, half-up.
pub fn normalize_price(value: &str) -> Option<Decimal> {
    let mut s = value.trim().to_string();
    if s.is_empty() {
        return None;
    }

    s.retain(|c| c != '€' && c != '$' && !c.is_whitespace());
    if s.is_empty() {
        return None;
    }

    let has_comma = s.contains(',');
    let has_dot = s.contains('.');

    let cleaned = if has_comma && has_dot {
        let last_comma = s.rfind(',').unwrap();
        let last_dot = s.rfind('.').unwrap();
        if last_comma > last_dot {
            // Comma is the decimal separator: 1.234,56
            s.replace('.', "").replace(',', ".")
        } else {
            // Dot is the decimal separator: 1,234.56
            s.replace(',', "")
        }
    } else if has_comma {
        s.replace(',', ".")
    } else {
        s
    };

    let amount: Decimal = cleaned.parse().ok()?;
    if amount.is_sign_negative() {
        return None;
    }

    Some(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn text_trims_and_collapses_whitespace() {
        assert_eq!(normalize_text("  Pane   di  casa "), "Pane di casa");
        assert_eq!(normalize_text("\tBirra\n artigianale"), "Birra artigianale");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn text_preserves_case() {
        assert_eq!(normalize_text("Forno ROSSI"), "Forno ROSSI");
    }

    #[test]
    fn text_is_idempotent() {
        for input in ["  a  b ", "x", "", "  MIXED   Case\tIn ", "€ 1,5"] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once);
        }
    }

    #[test]
    fn price_parses_common_representations_to_the_same_value() {
        let expected = Some(dec!(12.50));
        assert_eq!(normalize_price("12,50"), expected);
        assert_eq!(normalize_price("12.50"), expected);
        assert_eq!(normalize_price("€ 12,50"), expected);
        assert_eq!(normalize_price("$12.50"), expected);
        assert_eq!(normalize_price(" 12,5 "), Some(dec!(12.5).round_dp(2)));
    }

    #[test]
    fn price_handles_thousands_separators() {
        assert_eq!(normalize_price("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(normalize_price("1,234.56"), Some(dec!(1234.56)));
        assert_eq!(normalize_price("€ 1.234,56"), Some(dec!(1234.56)));
    }

    #[test]
    fn price_lone_comma_is_decimal() {
        assert_eq!(normalize_price("3,75"), Some(dec!(3.75)));
    }

    #[test]
    fn price_absence_is_not_zero() {
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("   "), None);
        assert_eq!(normalize_price("€ "), None);
    }

    #[test]
    fn price_rejects_garbage_and_negatives() {
        assert_eq!(normalize_price("n/a"), None);
        assert_eq!(normalize_price("12,50 circa"), None);
        assert_eq!(normalize_price("-5"), None);
        assert_eq!(normalize_price("-0,01"), None);
    }

    #[test]
    fn price_rounds_half_up_to_two_decimals() {
        assert_eq!(normalize_price("12,505"), Some(dec!(12.51)));
        assert_eq!(normalize_price("12.504"), Some(dec!(12.50)));
        assert_eq!(normalize_price("0,005"), Some(dec!(0.01)));
    }

    #[test]
    fn price_zero_is_a_value() {
        assert_eq!(normalize_price("0"), Some(dec!(0.00)));
        assert_eq!(normalize_price("0,00"), Some(dec!(0.00)));
    }
}
