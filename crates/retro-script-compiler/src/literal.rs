//! Integer literal parsing
//!
//! Accepts an optional sign, then `0x`, `0b` or `0o` radix prefixes
//! (case-insensitive) or plain decimal. Values wrap to 32 bits, so
//! `0xFFFFFFFF` is `-1`.

/// Parse an integer literal, `None` if the text is not one
pub fn parse_integer(text: &str) -> Option<i32> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        b'0'..=b'9' => (false, text),
        _ => return None,
    };

    let (radix, digits) = match body.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => (16, &body[2..]),
        Some(prefix) if prefix.eq_ignore_ascii_case("0b") => (2, &body[2..]),
        Some(prefix) if prefix.eq_ignore_ascii_case("0o") => (8, &body[2..]),
        _ => (10, body),
    };
    if digits.is_empty() {
        return None;
    }

    let mut value: i32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value.wrapping_mul(radix as i32).wrapping_add(digit as i32);
    }
    Some(if negative { value.wrapping_neg() } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_radix_prefixes() {
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("0X1f"), Some(31));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("-0x10"), Some(-16));
    }

    #[test]
    fn test_decimal() {
        assert_eq!(parse_integer("-42"), Some(-42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("0xFFFFFFFF"), Some(-1));
    }

    #[test]
    fn test_rejects_non_numbers() {
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("12abc"), None);
        assert_eq!(parse_integer("0b102"), None);
        assert_eq!(parse_integer("object.state"), None);
    }

    proptest! {
        #[test]
        fn prop_decimal_matches_display(value in any::<i32>()) {
            prop_assert_eq!(parse_integer(&value.to_string()), Some(value));
        }

        #[test]
        fn prop_hex_matches_format(value in any::<u32>()) {
            prop_assert_eq!(parse_integer(&format!("0x{value:X}")), Some(value as i32));
        }
    }
}
