//! Canonical grouping of phone numbers.

use crate::tables::{METRO_AREA_CODE, THREE_DIGIT_AREA_CODES};

/// Formats `raw` into the grouped `area-prefix-suffix` form.
///
/// Only digits are considered. Numbers whose digit count or leading digits
/// do not fit a known layout are returned trimmed but otherwise untouched.
pub(crate) fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter_map(ascii_digit).collect();
    let has_area_code = digits
        .get(..3)
        .is_some_and(|prefix| THREE_DIGIT_AREA_CODES.contains(&prefix));

    let groups: &[usize] = match digits.len() {
        10 if digits.starts_with(METRO_AREA_CODE) => &[2, 4, 4],
        10 if has_area_code => &[3, 3, 4],
        10 => &[2, 4, 4],
        9 if has_area_code => &[3, 3, 3],
        9 if digits.starts_with('0') => &[2, 3, 4],
        8 if !digits.starts_with('0') => &[4, 4],
        _ => return raw.trim().to_string(),
    };

    let mut parts = Vec::with_capacity(groups.len());
    let mut offset = 0;
    for len in groups {
        parts.push(&digits[offset..offset + len]);
        offset += len;
    }
    parts.join("-")
}

/// ASCII and fullwidth (０-９) digits, as ASCII.
fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metro_ten_digit() {
        assert_eq!(format_phone("0223456789"), "02-2345-6789");
        assert_eq!(format_phone("(02)2345-6789"), "02-2345-6789");
    }

    #[test]
    fn test_fullwidth_digits_are_grouped() {
        assert_eq!(format_phone("（０２）２３４５６７８９"), "02-2345-6789");
        assert_eq!(format_phone("０７－３１２１１０１"), "07-312-1101");
    }

    #[test]
    fn test_three_digit_area_codes() {
        assert_eq!(format_phone("0371234567"), "037-123-4567");
        assert_eq!(format_phone("089-123456"), "089-123-456");
        assert_eq!(format_phone("049 2345678"), "049-234-5678");
    }

    #[test]
    fn test_other_ten_digit_defaults_to_two_four_four() {
        assert_eq!(format_phone("0912345678"), "09-1234-5678");
        assert_eq!(format_phone("07-3121101 #1"), "07-3121-1011");
    }

    #[test]
    fn test_nine_digit_local_pattern() {
        assert_eq!(format_phone("073121101"), "07-312-1101");
    }

    #[test]
    fn test_eight_digit_without_area_code() {
        assert_eq!(format_phone("23456789"), "2345-6789");
        assert_eq!(format_phone(" 02345678 "), "02345678");
    }

    #[test]
    fn test_passthrough_for_other_lengths() {
        assert_eq!(format_phone("  "), "");
        assert_eq!(format_phone(" 無 "), "無");
        assert_eq!(format_phone("+886-2-2345-6789"), "+886-2-2345-6789");
        assert_eq!(format_phone(" 1234567 "), "1234567");
        assert_eq!(format_phone("123456789"), "123456789");
    }
}
