//! Resolves the extract's combined city+district strings to a canonical city.

use crate::tables::{City, normalize_city_spelling};

/// Prefix lengths (in characters) tried against the raw locality, shortest first.
const CITY_PREFIX_LENGTHS: [usize; 2] = [3, 4];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Locality {
    pub city: City,
    pub district: String,
}

/// Splits `raw_locality` (e.g. "臺北市松山區") into a canonical city and a
/// district remainder, falling back to a city prefix of `address`.
///
/// Returns `None` when neither source names a known city; such records must
/// be dropped by the caller.
pub(crate) fn resolve_locality(raw_locality: &str, address: &str) -> Option<Locality> {
    let raw_locality = raw_locality.trim();

    for length in CITY_PREFIX_LENGTHS {
        let Some((prefix, remainder)) = split_at_char(raw_locality, length) else {
            continue;
        };
        if let Ok(city) = normalize_city_spelling(prefix).parse::<City>() {
            tracing::trace!("Resolved '{}' to {} via {}-char prefix", raw_locality, city, length);
            return Some(Locality {
                city,
                district: remainder.to_string(),
            });
        }
    }

    let address = address.trim();
    let city = City::ALL.iter().copied().find(|city| {
        address.starts_with(city.as_str())
            || city
                .legacy_spelling()
                .is_some_and(|legacy| address.starts_with(legacy))
    })?;

    tracing::debug!(
        "Locality '{}' unresolved, took {} from address '{}'",
        raw_locality,
        city,
        address
    );
    Some(Locality {
        city,
        district: String::new(),
    })
}

/// Splits after `chars` characters; `None` if the string is shorter.
fn split_at_char(s: &str, chars: usize) -> Option<(&str, &str)> {
    if chars == 0 {
        return Some(("", s));
    }
    let mut indices = s.char_indices().skip(chars);
    match indices.next() {
        Some((byte_idx, _)) => Some(s.split_at(byte_idx)),
        None if s.chars().count() == chars => Some((s, "")),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_legacy_spelling_prefix() {
        let locality = resolve_locality("臺北市松山區", "").unwrap();
        assert_eq!(locality.city, City::Taipei);
        assert_eq!(locality.city.as_str(), "台北市");
        assert_eq!(locality.district, "松山區");
    }

    #[test]
    fn test_resolves_canonical_prefix() {
        let locality = resolve_locality("新北市板橋區", "").unwrap();
        assert_eq!(locality.city, City::NewTaipei);
        assert_eq!(locality.district, "板橋區");

        let locality = resolve_locality("連江縣", "").unwrap();
        assert_eq!(locality.city, City::Lienchiang);
        assert_eq!(locality.district, "");
    }

    #[test]
    fn test_falls_back_to_address_prefix() {
        let locality = resolve_locality("", "臺東縣臺東市開封街1號").unwrap();
        assert_eq!(locality.city, City::Taitung);
        assert_eq!(locality.district, "");

        let locality = resolve_locality("不明", "嘉義市東區忠孝路").unwrap();
        assert_eq!(locality.city, City::ChiayiCity);
    }

    #[test]
    fn test_unresolved_when_no_source_names_a_city() {
        assert!(resolve_locality("東京都新宿區", "東京都新宿区1-1").is_none());
        assert!(resolve_locality("", "").is_none());
        assert!(resolve_locality("台北", "").is_none());
    }

    #[test]
    fn test_split_at_char_counts_characters_not_bytes() {
        assert_eq!(split_at_char("高雄市苓雅區", 3), Some(("高雄市", "苓雅區")));
        assert_eq!(split_at_char("高雄市", 3), Some(("高雄市", "")));
        assert_eq!(split_at_char("高雄", 3), None);
    }
}
