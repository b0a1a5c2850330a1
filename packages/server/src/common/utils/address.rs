/// Street-type abbreviations used in Russian postal addresses and their full forms.
///
/// Nominatim matches full street types far more reliably than the abbreviated
/// forms produced by address suggestion widgets.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("ал", "аллея"),
    ("б-р", "бульвар"),
    ("взв", "взвоз"),
    ("взд", "въезд"),
    ("дор", "дорога"),
    ("ззд", "заезд"),
    ("км", "километр"),
    ("к-цо", "кольцо"),
    ("лн", "линия"),
    ("мгстр", "магистраль"),
    ("наб", "набережная"),
    ("пер-д", "переезд"),
    ("пер", "переулок"),
    ("пл-ка", "площадка"),
    ("пл", "площадь"),
    ("пр-д", "проезд"),
    ("пр-кт", "проспект"),
    ("пр-ка", "просека"),
    ("пр-к", "просек"),
    ("пр-лок", "проселок"),
    ("проул", "проулок"),
    ("рзд", "разъезд"),
    ("с-р", "сквер"),
    ("с-к", "спуск"),
    ("сзд", "съезд"),
    ("туп", "тупик"),
    ("ул", "улица"),
    ("ш", "шоссе"),
    ("тер", "территория"),
];

/// City marker token ("г Москва").
const CITY_MARKER: &str = "г";

/// House marker tokens ("д 4", "дом 4").
const HOUSE_MARKERS: &[&str] = &["д", "дом"];

/// Rewrite a Russian postal address into the shape OpenStreetMap search expects.
///
/// - Drops everything up to and including the city marker (`г`), so region
///   prefixes such as "Московская обл, г Клин" collapse to "Клин".
/// - Keeps the house number but drops the house marker and any building or
///   block suffix after it ("д 4 стр 1" becomes "4").
/// - Expands street-type abbreviations as whole tokens ("ул" becomes "улица").
///
/// # Example
/// ```
/// use sportify_core::common::utils::normalize_address_for_osm;
///
/// assert_eq!(
///     normalize_address_for_osm("г Москва, ул Воротынская, д 9 к 1"),
///     "Москва, улица Воротынская, 9"
/// );
/// ```
pub fn normalize_address_for_osm(address: &str) -> String {
    let mut tokens: Vec<&str> = address.split_whitespace().collect();

    if let Some(city_idx) = tokens.iter().position(|t| *t == CITY_MARKER) {
        tokens.drain(..=city_idx);
    }

    if let Some(house_idx) = tokens.iter().position(|t| HOUSE_MARKERS.contains(t)) {
        let number = tokens.get(house_idx + 1).copied();
        tokens.truncate(house_idx);
        tokens.extend(number);
    }

    tokens
        .into_iter()
        .map(expand_abbreviation)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand a single token, keeping a trailing comma and dropping a trailing
/// abbreviation dot.
fn expand_abbreviation(token: &str) -> String {
    let (core, comma) = match token.strip_suffix(',') {
        Some(core) => (core, ","),
        None => (token, ""),
    };
    let core = core.strip_suffix('.').unwrap_or(core);

    match STREET_ABBREVIATIONS.iter().find(|(short, _)| *short == core) {
        Some((_, full)) => format!("{}{}", full, comma),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_addresses_pass_through() {
        assert_eq!(
            normalize_address_for_osm("Госпитальный переулок 4-6"),
            "Госпитальный переулок 4-6"
        );
        assert_eq!(normalize_address_for_osm("Алтайский край"), "Алтайский край");
    }

    #[test]
    fn test_city_prefix_and_house_suffix_removed() {
        assert_eq!(
            normalize_address_for_osm("г Москва, Госпитальная наб, д 4 стр 1"),
            "Москва, Госпитальная набережная, 4"
        );
        assert_eq!(
            normalize_address_for_osm("г Москва, Госпитальный пер, д 4-6 стр 3"),
            "Москва, Госпитальный переулок, 4-6"
        );
    }

    #[test]
    fn test_region_before_city_is_dropped() {
        assert_eq!(
            normalize_address_for_osm(
                "Московская обл, г Клин, деревня Кононово, тер. СНТ Аллея Перова МГТУ им Н.Э.Баумана"
            ),
            "Клин, деревня Кононово, территория СНТ Аллея Перова МГТУ им Н.Э.Баумана"
        );
    }

    #[test]
    fn test_full_street_types_are_not_expanded_twice() {
        assert_eq!(
            normalize_address_for_osm("г Москва, улица Арбат, дом 10"),
            "Москва, улица Арбат, 10"
        );
    }

    #[test]
    fn test_house_marker_without_number() {
        assert_eq!(normalize_address_for_osm("г Тверь, пр-кт Ленина, д"), "Тверь, проспект Ленина,");
    }
}
