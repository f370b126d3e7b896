use crate::shared::validation::ADMIN_PREFIX_REGEX;

const COUNTRY_SUFFIX: &str = ", Indonesia";

/// Prepare a free-text address for the place search provider.
///
/// Lower-cases the input, drops Indonesian administrative unit words
/// ("desa", "kecamatan", "kab.", ...) that precede a place name and appends
/// the country name when missing. Never fails.
pub fn normalize(raw_address: &str) -> String {
    let lowered = raw_address.to_lowercase();
    let stripped = ADMIN_PREFIX_REGEX.replace_all(&lowered, "");
    let mut normalized = stripped.trim().to_string();

    if !normalized.contains("indonesia") {
        normalized.push_str(COUNTRY_SUFFIX);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_admin_prefixes() {
        assert_eq!(
            normalize("Desa Ngadipiro, Kecamatan Sidoharjo, Wonogiri"),
            "ngadipiro, sidoharjo, wonogiri, Indonesia"
        );
        assert_eq!(
            normalize("Kel. Menteng, Kota Jakarta Pusat, Prov. DKI Jakarta"),
            "kel. menteng, jakarta pusat, dki jakarta, Indonesia"
        );
        assert_eq!(
            normalize("Kab. Klaten, Provinsi Jawa Tengah"),
            "klaten, jawa tengah, Indonesia"
        );
    }

    #[test]
    fn test_keeps_existing_country() {
        assert_eq!(
            normalize("Jalan Merdeka 10, Bandung, Indonesia"),
            "jalan merdeka 10, bandung, indonesia"
        );
    }

    #[test]
    fn test_does_not_strip_inside_words() {
        assert_eq!(normalize("Kotabaru"), "kotabaru, Indonesia");
    }

    #[test]
    fn test_empty_input_gets_suffix() {
        assert_eq!(normalize(""), ", Indonesia");
    }
}
