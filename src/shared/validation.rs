use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Indonesian administrative unit words used as a prefix before a place name
    /// - Matches: "desa ", "Kecamatan ", "kec. ", "kab. ", "prov. "
    /// - Does not match: "kotabaru" (no separator), "padesa " (not at a word start)
    pub static ref ADMIN_PREFIX_REGEX: Regex = Regex::new(
        r"(?i)\b(?:desa|kelurahan|kecamatan|kec\.|kabupaten|kab\.|kota|provinsi|prov\.)\s+"
    )
    .unwrap();

    /// Separators between address tokens (commas and whitespace)
    pub static ref ADDRESS_SEPARATOR_REGEX: Regex = Regex::new(r"[,\s]+").unwrap();

    /// Characters not allowed in a stored upload filename
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_prefix_regex_matches_prefixes() {
        assert!(ADMIN_PREFIX_REGEX.is_match("desa ngadipiro"));
        assert!(ADMIN_PREFIX_REGEX.is_match("Kecamatan Sidoharjo"));
        assert!(ADMIN_PREFIX_REGEX.is_match("kec. sidoharjo"));
        assert!(ADMIN_PREFIX_REGEX.is_match("kab. wonogiri"));
        assert!(ADMIN_PREFIX_REGEX.is_match("prov. jawa tengah"));
    }

    #[test]
    fn test_admin_prefix_regex_ignores_embedded_words() {
        assert!(!ADMIN_PREFIX_REGEX.is_match("kotabaru"));
        assert!(!ADMIN_PREFIX_REGEX.is_match("padesa"));
        assert!(!ADMIN_PREFIX_REGEX.is_match("jalan merdeka"));
    }

    #[test]
    fn test_address_separator_regex() {
        let parts: Vec<&str> = ADDRESS_SEPARATOR_REGEX
            .split("a, b  c,d")
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(parts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unsafe_filename_chars() {
        assert_eq!(
            UNSAFE_FILENAME_CHARS.replace_all("foto banjir (1).jpg", "_"),
            "foto_banjir_1_.jpg"
        );
    }
}
