//! Text helpers shared by the memory and upload modules

use std::borrow::Cow;
use regex::Regex;
use lazy_static::lazy_static;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Windows device names that must never be used as a bare filename.
const RESERVED_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

pub struct TextUtils;

impl TextUtils {
    /// First `max_chars` characters of `text`, never splitting a code point.
    pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
        match text.char_indices().nth(max_chars) {
            Some((byte_pos, _)) => Cow::Borrowed(&text[..byte_pos]),
            None => Cow::Borrowed(text),
        }
    }

    /// Length in characters rather than bytes.
    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }

    pub fn is_blank(text: &str) -> bool {
        text.trim().is_empty()
    }

    /// Reduce a client-supplied filename to something safe to join onto the
    /// upload folder. Accented letters are folded to their ASCII base under
    /// NFKD; anything else outside ASCII is dropped. Returns an empty string
    /// when nothing usable remains.
    pub fn secure_filename(filename: &str) -> String {
        let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
        let flattened = ascii.replace(['/', '\\'], " ");
        let joined = WHITESPACE_REGEX.replace_all(flattened.trim(), "_");
        let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
        let mut name = cleaned.trim_matches(|c: char| c == '.' || c == '_').to_string();

        let stem = name.split('.').next().unwrap_or("").to_ascii_uppercase();
        if RESERVED_NAMES.contains(&stem.as_str()) {
            name.insert(0, '_');
        }
        name
    }

    /// Case-insensitive extension check against a list like `["csv"]`.
    pub fn has_extension(filename: &str, allowed: &[String]) -> bool {
        let lower = filename.to_lowercase();
        allowed
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.to_lowercase())))
    }

    /// Minimal HTML escaping for table cells.
    pub fn escape_html(text: &str) -> Cow<'_, str> {
        if !text.contains(['&', '<', '>', '"', '\'']) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(TextUtils::truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(TextUtils::truncate_chars("short", 100), "short");
        assert_eq!(TextUtils::truncate_chars("", 3), "");
        assert_eq!(TextUtils::truncate_chars("🦀🦀🦀", 2), "🦀🦀");
    }

    #[test]
    fn char_len_handles_multibyte() {
        assert_eq!(TextUtils::char_len("ü"), 1);
        assert_eq!(TextUtils::char_len("abc"), 3);
    }

    #[test]
    fn blank_detection() {
        assert!(TextUtils::is_blank("   \n\t"));
        assert!(!TextUtils::is_blank(" x "));
    }

    #[test]
    fn secure_filename_strips_paths() {
        assert_eq!(TextUtils::secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(TextUtils::secure_filename("My Data File.csv"), "My_Data_File.csv");
        assert_eq!(TextUtils::secure_filename("C:\\temp\\sales.csv"), "C_temp_sales.csv");
    }

    #[test]
    fn secure_filename_folds_accents_and_drops_leading_dots() {
        assert_eq!(TextUtils::secure_filename("données.csv"), "donnees.csv");
        assert_eq!(TextUtils::secure_filename("Résumé Über.csv"), "Resume_Uber.csv");
        assert_eq!(TextUtils::secure_filename("報告.csv"), "csv");
        assert_eq!(TextUtils::secure_filename(".hidden.csv"), "hidden.csv");
        assert_eq!(TextUtils::secure_filename("..."), "");
    }

    #[test]
    fn secure_filename_guards_device_names() {
        assert_eq!(TextUtils::secure_filename("con.csv"), "_con.csv");
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let allowed = vec!["csv".to_string()];
        assert!(TextUtils::has_extension("DATA.CSV", &allowed));
        assert!(TextUtils::has_extension("a.b.csv", &allowed));
        assert!(!TextUtils::has_extension("data.xlsx", &allowed));
        assert!(!TextUtils::has_extension("csv", &allowed));
    }

    #[test]
    fn escape_html_only_allocates_when_needed() {
        assert!(matches!(TextUtils::escape_html("plain"), Cow::Borrowed(_)));
        assert_eq!(TextUtils::escape_html("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }
}
