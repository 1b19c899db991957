//! Escape codec for string tokens embedded in fake-JS.
//!
//! Some bundlers rewrite long or escape-heavy string literals into template
//! literals. A declaration body containing a backtick would be corrupted by
//! that rewrite, so newlines and tabs are substituted with reserved markers
//! before the text is quoted, and substituted back after bundling. Each
//! marker is a Private-Use-Area code point wrapping a one-letter ASCII tag,
//! which keeps the markers outside anything user-authored TypeScript could
//! plausibly contain while staying byte-identical through the bundler.

/// Marker substituted for `\n` in tokenised string content.
pub const NEWLINE_MARK: &str = "\u{f8f4}n\u{f8f4}";

/// Marker substituted for `\t` in tokenised string content.
pub const TAB_MARK: &str = "\u{f8f4}t\u{f8f4}";

/// Replace newlines and tabs with the reserved markers.
///
/// Injective for inputs that do not already contain the markers; the result
/// never contains a literal newline or tab.
pub fn escape(text: &str) -> String {
    text.replace('\n', NEWLINE_MARK).replace('\t', TAB_MARK)
}

/// Undo [`escape`]. Idempotent on strings without markers.
pub fn unescape(text: &str) -> String {
    text.replace(NEWLINE_MARK, "\n").replace(TAB_MARK, "\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_text() {
        let input = "interface Foo {\n\tbar: string;\n}";
        assert_eq!(unescape(&escape(input)), input);
    }

    #[test]
    fn escaped_text_has_no_raw_newline_or_tab() {
        let escaped = escape("a\nb\tc");
        assert!(!escaped.contains('\n'));
        assert!(!escaped.contains('\t'));
    }

    #[test]
    fn unescape_is_idempotent_without_markers() {
        let plain = "type A = string;";
        assert_eq!(unescape(plain), plain);
        assert_eq!(unescape(&unescape(&escape(plain))), plain);
    }

    #[test]
    fn markers_survive_backtick_content() {
        let input = "/** uses `code` spans */\ntype T = 1;";
        let escaped = escape(input);
        assert!(escaped.contains('`'));
        assert_eq!(unescape(&escaped), input);
    }
}
