//! Text normalization applied to post titles and bodies before storage.

/// Collapse every whitespace run (spaces, tabs, `\r`, `\n`, ...) into a single
/// space and trim both ends.
///
/// The result never contains raw newlines or tabs, and applying the function
/// to its own output returns the same string.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_newlines_and_tabs() {
        let text = "Line one\r\nline two\n\tindented\rend";
        assert_eq!(collapse_whitespace(text), "Line one line two indented end");
    }

    #[test]
    fn test_collapses_space_runs_and_trims() {
        assert_eq!(collapse_whitespace("   a    b  c   "), "a b c");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Hello\n\nworld",
            "  tabs\tand\t\tspaces  ",
            "already normalized text",
            "unicode\u{00a0}nbsp and  é accents",
        ];
        for sample in samples {
            let once = collapse_whitespace(sample);
            let twice = collapse_whitespace(&once);
            assert_eq!(once, twice);
            assert!(!once.contains('\n'));
            assert!(!once.contains('\t'));
            assert!(!once.contains("  "));
        }
    }
}
