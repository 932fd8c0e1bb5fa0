//! Free-text cleanup for biography fields.

const REPLACEMENT: char = '\u{FFFD}';

/// Repair mojibake and compact whitespace until the text stops changing.
///
/// Repair: text whose UTF-8 bytes were decoded as Latin-1 is re-encoded and decoded again; the
/// result is only accepted when it carries no more U+FFFD than before. Whitespace: runs inside a
/// line become a single space, blank lines are dropped and lines are joined with `\n`.
pub fn normalize_text(text: &str) -> String {
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(text: &str) -> String {
    let text = repair_mojibake(text).unwrap_or_else(|| text.to_string());
    text.split(is_line_break)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Latin-1 encode then strict UTF-8 decode. `None` when either step is impossible or the result
/// has more replacement characters than the input.
fn repair_mojibake(text: &str) -> Option<String> {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;
    let repaired = String::from_utf8(bytes).ok()?;
    let count = |s: &str| s.chars().filter(|&c| c == REPLACEMENT).count();
    (count(&repaired) <= count(text)).then_some(repaired)
}

// `\r\n` splits into a line and an empty line; the empty one is dropped anyway.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0B}'
            | '\u{0C}'
            | '\u{1C}'
            | '\u{1D}'
            | '\u{1E}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_latin1_mojibake() {
        assert_eq!(normalize_text("CafÃ© researcher"), "Café researcher");
        assert_eq!(normalize_text("Ã¼ber"), "über");
    }

    #[test]
    fn leaves_correct_unicode_alone() {
        // U+00E9 alone is not valid UTF-8 once Latin-1 encoded.
        assert_eq!(normalize_text("Café"), "Café");
        // Outside Latin-1 entirely.
        assert_eq!(normalize_text("量子 research — ok"), "量子 research — ok");
    }

    #[test]
    fn collapses_whitespace_and_blank_lines() {
        let raw = "  First   line\t here \r\n\r\n\n   second\u{2028}third  \n\n";
        assert_eq!(normalize_text(raw), "First line here\nsecond\nthird");
    }

    #[test]
    fn repairs_double_encoding() {
        // "é" encoded to UTF-8 and mis-decoded twice.
        assert_eq!(normalize_text("Ã\u{83}Â©"), "é");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t\n "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        proptest::proptest!(|(s in "\\PC{0,64}|[\\x00-\\xff \n\r\t]{0,64}")| {
            let once = normalize_text(&s);
            proptest::prop_assert_eq!(normalize_text(&once), once);
        })
    }
}
