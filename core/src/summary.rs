/// Upper bound on summary length, in characters, ellipsis included.
pub const SUMMARY_WIDTH: usize = 250;
pub const ELLIPSIS: &str = "...";

/// Collapses runs of whitespace to single spaces and, if the result is wider
/// than `width` characters, keeps as many whole words as fit alongside the
/// trailing ellipsis. A first word too long to fit leaves just the ellipsis.
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed_len = words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len().saturating_sub(1);
    if collapsed_len <= width {
        return words.join(" ");
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut out = String::new();
    let mut used = 0usize;
    for word in words {
        let len = word.chars().count();
        let needed = if out.is_empty() { len } else { len + 1 };
        if used + needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }
    out.push_str(ELLIPSIS);
    out
}

/// Summary shown with a result; empty when the scheme has no details text.
pub fn summarize(details: Option<&str>) -> String {
    details.map(|d| shorten(d, SUMMARY_WIDTH)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(target: usize) -> String {
        let words = ["financial", "assistance", "is", "provided", "to", "eligible", "families", "under", "the", "scheme"];
        let mut s = String::new();
        let mut i = 0;
        while s.len() < target {
            if !s.is_empty() {
                s.push(' ');
            }
            s.push_str(words[i % words.len()]);
            i += 1;
        }
        s.truncate(target);
        if s.ends_with(' ') {
            s.pop();
            s.push('s');
        }
        s
    }

    #[test]
    fn short_text_is_unchanged() {
        let text = prose(100);
        assert_eq!(text.len(), 100);
        assert_eq!(shorten(&text, SUMMARY_WIDTH), text);
    }

    #[test]
    fn long_text_breaks_on_a_word_and_ends_with_ellipsis() {
        let text = prose(400);
        let out = shorten(&text, SUMMARY_WIDTH);
        assert!(out.chars().count() <= SUMMARY_WIDTH);
        assert!(out.ends_with(ELLIPSIS));
        let kept = out.trim_end_matches(ELLIPSIS);
        assert!(text.starts_with(kept));
        let next = text[kept.len()..].chars().next();
        assert_eq!(next, Some(' '));
    }

    #[test]
    fn exact_width_is_not_truncated() {
        let text = prose(250);
        assert_eq!(shorten(&text, 250), text);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(shorten("  housing \n\t subsidy  ", 250), "housing subsidy");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(shorten(&text, 10), text);
    }

    #[test]
    fn oversized_first_word_leaves_only_the_ellipsis() {
        assert_eq!(shorten(&"x".repeat(20), 10), ELLIPSIS);
    }

    #[test]
    fn missing_details_give_empty_summary() {
        assert_eq!(summarize(None), "");
        assert_eq!(summarize(Some("short")), "short");
    }
}
