//! Utility functions for text handling.

use unicode_segmentation::UnicodeSegmentation;

/// Truncate a string to at most `max_chars` characters, respecting char boundaries.
///
/// # Examples
///
/// ```
/// use persona_relay::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Split a message into parts of at most `max_length` bytes.
///
/// Lines are kept whole when they fit; a line longer than the limit is cut
/// on grapheme boundaries. Whitespace-only parts are dropped.
///
/// # Examples
///
/// ```
/// use persona_relay::utils::split_long_message;
/// assert_eq!(split_long_message("short", 10), vec!["short"]);
/// assert_eq!(split_long_message("one\ntwo", 5), vec!["one", "two"]);
/// ```
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }

    if message.len() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in message.lines() {
        if line.len() > max_length {
            push_part(&mut parts, &mut current);
            for grapheme in line.graphemes(true) {
                if !current.is_empty() && current.len() + grapheme.len() > max_length {
                    push_part(&mut parts, &mut current);
                }
                current.push_str(grapheme);
            }
            continue;
        }

        let separator = usize::from(!current.is_empty());
        if current.len() + separator + line.len() > max_length {
            push_part(&mut parts, &mut current);
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    push_part(&mut parts, &mut current);

    parts
}

fn push_part(parts: &mut Vec<String>, current: &mut String) {
    let part = current.trim_end();
    if !part.trim_start().is_empty() {
        parts.push(part.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
        assert_eq!(truncate_str("", 3), "");
        assert_eq!(truncate_str("ça va ?", 2), "ça");
    }

    #[test]
    fn test_split_keeps_short_message_whole() {
        assert_eq!(split_long_message("Bonjour", 4000), vec!["Bonjour"]);
        assert!(split_long_message("", 4000).is_empty());
    }

    #[test]
    fn test_split_on_line_boundaries() {
        let message = "aaaa\nbbbb\ncccc";
        assert_eq!(split_long_message(message, 9), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_single_long_line_respects_limit() {
        let message = "é".repeat(4100);
        let parts = split_long_message(&message, 4000);

        assert!(parts.len() > 1);
        assert!(parts.iter().all(|p| p.len() <= 4000));
        assert_eq!(parts.concat(), message);
    }

    #[test]
    fn test_split_oversized_fallback_reply() {
        let text = "x".repeat(4096);
        let reply = crate::persona::fallback_reply(&text);
        assert!(reply.len() > crate::config::TELEGRAM_MESSAGE_LIMIT);

        let parts = split_long_message(&reply, crate::config::TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(parts.len(), 2);
        assert!(parts
            .iter()
            .all(|p| p.len() <= crate::config::TELEGRAM_MESSAGE_LIMIT));
        assert_eq!(parts.concat(), reply);
    }

    #[test]
    fn test_split_drops_blank_parts() {
        let message = format!("{}\n   \n{}", "a".repeat(8), "b".repeat(8));
        assert_eq!(split_long_message(&message, 8), vec!["a".repeat(8), "b".repeat(8)]);
    }
}
