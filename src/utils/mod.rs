//! Shared utility functions
//!
//! Common utilities used across multiple modules.

pub mod io;

pub use io::{atomic_write, backup_once, backup_path};

/// Keep at most `max_chars` characters of `text`
///
/// Counts characters, not bytes, so the cut never lands inside a multi-byte
/// code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// A window of `radius` characters on each side of the byte offset `at`
///
/// `at` is clamped to the text and snapped back to a char boundary.
pub fn char_window(text: &str, at: usize, radius: usize) -> &str {
    let mut at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }

    let start = text[..at]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let start = if radius == 0 { at } else { start };

    let end = text[at..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| at + i)
        .unwrap_or(text.len());

    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 3), "");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("привет", 2), "пр");
    }

    #[test]
    fn test_char_window() {
        let text = "0123456789";
        assert_eq!(char_window(text, 5, 2), "3456");
        assert_eq!(char_window(text, 0, 3), "012");
        assert_eq!(char_window(text, 9, 3), "6789");
        assert_eq!(char_window(text, 50, 2), "89");
    }

    #[test]
    fn test_char_window_multibyte() {
        let text = "ab привет cd";
        let at = text.find("ив").unwrap();
        assert_eq!(char_window(text, at, 2), "прив");
    }
}
