//! Lenient JSON extraction from model output
//!
//! Local models asked for "only JSON" still wrap it in fences or add a line
//! of chatter. Parsing is attempted in stages, from strict to forgiving.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("no valid JSON object in model response (preview: {preview})")]
pub struct ExtractError {
    pub preview: String,
}

pub fn extract_json<T: DeserializeOwned>(response: &str) -> Result<T, ExtractError> {
    let trimmed = response.trim();

    if let Ok(parsed) = serde_json::from_str::<T>(trimmed) {
        return Ok(parsed);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(parsed) = serde_json::from_str::<T>(unfenced) {
        return Ok(parsed);
    }

    for candidate in [unfenced, trimmed] {
        if let Some(object) = find_json_object(candidate) {
            if let Ok(parsed) = serde_json::from_str::<T>(object) {
                return Ok(parsed);
            }
        }
    }

    Err(ExtractError {
        preview: trimmed.chars().take(200).collect(),
    })
}

/// Strip a surrounding ```` ``` ```` / ```` ```json ```` fence
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an info string such as `json` on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };

    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Outermost `{ ... }` span, ignoring braces inside string literals
fn find_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Shape {
        analysis: String,
        overall_score: f64,
    }

    #[test]
    fn test_pure_json() {
        let shape: Shape = extract_json(r#"{"analysis": "ok", "overallScore": 7}"#).unwrap();
        assert_eq!(shape.analysis, "ok");
        assert_eq!(shape.overall_score, 7.0);
    }

    #[test]
    fn test_json_fence() {
        let input = "```json\n{\"analysis\": \"fenced\", \"overallScore\": 1}\n```";
        let shape: Shape = extract_json(input).unwrap();
        assert_eq!(shape.analysis, "fenced");
    }

    #[test]
    fn test_bare_fence() {
        let input = "```\n{\"analysis\": \"bare\", \"overallScore\": 2}\n```";
        let shape: Shape = extract_json(input).unwrap();
        assert_eq!(shape.analysis, "bare");
    }

    #[test]
    fn test_chatter_around_object() {
        let input = "Sure! Here is the analysis:\n{\"analysis\": \"x\", \"overallScore\": 3}\nHope it helps.";
        let shape: Shape = extract_json(input).unwrap();
        assert_eq!(shape.overall_score, 3.0);
    }

    #[test]
    fn test_braces_inside_strings() {
        let input = r#"Result: {"analysis": "uses } and { in text", "overallScore": 4} trailing"#;
        let shape: Shape = extract_json(input).unwrap();
        assert_eq!(shape.analysis, "uses } and { in text");
    }

    #[test]
    fn test_invalid() {
        let err = extract_json::<Shape>("I could not analyze this code.").unwrap_err();
        assert!(err.preview.starts_with("I could not"));
    }
}
