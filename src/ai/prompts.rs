use super::naming::EntityKind;
use crate::utils::truncate_chars;

/// Upper bound on code sent with a single request, in characters
pub const MAX_EXCERPT_CHARS: usize = 3000;

/// Decoding options for single-entity rename requests
pub const RENAME_TOP_P: f64 = 0.9;

/// Decoding options for whole-module analysis
pub const ANALYSIS_TEMPERATURE: f64 = 0.2;
pub const ANALYSIS_TOP_P: f64 = 0.8;

const NAMING_GUIDELINES: &str = r#"Guidelines:
1. Follow C# naming conventions
2. Be descriptive but concise
3. Consider the entity's purpose
4. Use PascalCase for classes, methods, properties
5. Use camelCase for parameters and local variables"#;

/// Build the prompt for a single rename suggestion
///
/// The excerpt is capped at [`MAX_EXCERPT_CHARS`]. The current name and the
/// excerpt each appear exactly once.
pub fn build_rename_prompt(
    code_excerpt: &str,
    current_name: &str,
    kind: EntityKind,
    extra_context: &str,
) -> String {
    let excerpt = truncate_chars(code_excerpt, MAX_EXCERPT_CHARS);

    let mut prompt = format!(
        r#"You are a C# code refactoring assistant. Suggest a better name for this {}.

Current name: {}

Code context:
```csharp
{}
```"#,
        kind, current_name, excerpt
    );

    let extra_context = extra_context.trim();
    if !extra_context.is_empty() {
        prompt.push_str(&format!("\n\nAdditional context: {}", extra_context));
    }

    prompt.push_str("\n\n");
    prompt.push_str(NAMING_GUIDELINES);
    prompt.push_str("\n\nRespond ONLY with the new name, nothing else.\n\nNew name:");

    prompt
}

/// Build the prompt for a whole-module naming analysis
///
/// Only the first [`MAX_EXCERPT_CHARS`] characters of the source are sent, so
/// large modules are analysed partially.
pub fn build_analysis_prompt(source: &str) -> String {
    let excerpt = truncate_chars(source, MAX_EXCERPT_CHARS);

    format!(
        r#"Analyze this C# code and suggest improvements for naming and structure.

Code:
```csharp
{}
```

Provide response as JSON with this structure:
{{
  "analysis": "brief analysis text",
  "suggestions": [
    {{
      "oldName": "string",
      "newName": "string",
      "entityType": "class|method|property|field|parameter|variable",
      "reason": "string",
      "confidence": 0.0
    }}
  ],
  "overallScore": 0.0,
  "keyIssues": ["string"]
}}

Only respond with valid JSON, no other text."#,
        excerpt
    )
}
