use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of program element a name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Method,
    Class,
    Property,
    Field,
    Parameter,
    Variable,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Method,
        Self::Class,
        Self::Property,
        Self::Field,
        Self::Parameter,
        Self::Variable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Class => "class",
            Self::Property => "property",
            Self::Field => "field",
            Self::Parameter => "parameter",
            Self::Variable => "variable",
        }
    }

    /// Parse a kind tag case-insensitively; `"type"` is accepted for classes
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "method" => Some(Self::Method),
            "class" | "type" => Some(Self::Class),
            "property" => Some(Self::Property),
            "field" => Some(Self::Field),
            "parameter" => Some(Self::Parameter),
            "variable" => Some(Self::Variable),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed new name for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub old_name: String,
    pub new_name: String,
    pub entity_kind: EntityKind,
    pub reason: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
}

impl Suggestion {
    pub fn new(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
        entity_kind: EntityKind,
    ) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            entity_kind,
            reason: String::new(),
            confidence: 1.0,
        }
    }

    /// Non-empty and different from the current name
    pub fn is_actionable(&self) -> bool {
        let new_name = self.new_name.trim();
        !new_name.is_empty() && new_name != self.old_name
    }

    /// `"method tmp → count"`
    pub fn describe(&self) -> String {
        format!("{} {} → {}", self.entity_kind, self.old_name, self.new_name)
    }
}

/// Result of one whole-module analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Short free-text summary from the model
    pub analysis: String,
    pub suggestions: Vec<Suggestion>,
    pub overall_score: f64,
    pub key_issues: Vec<String>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_empty() && self.suggestions.is_empty() && self.key_issues.is_empty()
    }

    /// Suggestions at or above `min_confidence`, in their original order
    pub fn confident(&self, min_confidence: f64) -> impl Iterator<Item = &Suggestion> {
        self.suggestions
            .iter()
            .filter(move |s| s.confidence >= min_confidence)
    }
}

/// Analysis JSON exactly as the model is asked to produce it
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAnalysis {
    analysis: String,
    suggestions: Vec<RawSuggestion>,
    overall_score: f64,
    key_issues: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSuggestion {
    old_name: String,
    new_name: String,
    entity_type: String,
    reason: String,
    confidence: f64,
}

impl From<RawAnalysis> for AnalysisResult {
    fn from(raw: RawAnalysis) -> Self {
        let suggestions = raw
            .suggestions
            .into_iter()
            .filter_map(|s| {
                let Some(kind) = EntityKind::parse(&s.entity_type) else {
                    tracing::warn!(
                        "Dropping suggestion {} -> {}: unknown entity type '{}'",
                        s.old_name,
                        s.new_name,
                        s.entity_type
                    );
                    return None;
                };
                Some(Suggestion {
                    old_name: s.old_name,
                    new_name: s.new_name.trim().to_string(),
                    entity_kind: kind,
                    reason: s.reason,
                    confidence: clamp_unit(s.confidence),
                })
            })
            .collect();

        Self {
            analysis: raw.analysis,
            suggestions,
            overall_score: raw.overall_score,
            key_issues: raw.key_issues,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
