use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Hindi,
    Marathi,
}

impl Language {
    pub const ALL: [Language; 3] = [Self::English, Self::Hindi, Self::Marathi];

    /// Exact, case-sensitive key lookup. Anything unrecognised is English.
    pub fn from_key(value: Option<&str>) -> Self {
        match value {
            Some("hindi") => Self::Hindi,
            Some("marathi") => Self::Marathi,
            _ => Self::English,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::Marathi => "marathi",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Low,
    Medium,
    High,
}

impl UrgencyTier {
    pub const ALL: [UrgencyTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Default for UrgencyTier {
    fn default() -> Self {
        Self::Low
    }
}

/// Raw `/chat` body. Fields stay untyped so that a wrong JSON type is
/// reported as a validation failure instead of a deserialisation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub language: Option<Value>,
}

impl ChatInput {
    pub fn new(message: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            message: Some(Value::String(message.into())),
            language: Some(Value::String(language.into())),
        }
    }
}

/// A validated symptom description ready for the triage pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomQuery {
    pub message: String,
    pub language: Language,
}

impl TryFrom<ChatInput> for SymptomQuery {
    type Error = TriageError;

    fn try_from(input: ChatInput) -> Result<Self, Self::Error> {
        let message = match input.message {
            Some(Value::String(text)) if !text.is_empty() => text,
            _ => return Err(TriageError::InvalidMessage),
        };

        let language = Language::from_key(input.language.as_ref().and_then(Value::as_str));

        Ok(Self { message, language })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResponse {
    pub reply: String,
    pub urgency: UrgencyTier,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub time: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_form: Option<Value>,
    pub risk_level: UrgencyTier,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
