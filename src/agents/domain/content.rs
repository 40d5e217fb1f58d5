//! Role-tagged multi-part content exchanged with agent runtimes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role tag used for user turns
pub const USER_ROLE: &str = "user";

/// Role tag used for model output
pub const MODEL_ROLE: &str = "model";

/// Content of a turn or of a runtime event: a role and an ordered list of parts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
    /// Producer-specific fields kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Content {
    /// User content carrying a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::with_role(USER_ROLE, vec![Part::text(text)])
    }

    /// Model content carrying a single text part
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::with_role(MODEL_ROLE, vec![Part::text(text)])
    }

    pub fn with_role(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
            extra: Map::new(),
        }
    }

    /// Concatenated text of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

/// One part of a [`Content`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        rename = "function_call",
        alias = "functionCall",
        skip_serializing_if = "Option::is_none"
    )]
    pub function_call: Option<FunctionCall>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Default::default()
        }
    }
}

/// A function (tool) invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}
