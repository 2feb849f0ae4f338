//! Block payloads as a sum type.
//!
//! Each block type carries its own strongly typed payload. On the wire and
//! in storage a block is a `block_type` discriminator plus a JSON `data`
//! object; [`BlockContent::from_parts`] and [`BlockContent::into_parts`]
//! convert between the two shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Highest heading level accepted (`h1`..`h6`).
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Maximum number of items in a single list block.
pub const MAX_LIST_ITEMS: usize = 1000;

/// Bullet style of a list block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    Ordered,
    Unordered,
}

/// The typed payload of a content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block_type", content = "data", rename_all = "snake_case")]
pub enum BlockContent {
    Paragraph {
        text: String,
    },
    Heading {
        text: String,
        level: u8,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    CodeBlock {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    Quote {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    List {
        style: ListStyle,
        items: Vec<String>,
    },
    Divider {},
    /// Extension point for block types the core does not model. The
    /// payload is opaque and compared structurally.
    Custom {
        name: String,
        payload: Value,
    },
}

impl BlockContent {
    /// Convenience constructor for a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    /// Convenience constructor for a heading block.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    /// Convenience constructor for a quote block without attribution.
    pub fn quote(text: impl Into<String>) -> Self {
        Self::Quote {
            text: text.into(),
            attribution: None,
        }
    }

    /// The storage discriminator for this block.
    pub fn block_type(&self) -> &'static str {
        match self {
            Self::Paragraph { .. } => "paragraph",
            Self::Heading { .. } => "heading",
            Self::Image { .. } => "image",
            Self::CodeBlock { .. } => "code_block",
            Self::Quote { .. } => "quote",
            Self::List { .. } => "list",
            Self::Divider {} => "divider",
            Self::Custom { .. } => "custom",
        }
    }

    /// Rebuild a block from its stored `block_type` and `data` columns.
    pub fn from_parts(block_type: &str, data: Value) -> Result<Self, CoreError> {
        let tagged = serde_json::json!({ "block_type": block_type, "data": data });
        serde_json::from_value(tagged).map_err(|e| {
            CoreError::Validation(format!("Invalid '{block_type}' block data: {e}"))
        })
    }

    /// Split a block into its `block_type` and `data` columns.
    pub fn into_parts(self) -> (&'static str, Value) {
        let block_type = self.block_type();
        let data = match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove("data").unwrap_or(Value::Null),
            _ => Value::Null,
        };
        (block_type, data)
    }

    /// Check the payload against the boundary rules for its block type.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Paragraph { text } | Self::Quote { text, .. } => {
                require_non_empty(self.block_type(), "text", text)
            }
            Self::Heading { text, level } => {
                require_non_empty("heading", "text", text)?;
                if *level == 0 || *level > MAX_HEADING_LEVEL {
                    return Err(CoreError::Validation(format!(
                        "Heading level must be between 1 and {MAX_HEADING_LEVEL}, got {level}"
                    )));
                }
                Ok(())
            }
            Self::Image { url, .. } => require_non_empty("image", "url", url),
            Self::CodeBlock { code, .. } => require_non_empty("code_block", "code", code),
            Self::List { items, .. } => {
                if items.len() > MAX_LIST_ITEMS {
                    return Err(CoreError::Validation(format!(
                        "List block may have at most {MAX_LIST_ITEMS} items"
                    )));
                }
                Ok(())
            }
            Self::Divider {} => Ok(()),
            Self::Custom { name, .. } => require_non_empty("custom", "name", name),
        }
    }
}

fn require_non_empty(block_type: &str, field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "'{block_type}' block requires a non-empty '{field}'"
        )));
    }
    Ok(())
}
