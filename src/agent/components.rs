use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a tabular result, keyed by column name.
pub type Row = Map<String, Value>;

/// One unit of the agent's streamed answer. The service interleaves status
/// narration, structured metadata and tabular results in a single response,
/// so consumers fold over the sequence rather than switching on shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseComponent {
    /// Progress card; may carry the generated SQL in its metadata.
    StatusCard {
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(default)]
        content: Option<String>,
    },
    /// Free-form narration, possibly containing a fenced SQL block.
    Text { content: String },
    /// Tabular query results.
    DataFrame {
        #[serde(default)]
        rows: Vec<Row>,
    },
}

impl ResponseComponent {
    /// Non-empty `sql` metadata value, if this component carries one.
    pub fn sql_metadata(&self) -> Option<&str> {
        match self {
            ResponseComponent::StatusCard { metadata, .. } => metadata
                .get("sql")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty()),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            ResponseComponent::StatusCard { content, .. } => content.as_deref(),
            ResponseComponent::Text { content } => Some(content.as_str()),
            ResponseComponent::DataFrame { .. } => None,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            ResponseComponent::DataFrame { rows } if !rows.is_empty() => Some(rows),
            _ => None,
        }
    }
}
