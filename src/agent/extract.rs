use tracing::debug;

use super::components::{ResponseComponent, Row};
use super::AgentError;

const SQL_FENCE: &str = "```sql";
const FENCE: &str = "```";

/// Scans a complete response stream and returns the generated SQL.
///
/// The agent narrates intermediate status before its final structured
/// answer, so the whole stream is consumed and the last signal wins: a
/// `sql` metadata field takes precedence within a component, a fenced
/// ```sql block in narration is the fallback. Earlier candidates are
/// overwritten by later ones.
pub fn extract_sql<I>(components: I) -> Result<String, AgentError>
where
    I: IntoIterator<Item = ResponseComponent>,
{
    let mut sql: Option<String> = None;

    for component in components {
        if let Some(value) = component.sql_metadata() {
            debug!("SQL candidate from component metadata");
            sql = Some(value.to_string());
        } else if let Some(content) = component.content() {
            if content.to_lowercase().contains(SQL_FENCE) {
                for part in content.split(FENCE) {
                    let trimmed = part.trim();
                    if trimmed.to_lowercase().starts_with("sql") {
                        // A blank block is no signal, same as blank metadata;
                        // it must not displace an earlier candidate.
                        let block = trimmed[3..].trim();
                        if !block.is_empty() {
                            debug!("SQL candidate from fenced code block");
                            sql = Some(block.to_string());
                        }
                    }
                }
            }
        }
    }

    sql.ok_or_else(|| {
        AgentError::GenerationError(
            "Agent did not generate SQL. Please try rephrasing your question.".to_string(),
        )
    })
}

/// Scans a complete response stream and returns the tabular results.
///
/// A single result-bearing component is expected per execution; if the
/// agent emits more than one, the last replaces the rest. An empty vec
/// means either a legitimately empty result set or no result component
/// at all; the two are not distinguished.
pub fn extract_rows<I>(components: I) -> Vec<Row>
where
    I: IntoIterator<Item = ResponseComponent>,
{
    let mut results: Vec<Row> = Vec::new();

    for component in components {
        if let Some(rows) = component.rows() {
            results = rows.to_vec();
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::client::execute_prompt;
    use serde_json::{json, Map, Value};

    fn status_card(sql: &str) -> ResponseComponent {
        let mut metadata = Map::new();
        metadata.insert("sql".to_string(), Value::String(sql.to_string()));
        ResponseComponent::StatusCard {
            metadata,
            content: None,
        }
    }

    fn text(content: &str) -> ResponseComponent {
        ResponseComponent::Text {
            content: content.to_string(),
        }
    }

    fn data_frame(rows: Vec<Row>) -> ResponseComponent {
        ResponseComponent::DataFrame { rows }
    }

    fn row(key: &str, value: i64) -> Row {
        let mut row = Map::new();
        row.insert(key.to_string(), json!(value));
        row
    }

    #[test]
    fn single_metadata_component_returns_value_exactly() {
        let sql = extract_sql(vec![
            text("Let me look at the schema."),
            status_card("SELECT COUNT(*) FROM customers;"),
        ])
        .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM customers;");
    }

    #[test]
    fn later_metadata_overrides_earlier() {
        let sql = extract_sql(vec![
            status_card("SELECT 1;"),
            text("Refining the query..."),
            status_card("SELECT 2;"),
        ])
        .unwrap();
        assert_eq!(sql, "SELECT 2;");
    }

    #[test]
    fn fenced_block_is_parsed_and_trimmed() {
        let sql = extract_sql(vec![text(
            "Here is the query:\n\n```sql\nSELECT name FROM products;\n```\nDone.",
        )])
        .unwrap();
        assert_eq!(sql, "SELECT name FROM products;");
    }

    #[test]
    fn fence_marker_is_case_insensitive() {
        let sql = extract_sql(vec![text("```SQL\nSELECT 1;\n```")]).unwrap();
        assert_eq!(sql, "SELECT 1;");
    }

    #[test]
    fn metadata_takes_precedence_within_a_component() {
        let mut metadata = Map::new();
        metadata.insert("sql".to_string(), json!("SELECT 'meta';"));
        let component = ResponseComponent::StatusCard {
            metadata,
            content: Some("```sql\nSELECT 'content';\n```".to_string()),
        };
        assert_eq!(extract_sql(vec![component]).unwrap(), "SELECT 'meta';");
    }

    #[test]
    fn empty_fenced_block_is_no_signal() {
        let err = extract_sql(vec![text("Here you go:\n```sql\n```")]).unwrap_err();
        assert!(matches!(err, AgentError::GenerationError(_)));
    }

    #[test]
    fn empty_fenced_block_does_not_displace_earlier_candidate() {
        let sql = extract_sql(vec![
            status_card("SELECT 1;"),
            text("And the block:\n```sql\n```"),
        ])
        .unwrap();
        assert_eq!(sql, "SELECT 1;");
    }

    #[test]
    fn no_sql_signal_is_a_generation_error() {
        let err = extract_sql(vec![text("I could not answer that."), data_frame(vec![])])
            .unwrap_err();
        assert!(matches!(err, AgentError::GenerationError(_)));
        assert!(err.to_string().contains("rephrasing"));
    }

    #[test]
    fn empty_stream_is_a_generation_error() {
        assert!(matches!(
            extract_sql(Vec::new()),
            Err(AgentError::GenerationError(_))
        ));
    }

    #[test]
    fn last_row_component_wins() {
        let rows = extract_rows(vec![
            data_frame(vec![row("n", 1)]),
            text("Re-ran with the corrected filter."),
            data_frame(vec![row("n", 2), row("n", 3)]),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["n"], json!(2));
    }

    #[test]
    fn no_rows_yields_empty_not_error() {
        assert!(extract_rows(vec![text("no table here")]).is_empty());
        assert!(extract_rows(Vec::new()).is_empty());
    }

    #[test]
    fn execute_prompt_round_trips_through_extraction() {
        let original = "SELECT id, name FROM customers WHERE segment = 'SMB';";
        let recovered = extract_sql(vec![text(&execute_prompt(original))]).unwrap();
        assert_eq!(recovered, original);
    }
}
