//! Parse natural language chat messages into structured quest actions
//!
//! The model is an untrusted parser. Its text goes through two gates before
//! anything reaches the ledger: brace-span extraction, then schema
//! validation into [`ActionIntent`], whose variants carry the fields each
//! action cannot do without.

use crate::core::error::{LedgerError, Result};
use crate::core::types::{Priority, TaskFilter, TaskId};
use crate::llm::client::TextGenerator;
use crate::llm::prompt::{build_prompt, PromptContext};
use crate::store::parse_due_date;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Key holding the action object in a model reply
pub const ACTION_KEY: &str = "json";
/// Key holding the in-character reply
pub const REPLY_KEY: &str = "friendly_reply";

/// Every action name the model may use
pub const ACTION_NAMES: [&str; 6] = [
    "add",
    "complete",
    "delete",
    "show",
    "set_priority",
    "set_due_date",
];

/// Reply used whenever the model's answer cannot be trusted
pub const FALLBACK_REPLY: &str =
    "The ancient magic falters... I cannot understand your command. Let me show you all quests instead.";

/// A validated quest action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionIntent {
    /// Inscribe a new quest
    Add {
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_date: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<Priority>,
    },
    /// Mark a quest vanquished
    Complete {
        #[serde(deserialize_with = "task_id_lenient")]
        task_id: TaskId,
    },
    /// Erase a quest from history
    Delete {
        #[serde(deserialize_with = "task_id_lenient")]
        task_id: TaskId,
    },
    /// List quests; a missing or null filter means all
    Show {
        #[serde(default, deserialize_with = "filter_or_all")]
        filter: TaskFilter,
    },
    SetPriority {
        #[serde(deserialize_with = "task_id_lenient")]
        task_id: TaskId,
        priority: Priority,
    },
    SetDueDate {
        #[serde(deserialize_with = "task_id_lenient")]
        task_id: TaskId,
        due_date: String,
    },
}

impl ActionIntent {
    /// The safe default: show everything
    pub fn fallback() -> Self {
        ActionIntent::Show {
            filter: TaskFilter::All,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionIntent::Add { .. } => "add",
            ActionIntent::Complete { .. } => "complete",
            ActionIntent::Delete { .. } => "delete",
            ActionIntent::Show { .. } => "show",
            ActionIntent::SetPriority { .. } => "set_priority",
            ActionIntent::SetDueDate { .. } => "set_due_date",
        }
    }

    /// Checks serde cannot express on its own
    fn check_payload(&self) -> Result<()> {
        match self {
            ActionIntent::Add { description, .. } if description.trim().is_empty() => Err(
                LedgerError::Schema("add requires a non-empty description".into()),
            ),
            ActionIntent::SetDueDate { due_date, .. } if parse_due_date(due_date).is_none() => {
                Err(LedgerError::Schema(format!(
                    "set_due_date needs a YYYY-MM-DD date, got '{}'",
                    due_date
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Action plus reply, as returned to chat callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub json: ActionIntent,
    pub friendly_reply: String,
}

impl ChatResponse {
    /// The fixed response used when resolution fails at any stage
    pub fn fallback() -> Self {
        Self {
            json: ActionIntent::fallback(),
            friendly_reply: FALLBACK_REPLY.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

/// Ask the model to parse a chat message and validate what comes back
///
/// # Arguments
/// * `generator` - The language model to use for parsing
/// * `message` - The player's chat message, passed through verbatim
/// * `context` - Date context for resolving relative dates
///
/// # Returns
/// A validated response, or the first stage that failed
pub async fn parse_chat(
    generator: &dyn TextGenerator,
    message: &str,
    context: &PromptContext,
) -> Result<ChatResponse> {
    let prompt = build_prompt(message, context);
    let response = generator.generate(&prompt).await?;
    tracing::debug!(raw = %response, "Model response");

    parse_model_response(&response).map_err(|e| {
        tracing::debug!(error = %e, raw = %response, "Rejected model response");
        e
    })
}

/// Extraction then validation for one block of model text
pub fn parse_model_response(response: &str) -> Result<ChatResponse> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| LedgerError::Extraction(format!("Invalid JSON: {}", e)))?;
    validate_response(value)
}

/// Extract JSON object from LLM response (handles surrounding text)
///
/// Greedy: spans from the first `{` to the last `}`, so prose, code fences
/// and nested objects are all tolerated. Sibling objects are captured
/// together and then fail to parse.
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| LedgerError::Extraction("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| LedgerError::Extraction("No closing brace found in response".into()))?;
    Ok(&response[start..=end])
}

/// Check a parsed reply against the action schema
pub fn validate_response(value: Value) -> Result<ChatResponse> {
    let Value::Object(mut top) = value else {
        return Err(LedgerError::Schema("Response is not a JSON object".into()));
    };

    let (Some(action), Some(reply)) = (top.remove(ACTION_KEY), top.remove(REPLY_KEY)) else {
        return Err(LedgerError::Schema(format!(
            "Response must contain both '{}' and '{}'",
            ACTION_KEY, REPLY_KEY
        )));
    };

    let Value::String(friendly_reply) = reply else {
        return Err(LedgerError::Schema(format!("'{}' must be a string", REPLY_KEY)));
    };

    let name = action.get("action").and_then(Value::as_str);
    match name {
        Some(name) if ACTION_NAMES.contains(&name) => {}
        Some(name) => {
            return Err(LedgerError::Schema(format!("Unrecognized action '{}'", name)));
        }
        None => return Err(LedgerError::Schema("Missing 'action' field".into())),
    }

    let intent: ActionIntent = serde_json::from_value(action)
        .map_err(|e| LedgerError::Schema(format!("Invalid action payload: {}", e)))?;
    intent.check_payload()?;

    Ok(ChatResponse {
        json: intent,
        friendly_reply,
    })
}

/// Accept `3` or `"3"`; reject zero, negatives and fractions
fn task_id_lenient<'de, D>(deserializer: D) -> std::result::Result<TaskId, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let id = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().trim_start_matches('#').parse::<u64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(TaskId(id)),
        _ => Err(D::Error::custom("task_id must be a positive integer")),
    }
}

fn filter_or_all<'de, D>(deserializer: D) -> std::result::Result<TaskFilter, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TaskFilter>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"json": {"action": "show"}, "friendly_reply": "Behold"}"#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here is the parsed command:\n```json\n{\"json\": {\"action\": \"show\", \"filter\": \"urgent\"}, \"friendly_reply\": \"Urgent quests!\"}\n```\nMay your blade stay sharp.";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("urgent"));
    }

    #[test]
    fn test_extract_json_no_json() {
        let result = extract_json("I don't understand that command");
        assert!(matches!(result, Err(LedgerError::Extraction(_))));
    }

    #[test]
    fn test_extract_json_reversed_braces() {
        let result = extract_json("} nothing here {");
        assert!(matches!(result, Err(LedgerError::Extraction(_))));
    }

    #[test]
    fn test_sibling_objects_fail_extraction() {
        let response = r#"{"json": {"action": "show"}, "friendly_reply": "a"} and {"more": 1}"#;
        let result = parse_model_response(response);
        assert!(matches!(result, Err(LedgerError::Extraction(_))));
    }

    #[test]
    fn test_add_intent() {
        let response = parse_model_response(
            r#"{"json": {"action": "add", "description": "patrol the north corridor", "priority": "high"}, "friendly_reply": "Inscribed!"}"#,
        )
        .unwrap();
        assert_eq!(
            response.json,
            ActionIntent::Add {
                description: "patrol the north corridor".into(),
                due_date: None,
                priority: Some(Priority::High),
            }
        );
        assert_eq!(response.friendly_reply, "Inscribed!");
    }

    #[test]
    fn test_missing_reply_key() {
        let result = validate_response(json!({"json": {"action": "show"}}));
        assert!(matches!(result, Err(LedgerError::Schema(_))));
    }

    #[test]
    fn test_missing_action_key() {
        let result = validate_response(json!({"friendly_reply": "hi", "action": "show"}));
        assert!(matches!(result, Err(LedgerError::Schema(_))));
    }

    #[test]
    fn test_unknown_action() {
        let result = validate_response(json!({
            "json": {"action": "summon_dragon"},
            "friendly_reply": "Rawr"
        }));
        match result {
            Err(LedgerError::Schema(msg)) => assert!(msg.contains("summon_dragon")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_add_without_description_rejected() {
        for payload in [json!({"action": "add"}), json!({"action": "add", "description": "  "})] {
            let result = validate_response(json!({"json": payload, "friendly_reply": "ok"}));
            assert!(matches!(result, Err(LedgerError::Schema(_))));
        }
    }

    #[test]
    fn test_set_priority_requires_valid_priority() {
        let result = validate_response(json!({
            "json": {"action": "set_priority", "task_id": 1, "priority": "critical"},
            "friendly_reply": "ok"
        }));
        assert!(matches!(result, Err(LedgerError::Schema(_))));
    }

    #[test]
    fn test_set_due_date_requires_real_date() {
        let result = validate_response(json!({
            "json": {"action": "set_due_date", "task_id": 1, "due_date": "soon"},
            "friendly_reply": "ok"
        }));
        assert!(matches!(result, Err(LedgerError::Schema(_))));

        let ok = validate_response(json!({
            "json": {"action": "set_due_date", "task_id": 1, "due_date": "2026-10-20"},
            "friendly_reply": "ok"
        }))
        .unwrap();
        assert_eq!(ok.json.name(), "set_due_date");
    }

    #[test]
    fn test_task_id_lenient_forms() {
        let parse = |id: Value| {
            validate_response(json!({
                "json": {"action": "complete", "task_id": id},
                "friendly_reply": "ok"
            }))
        };
        assert_eq!(
            parse(json!("3")).unwrap().json,
            ActionIntent::Complete { task_id: TaskId(3) }
        );
        assert!(parse(json!(0)).is_err());
        assert!(parse(json!(-2)).is_err());
        assert!(parse(json!(1.5)).is_err());
        assert!(parse(json!(null)).is_err());
    }

    #[test]
    fn test_show_defaults_to_all() {
        for payload in [json!({"action": "show"}), json!({"action": "show", "filter": null})] {
            let response =
                validate_response(json!({"json": payload, "friendly_reply": "Behold"})).unwrap();
            assert_eq!(response.json, ActionIntent::fallback());
        }
    }

    #[test]
    fn test_fallback_serialization() {
        let value = serde_json::to_value(ChatResponse::fallback()).unwrap();
        assert_eq!(
            value,
            json!({
                "json": {"action": "show", "filter": "all"},
                "friendly_reply": FALLBACK_REPLY
            })
        );
    }

    #[test]
    fn test_add_serialization_omits_absent_fields() {
        let intent = ActionIntent::Add {
            description: "patrol".into(),
            due_date: None,
            priority: None,
        };
        assert_eq!(
            serde_json::to_value(&intent).unwrap(),
            json!({"action": "add", "description": "patrol"})
        );
    }
}
