//! # Command Envelope
//!
//! The decoded form of a queue message body: an operation tag, an optional
//! action tag, and whatever other fields the producer attached. Fields beyond
//! `op` and `action` are not validated here; they pass through opaquely to
//! the invoked runner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::registry::OperationKey;

/// Operation tag for commands that invoke a named action.
pub const OP_INVOKE_ACTION: &str = "InvokeAction";

/// A decoded command. `op` is required; `action` is meaningful only for
/// `InvokeAction` commands. A missing `action` is not a decode error: a
/// command with no matching routing row is simply dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub op: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// All remaining payload fields, forwarded verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Command {
    /// Decode a message body. Fails when the body is not a JSON object or
    /// lacks a string `op` field.
    pub fn decode(body: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(body.clone())
    }

    /// Routing key for this command.
    pub fn operation_key(&self) -> OperationKey {
        OperationKey {
            op: self.op.clone(),
            action: self.action.clone(),
        }
    }

    /// Human-readable `op/action` tag for logs.
    pub fn describe(&self) -> String {
        match &self.action {
            Some(action) => format!("{}/{}", self.op, action),
            None => self.op.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_run_site_command_with_extra_fields() {
        let body = json!({
            "op": "InvokeAction",
            "action": "runSite",
            "site_id": "A1",
            "timescale": 5
        });

        let command = Command::decode(&body).unwrap();
        assert_eq!(command.op, OP_INVOKE_ACTION);
        assert_eq!(command.action.as_deref(), Some("runSite"));
        assert_eq!(command.fields["site_id"], json!("A1"));
        assert_eq!(command.fields["timescale"], json!(5));
    }

    #[test]
    fn missing_op_is_a_decode_error() {
        let body = json!({"action": "runSite"});
        assert!(Command::decode(&body).is_err());
    }

    #[test]
    fn non_object_body_is_a_decode_error() {
        assert!(Command::decode(&json!(["op", "InvokeAction"])).is_err());
        assert!(Command::decode(&json!("InvokeAction")).is_err());
    }

    #[test]
    fn missing_action_decodes_without_error() {
        let command = Command::decode(&json!({"op": "Ping"})).unwrap();
        assert_eq!(command.op, "Ping");
        assert_eq!(command.action, None);
        assert_eq!(command.describe(), "Ping");
    }

    #[test]
    fn reserialization_preserves_all_fields() {
        let body = json!({
            "op": "InvokeAction",
            "action": "addSite",
            "osm_name": "building.osm",
            "upload_id": "abc-123"
        });

        let command = Command::decode(&body).unwrap();
        let reserialized = serde_json::to_value(&command).unwrap();
        assert_eq!(reserialized, body);
    }
}
