//! Wire frames and message patterns.
//!
//! A request names its operation by pattern, either as a bare string
//! (`"find_one_product"`) or as `{"cmd": "find_one_product"}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operations addressable over the transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    CreateProduct,
    FindAllProducts,
    FindOneProduct,
    UpdateProduct,
    DeleteProduct,
    ValidateProducts,
}

impl Command {
    pub const ALL: [Self; 6] = [
        Self::CreateProduct,
        Self::FindAllProducts,
        Self::FindOneProduct,
        Self::UpdateProduct,
        Self::DeleteProduct,
        Self::ValidateProducts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProduct => "create_product",
            Self::FindAllProducts => "find_all_products",
            Self::FindOneProduct => "find_one_product",
            Self::UpdateProduct => "update_product",
            Self::DeleteProduct => "delete_product",
            Self::ValidateProducts => "validate_products",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    Name(String),
    Cmd { cmd: String },
}

impl Pattern {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Cmd { cmd: name } => name,
        }
    }
}

/// Correlation id as the caller sent it: a JSON string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    Text(String),
    Number(serde_json::Number),
}

impl CorrelationId {
    /// Recover the id from an arbitrary JSON value, if it has a usable shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(number) => Some(Self::Number(number.clone())),
            _ => None,
        }
    }
}

/// Inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFrame {
    /// Correlation id echoed on the reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    pub pattern: Pattern,
    #[serde(default)]
    pub data: Value,
    /// Broker transport only: list key the reply is pushed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Outbound reply: exactly one of `response` / `err` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
    pub is_disposed: bool,
}

impl ReplyFrame {
    pub fn ok(id: Option<CorrelationId>, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            err: None,
            is_disposed: true,
        }
    }

    pub fn err(id: Option<CorrelationId>, err: Value) -> Self {
        Self {
            id,
            response: None,
            err: Some(err),
            is_disposed: true,
        }
    }

    /// Serialize as a single JSON line (newline included).
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            let fallback = ReplyFrame::err(
                None,
                serde_json::json!({
                    "status": "error",
                    "message": format!("reply serialization failed: {e}"),
                }),
            );
            serde_json::to_string(&fallback).unwrap_or_default()
        });
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.as_str()), Some(command));
        }
        assert_eq!(Command::from_name("drop_table"), None);
    }

    #[test]
    fn pattern_accepts_bare_string_and_cmd_object() {
        let bare: RequestFrame = serde_json::from_value(
            json!({"id": "1", "pattern": "find_one_product", "data": {"id": 3}}),
        )
        .unwrap();
        let object: RequestFrame = serde_json::from_value(
            json!({"id": "2", "pattern": {"cmd": "find_one_product"}, "data": {"id": 3}}),
        )
        .unwrap();

        assert_eq!(bare.pattern.name(), "find_one_product");
        assert_eq!(object.pattern.name(), "find_one_product");
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let frame: RequestFrame =
            serde_json::from_value(json!({"pattern": "find_all_products"})).unwrap();
        assert!(frame.data.is_null());
        assert!(frame.id.is_none());
    }

    #[test]
    fn reply_line_is_camel_case_and_newline_terminated() {
        let id = CorrelationId::Text("7".to_string());
        let line = ReplyFrame::ok(Some(id), json!({"ok": true})).to_line();
        assert!(line.ends_with('\n'));

        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["id"], "7");
        assert_eq!(parsed["isDisposed"], true);
        assert!(parsed.get("err").is_none());
    }

    #[test]
    fn numeric_correlation_id_is_echoed_as_a_number() {
        let frame: RequestFrame =
            serde_json::from_value(json!({"id": 12, "pattern": "find_all_products"})).unwrap();
        assert_eq!(frame.id, Some(CorrelationId::Number(12.into())));

        let line = ReplyFrame::ok(frame.id, json!([])).to_line();
        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["id"], 12);
    }

    #[test]
    fn correlation_id_ignores_unusable_shapes() {
        assert_eq!(
            CorrelationId::from_value(&json!("a")),
            Some(CorrelationId::Text("a".to_string()))
        );
        assert_eq!(CorrelationId::from_value(&json!(true)), None);
        assert_eq!(CorrelationId::from_value(&json!({"x": 1})), None);
    }
}
