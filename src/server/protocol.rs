//! JSON-RPC 2.0 message types for the line-delimited stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::download::ProgressEvent;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision reported when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// An incoming request or notification.
///
/// `id` is kept as a raw JSON value so string and numeric ids are echoed
/// back exactly. A missing id marks a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// Must be `"2.0"`.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
    /// Request id; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcRequest {
    /// True when no response is expected.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Short description.
    pub message: String,
    /// Extra detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Creates an error without data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Parse error (-32700).
    #[must_use]
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(-32700, format!("Parse error: {}", detail.into()))
    }

    /// Invalid request (-32600).
    #[must_use]
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(-32600, format!("Invalid Request: {}", detail.into()))
    }

    /// Method not found (-32601).
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {method}"))
    }

    /// Invalid params (-32602).
    #[must_use]
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(-32602, format!("Invalid params: {}", detail.into()))
    }
}

/// Outgoing response.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl RpcResponse {
    /// Success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    #[must_use]
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Converts to a JSON value for the writer.
    #[must_use]
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Builds a `notifications/progress` message for `token`.
#[must_use]
pub fn progress_notification(token: &Value, event: ProgressEvent) -> Value {
    let mut params = json!({
        "progressToken": token,
        "progress": event.progress,
    });
    if let Some(total) = event.total {
        params["total"] = json!(total);
    }
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": "notifications/progress",
        "params": params,
    })
}

/// Result body of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    /// Text content items.
    pub content: Vec<TextContent>,
    /// Machine-readable copy of the result, if any.
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Whether the tool failed.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Successful result carrying one text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            structured_content: None,
            is_error: false,
        }
    }

    /// Failed result carrying `payload` as text and as structured content.
    #[must_use]
    pub fn failure(payload: Value) -> Self {
        Self {
            content: vec![TextContent::new(payload.to_string())],
            structured_content: Some(payload),
            is_error: true,
        }
    }
}

/// A text content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    kind: &'static str,
    /// The text.
    pub text: String,
}

impl TextContent {
    /// Creates a text item.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_id_verbatim() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc","method":"ping"}"#).unwrap();
        assert_eq!(req.id, Some(json!("abc")));
        assert!(!req.is_notification());

        let note: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(note.is_notification());
    }

    #[test]
    fn test_response_omits_absent_members() {
        let ok = RpcResponse::success(json!(1), json!({})).into_value();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = RpcResponse::error(Value::Null, RpcError::method_not_found("x")).into_value();
        assert_eq!(err["error"]["code"], -32601);
        assert!(err.get("result").is_none());
    }

    #[test]
    fn test_progress_notification_with_total() {
        let msg = progress_notification(&json!(7), ProgressEvent::finished());
        assert_eq!(msg["method"], "notifications/progress");
        assert_eq!(msg["params"]["progressToken"], 7);
        assert_eq!(msg["params"]["progress"], 100.0);
        assert_eq!(msg["params"]["total"], 100.0);
    }

    #[test]
    fn test_progress_notification_indeterminate_has_no_total() {
        let event = ProgressEvent {
            progress: 2048.0,
            total: None,
        };
        let msg = progress_notification(&json!("tok"), event);
        assert!(msg["params"].get("total").is_none());
    }

    #[test]
    fn test_tool_call_failure_shape() {
        let result = ToolCallResult::failure(json!({"status": 400}));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["structuredContent"]["status"], 400);
    }
}
