//! The central Model Context Protocol engine
//!
//! Provides the primary MCP JSON-RPC decoding, method execution routing, capabilities
//! negotiation (`initialize`), and tool/resource routing. Both transports feed
//! payloads through [`handle_json_rpc_payload`].

use rust_mcp_sdk::schema::{
    CallToolRequest, CallToolRequestParams, Implementation, InitializeRequest, InitializeResult,
    JsonrpcMessage, JsonrpcRequest, ListResourcesRequest, ListResourcesResult, ListToolsRequest,
    ListToolsResult, PingRequest, ReadResourceRequest, ReadResourceRequestParams,
    ServerCapabilities, ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::info;

use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    request_id_to_value, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::{errors::AppError, AppState};

/// Newest first; an unsupported offer is answered with the first entry.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

pub fn is_initialize_request(payload: &Value) -> bool {
    payload.get("method").and_then(Value::as_str) == Some("initialize")
}

/// Handles a single message or a batch. Returns `None` when nothing needs to be
/// sent back (notifications only).
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            INVALID_REQUEST,
            "Invalid Request",
        )]));
    }

    let mut responses = Vec::new();
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item).await {
            responses.push(response);
        }
    }

    (!responses.is_empty()).then_some(Value::Array(responses))
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(
                handle_json_rpc_request(
                    state,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            if notification.method.trim().is_empty() {
                return None;
            }

            let _ = handle_json_rpc_request(
                state,
                None,
                notification.method,
                notification.params.map(Value::Object),
            )
            .await;
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let payload = serde_json::to_value(request).expect("jsonrpc request serialization");
    let request_id = Some(request_id_to_value(request.id.clone()));

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "resources/read" => serde_json::from_value::<ReadResourceRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "resources/list" => serde_json::from_value::<ListResourcesRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());

    let response = match method.as_str() {
        "initialize" => handle_initialize(state, id, params.as_ref()).await,
        "ping" | "notifications/initialized" | "notifications/cancelled" => {
            json_rpc_result(id, json!({}))
        }
        "tools/list" => json_rpc_result(
            id,
            serde_json::to_value(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: state.tools.list(),
            })
            .expect("tools list result serialization"),
        ),
        "tools/call" => handle_tools_call(state, id, params).await,
        "resources/list" => json_rpc_result(
            id,
            serde_json::to_value(ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: state.resources.list(),
            })
            .expect("resources list result serialization"),
        ),
        "resources/read" => handle_resources_read(state, id, params).await,
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        server = state.kind.app_name(),
        method = %method,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

async fn handle_initialize(state: &AppState, id: Option<Value>, params: Option<&Value>) -> Value {
    let protocol_version = match negotiate_protocol_version(params) {
        Ok(version) => version,
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: state.kind.app_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some(state.kind.title().to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: None,
            ..Default::default()
        },
        protocol_version: protocol_version.to_string(),
        instructions: state.resources.instructions_text().await,
        meta: None,
    };

    json_rpc_result(
        id,
        serde_json::to_value(initialize_result).expect("initialize result serialization"),
    )
}

pub async fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let result = state
        .tools
        .dispatch(&tool_call.name, tool_call.arguments.unwrap_or_default())
        .await;

    json_rpc_result(
        id,
        serde_json::to_value(result).expect("tool call result serialization"),
    )
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let result = state.resources.read(&resource_read.uri).await;
    json_rpc_result(
        id,
        serde_json::to_value(result).expect("read resource result serialization"),
    )
}

pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|version| *version == offered_version)
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]))
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "key" | "api_key" | "apikey" | "authorization" | "password" | "secret"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}

#[cfg(test)]
mod tests {
    use super::{
        is_initialize_request, negotiate_protocol_version, redact_audit_params,
        SUPPORTED_PROTOCOL_VERSIONS,
    };
    use serde_json::json;

    #[test]
    fn redacts_sensitive_fields_in_audit_params() {
        let params = json!({
            "name": "GoogleMapsPlatformWeatherLookup",
            "arguments": {
                "address": "New York, NY",
                "key": "should-not-appear",
                "api_key": "should-not-appear",
                "nested": {
                    "access_token": "should-not-appear"
                }
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["name"], json!("GoogleMapsPlatformWeatherLookup"));
        assert_eq!(redacted["arguments"]["address"], json!("New York, NY"));
        assert_eq!(redacted["arguments"]["key"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["api_key"], json!("[REDACTED]"));
        assert_eq!(
            redacted["arguments"]["nested"]["access_token"],
            json!("[REDACTED]")
        );
    }

    #[test]
    fn negotiate_protocol_version_accepts_supported_versions() {
        for offered in SUPPORTED_PROTOCOL_VERSIONS {
            let params = json!({ "protocolVersion": offered });
            let version = negotiate_protocol_version(Some(&params)).expect("supported version");
            assert_eq!(version, offered);
        }
    }

    #[test]
    fn negotiate_protocol_version_falls_back_to_latest() {
        let params = json!({ "protocolVersion": "2099-01-01" });
        let version = negotiate_protocol_version(Some(&params)).expect("fallback version");
        assert_eq!(version, SUPPORTED_PROTOCOL_VERSIONS[0]);
    }

    #[test]
    fn negotiate_protocol_version_requires_a_version() {
        let error = negotiate_protocol_version(Some(&json!({})))
            .expect_err("missing version must fail");
        assert!(error.to_string().contains("bad request"));
    }

    #[test]
    fn initialize_detection_uses_method_name() {
        assert!(is_initialize_request(
            &json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} })
        ));
        assert!(!is_initialize_request(
            &json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })
        ));
        assert!(!is_initialize_request(&json!({ "invalidJson": "not-a-valid-mcp-request" })));
        assert!(!is_initialize_request(
            &json!([{ "jsonrpc": "2.0", "id": 1, "method": "initialize" }])
        ));
    }
}
