use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod server;
pub mod stdio;
pub mod upstream;

use domain::{
    instructions::InstructionsCache,
    registry::ToolRegistry,
    resources::ResourceCatalog,
    tools::{code_assist_registry, maps_tools_registry},
};
use errors::ToolError;
use mcp::session::SessionTable;
use upstream::{maps::MapsApi, rag::DocsApi};

/// The two servers built from this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    CodeAssist,
    MapsTools,
}

impl ServerKind {
    pub fn app_name(self) -> &'static str {
        match self {
            Self::CodeAssist => "google-maps-platform-code-assist",
            Self::MapsTools => "google-maps-platform-maps-tools",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CodeAssist => "Google Maps Platform Code Assist",
            Self::MapsTools => "Google Maps Platform Maps Tools",
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub kind: ServerKind,
    pub tools: Arc<ToolRegistry>,
    pub resources: Arc<ResourceCatalog>,
    pub sessions: Arc<SessionTable>,
}

impl AppState {
    pub fn new(kind: ServerKind, tools: ToolRegistry, resources: ResourceCatalog) -> Self {
        Self {
            kind,
            tools: Arc::new(tools),
            resources: Arc::new(resources),
            sessions: Arc::new(SessionTable::new()),
        }
    }

    pub fn code_assist(docs: Arc<dyn DocsApi>) -> Result<Self, ToolError> {
        let kind = ServerKind::CodeAssist;
        let cache = Arc::new(InstructionsCache::new());
        let tools = code_assist_registry(Arc::clone(&docs), Arc::clone(&cache))?;
        let resources = ResourceCatalog::with_instructions(kind.app_name(), cache, docs);
        Ok(Self::new(kind, tools, resources))
    }

    pub fn maps_tools(maps: Arc<dyn MapsApi>) -> Result<Self, ToolError> {
        Ok(Self::new(
            ServerKind::MapsTools,
            maps_tools_registry(maps)?,
            ResourceCatalog::empty(),
        ))
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route(
            "/mcp",
            post(http::handlers::mcp_endpoint).delete(http::handlers::close_session),
        )
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::instructions::tests::MockDocs;
    use crate::errors::UpstreamError;
    use crate::upstream::{maps::MapsMethod, UpstreamReply};

    use super::*;

    struct MockMaps;

    #[async_trait::async_trait]
    impl MapsApi for MockMaps {
        async fn call(
            &self,
            method: MapsMethod,
            body: &Value,
        ) -> Result<UpstreamReply, UpstreamError> {
            match method {
                MapsMethod::WeatherLookup => Ok(UpstreamReply {
                    status: 200,
                    body: json!({
                        "currentConditions": { "temperature": { "degrees": 21.5 } },
                        "address": body["address"],
                    }),
                }),
                _ => Err(UpstreamError::Status {
                    status: 400,
                    message: Some("API key not valid. Please pass a valid API key.".to_string()),
                    body: json!({ "error": { "message": "API key not valid. Please pass a valid API key." } }),
                }),
            }
        }
    }

    const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","clientInfo":{"name":"test-client","version":"1.0.0"},"capabilities":{}}}"#;

    fn maps_state() -> AppState {
        AppState::maps_tools(Arc::new(MockMaps)).expect("maps tools state")
    }

    fn code_assist_state() -> AppState {
        AppState::code_assist(Arc::new(MockDocs::default())).expect("code assist state")
    }

    fn post_mcp(session_id: Option<&str>, body: impl Into<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/mcp")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = session_id {
            builder = builder.header("mcp-session-id", id);
        }
        builder.body(Body::from(body.into())).expect("request build")
    }

    async fn body_json(response: Response) -> Value {
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&body).expect("json body")
    }

    async fn initialize(state: &AppState) -> String {
        let response = build_app(state.clone())
            .oneshot(post_mcp(None, INITIALIZE))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get("mcp-session-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("session id header")
    }

    fn call_tool(name: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
        .to_string()
    }

    #[tokio::test]
    async fn health_reports_active_sessions() {
        let state = maps_state();
        initialize(&state).await;

        let response = build_app(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["activeSessions"], 1);
        assert!(body["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }

    #[tokio::test]
    async fn discovery_is_public() {
        let response = build_app(code_assist_state())
            .oneshot(
                Request::builder()
                    .uri("/.well-known/mcp")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "google-maps-platform-code-assist");
        assert_eq!(body["mcp_endpoint"], "/mcp");
    }

    #[tokio::test]
    async fn initialize_creates_session() {
        let state = maps_state();
        let response = build_app(state.clone())
            .oneshot(post_mcp(None, INITIALIZE))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let session_id = response
            .headers()
            .get("mcp-session-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("session id header");

        let body = body_json(response).await;
        assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(
            body["result"]["serverInfo"]["name"],
            "google-maps-platform-maps-tools"
        );
        assert_eq!(state.sessions.len().await, 1);
        assert!(state.sessions.get(&session_id).await.is_some());
    }

    #[tokio::test]
    async fn failed_initialize_registers_nothing() {
        let state = maps_state();
        let response = build_app(state.clone())
            .oneshot(post_mcp(
                None,
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"test-client","version":"1.0.0"},"capabilities":{}}}"#,
            ))
            .await
            .expect("request execution");

        assert!(response.headers().get("mcp-session-id").is_none());
        let body = body_json(response).await;
        assert!(body.get("error").is_some());
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn code_assist_initialize_carries_instructions() {
        let state = code_assist_state();
        let response = build_app(state)
            .oneshot(post_mcp(None, INITIALIZE))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        assert_eq!(
            body["result"]["instructions"],
            "system instructions\n\npreamble\n\ndisclaimer"
        );
    }

    #[tokio::test]
    async fn non_init_without_session_is_rejected() {
        let state = maps_state();
        let response = build_app(state.clone())
            .oneshot(post_mcp(
                None,
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(
            body["error"]["message"],
            "Bad Request: No valid session ID provided for non-init request"
        );
        assert_eq!(body.get("id"), Some(&Value::Null));
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let state = maps_state();
        let response = build_app(state.clone())
            .oneshot(post_mcp(
                Some("invalid-session-id-123"),
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn non_ascii_session_header_is_treated_as_absent() {
        let state = maps_state();
        let opaque = header::HeaderValue::from_bytes(b"caf\xe9").expect("opaque header value");

        let request = Request::builder()
            .uri("/mcp")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .header("mcp-session-id", opaque.clone())
            .body(Body::from(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#))
            .expect("request build");
        let response = build_app(state.clone())
            .oneshot(request)
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);

        let request = Request::builder()
            .uri("/mcp")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .header("mcp-session-id", opaque)
            .body(Body::from(INITIALIZE))
            .expect("request build");
        let response = build_app(state.clone())
            .oneshot(request)
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("mcp-session-id").is_some());
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn non_mcp_payload_without_session_is_rejected() {
        let state = maps_state();
        let response = build_app(state.clone())
            .oneshot(post_mcp(None, r#"{"invalidJson":"not-a-valid-mcp-request"}"#))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn parse_error_for_invalid_json() {
        let response = build_app(maps_state())
            .oneshot(post_mcp(None, "{"))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn tools_list_returns_maps_tools() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .filter_map(|tool| tool["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "GoogleMapsPlatformWeatherLookup",
                "GoogleMapsPlatformPlacesSearchText",
                "GoogleMapsPlatformComputeRoutes"
            ]
        );
    }

    #[tokio::test]
    async fn weather_call_returns_success_envelope() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                call_tool(
                    "GoogleMapsPlatformWeatherLookup",
                    json!({ "address": "New York, NY" }),
                ),
            ))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        let text = body["result"]["content"][0]["text"]
            .as_str()
            .expect("text content");
        let envelope: Value = serde_json::from_str(text).expect("json envelope");
        assert_eq!(envelope["status"], "200");
        assert_eq!(envelope["response"]["contexts"]["address"], "New York, NY");
        assert_eq!(
            envelope["response"]["contexts"]["currentConditions"]["temperature"]["degrees"],
            21.5
        );
    }

    #[tokio::test]
    async fn structured_upstream_error_surfaces_message() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                call_tool(
                    "GoogleMapsPlatformPlacesSearchText",
                    json!({ "text_query": "restaurants in New York" }),
                ),
            ))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        assert_eq!(
            body["result"]["content"][0]["text"],
            "API key not valid. Please pass a valid API key."
        );
    }

    #[tokio::test]
    async fn unknown_tool_returns_fixed_text() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                call_tool("invalid-tool-name", json!({})),
            ))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        assert_eq!(body["result"]["content"][0]["text"], "Invalid Tool called");
    }

    #[tokio::test]
    async fn resources_read_returns_instructions() {
        let state = code_assist_state();
        let session_id = initialize(&state).await;

        let response = build_app(state.clone())
            .oneshot(post_mcp(
                Some(&session_id),
                r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"mcp://google-maps-platform-code-assist/instructions"}}"#,
            ))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        assert_eq!(
            body["result"]["contents"][0]["text"],
            "system instructions\n\npreamble\n\ndisclaimer"
        );

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                r#"{"jsonrpc":"2.0","id":4,"method":"resources/read","params":{"uri":"mcp://google-maps-platform-code-assist/unknown"}}"#,
            ))
            .await
            .expect("request execution");

        let body = body_json(response).await;
        assert_eq!(body["result"]["contents"][0]["text"], "Invalid Resource URI");
    }

    #[tokio::test]
    async fn notification_returns_accepted() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn batch_mixed_requests_return_only_id_responses() {
        let state = maps_state();
        let session_id = initialize(&state).await;

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                r#"[{"jsonrpc":"2.0","method":"notifications/initialized"},{"jsonrpc":"2.0","id":5,"method":"ping"}]"#,
            ))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let responses = body.as_array().expect("batch response");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 5);
    }

    #[tokio::test]
    async fn delete_closes_session() {
        let state = maps_state();
        let session_id = initialize(&state).await;
        assert_eq!(state.sessions.len().await, 1);

        let delete = |id: &str| {
            Request::builder()
                .uri("/mcp")
                .method("DELETE")
                .header("mcp-session-id", id)
                .body(Body::empty())
                .expect("request build")
        };

        let response = build_app(state.clone())
            .oneshot(delete(&session_id))
            .await
            .expect("request execution");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty().await);

        let response = build_app(state.clone())
            .oneshot(delete(&session_id))
            .await
            .expect("request execution");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32001);

        let response = build_app(state)
            .oneshot(post_mcp(
                Some(&session_id),
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ))
            .await
            .expect("request execution");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn shutdown_sweep_empties_table() {
        let state = maps_state();
        for _ in 0..3 {
            initialize(&state).await;
        }
        assert_eq!(state.sessions.len().await, 3);

        assert_eq!(state.sessions.close_all().await, 3);
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn root_get_is_not_found() {
        let response = build_app(maps_state())
            .oneshot(
                Request::builder()
                    .uri("/")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
