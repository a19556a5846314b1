use crate::tools::{self, ToolError};
use crate::types::ErrorResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpToolsResponse {
    pub tools: Vec<McpTool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpCallResponse {
    pub content: Vec<McpContent>,
    pub is_error: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl McpCallResponse {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![McpContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error,
        }
    }
}

pub async fn list_tools() -> Json<McpToolsResponse> {
    let tools = tools::catalogue()
        .into_iter()
        .map(|spec| McpTool {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            input_schema: spec.input_schema,
        })
        .collect();
    Json(McpToolsResponse { tools })
}

pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(request): Json<McpCallRequest>,
) -> Result<Json<McpCallResponse>, (StatusCode, Json<ErrorResponse>)> {
    let args = request.arguments.as_object().cloned().unwrap_or_default();
    match tools::call_tool(&state.client, &request.name, &args).await {
        Ok(text) => Ok(Json(McpCallResponse::text(text, false))),
        Err(ToolError::Search(e)) => {
            error!("{} tool error: {}", request.name, e);
            Ok(Json(McpCallResponse::text(
                format!("{} failed: {}", request.name, e),
                true,
            )))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
