use rmcp::{model::*, ServiceExt};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::tools::{self, ToolError};
use crate::AppState;

#[derive(Clone, Debug)]
pub struct McpService {
    pub state: Arc<AppState>,
}

impl McpService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Starting MCP Service");
        info!(
            "API domain: {}, web domain: {}, authenticated: {}",
            config.api_domain,
            config.web_domain,
            config.sessionid.is_some()
        );
        let state = Arc::new(AppState::from_config(config)?);
        Ok(Self { state })
    }
}

impl rmcp::ServerHandler for McpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Search users, hashtags, places, music and posts through the private search API."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _page: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = tools::catalogue()
            .into_iter()
            .map(|spec| {
                let schema = match spec.input_schema {
                    serde_json::Value::Object(map) => Arc::new(map),
                    _ => Arc::new(serde_json::Map::new()),
                };
                Tool::new(spec.name, spec.description, schema)
            })
            .collect();

        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.clone().unwrap_or_default();
        match tools::call_tool(&self.state.client, request.name.as_ref(), &args).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(ToolError::Search(e)) => {
                error!("{} tool error: {}", request.name, e);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "{} failed: {}",
                    request.name, e
                ))]))
            }
            Err(e @ (ToolError::MissingParam(_) | ToolError::InvalidParam(_))) => Err(ErrorData::new(
                ErrorCode::INVALID_PARAMS,
                e.to_string(),
                None,
            )),
            Err(e @ ToolError::UnknownTool(_)) => Err(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                e.to_string(),
                None,
            )),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let service = McpService::new(&config)?;
    let server = service.serve(rmcp::transport::stdio()).await?;
    info!("MCP stdio server running");
    let _quit_reason = server.waiting().await?;
    Ok(())
}
