//! RMCP-based MCP server exposing the registry, repository and scaffold
//! tools over stdio.

use crate::config::Config;
use crate::error::ApiError;
use crate::hub::client::HubClient;
use crate::mcp::resources::SCAFFOLD_LAYOUT_GUIDE;
use crate::mcp::types::*;
use crate::registry::client::RegistryClient;
use crate::terraform::model::{display_provider, provider_code, ModuleDescription};
use crate::terraform::scaffold;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{
        Annotated, CallToolRequestParam, CallToolResult, Content, Implementation, InitializeResult,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, RawResource,
        ReadResourceRequestParam, ReadResourceResult, ResourceContents, ResourcesCapability,
        ServerCapabilities, ToolsCapability,
    },
    service::{RequestContext, RoleServer, ServiceExt},
    tool, tool_router,
};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Serialize a payload with `success: true` folded in.
fn success_payload<T: Serialize>(payload: &T) -> String {
    let mut value = serde_json::to_value(payload).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        map.insert("success".to_string(), serde_json::Value::Bool(true));
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Structured error payload carried in an error tool result.
fn error_payload(kind: &str, message: &str) -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "success": false,
        "error": kind,
        "message": message,
    }))
    .unwrap_or_default()
}

fn success_result<T: Serialize>(payload: &T) -> CallToolResult {
    CallToolResult::success(vec![Content::text(success_payload(payload))])
}

fn error_result(kind: &str, message: &str) -> CallToolResult {
    CallToolResult::error(vec![Content::text(error_payload(kind, message))])
}

fn api_error_result(e: &ApiError) -> CallToolResult {
    error_result(e.kind(), &e.to_string())
}

/// Payload for a module the registry does not know. Reported with
/// `success: false` but as a normal tool result: a missing module is an
/// answer, not a fault.
fn missing_module_payload(module_name: &str, provider: &str, organization: &str) -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "success": false,
        "module_exists": false,
        "module_name": module_name,
        "provider": provider,
        "organization": organization,
        "message": "Module not found in the private registry",
    }))
    .unwrap_or_default()
}

#[derive(Clone)]
pub struct ScaffoldServer {
    config: Arc<Config>,
    registry: Arc<RegistryClient>,
    hub: Arc<HubClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ScaffoldServer {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(RegistryClient::new(&config.registry));
        let hub = Arc::new(HubClient::new(&config.hub));
        Self {
            config: Arc::new(config),
            registry,
            hub,
            tool_router: Self::tool_router(),
        }
    }

    /// Serve the MCP server over stdio until the client disconnects.
    pub async fn serve_stdio(config: Config) -> anyhow::Result<()> {
        use tokio::io::{stdin, stdout};

        let server = Self::new(config);
        let transport = (stdin(), stdout());

        info!("starting tfscaffold MCP server via stdio");
        let service = server.serve(transport).await?;
        service.waiting().await?;

        Ok(())
    }

    #[tool(
        description = "Check whether a module exists in the organization's private Terraform registry",
        annotations(
            title = "Check Registry Module",
            read_only_hint = true,
            open_world_hint = true
        )
    )]
    async fn check_registry_module(
        &self,
        params: Parameters<CheckModuleInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(module = %params.0.module_name, "executing check_registry_module tool");
        match self
            .registry
            .check_module(&params.0.module_name, &params.0.provider)
            .await
        {
            Ok(check) => Ok(success_result(&check)),
            Err(ApiError::NotFound { .. }) => {
                Ok(CallToolResult::success(vec![Content::text(
                    missing_module_payload(
                        &params.0.module_name,
                        display_provider(provider_code(&params.0.provider)),
                        self.registry.organization(),
                    ),
                )]))
            }
            Err(e) => Ok(api_error_result(&e)),
        }
    }

    #[tool(
        description = "Get detailed information about a private registry module: versions, inputs, outputs, files and a usage example",
        annotations(
            title = "Get Module Details",
            read_only_hint = true,
            open_world_hint = true
        )
    )]
    async fn get_module_details(
        &self,
        params: Parameters<ModuleDetailsInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(module = %params.0.name, version = %params.0.version, "executing get_module_details tool");
        let code = provider_code(&params.0.provider).to_string();
        match self
            .registry
            .describe_module(&params.0.name, &code, &params.0.version)
            .await
        {
            Ok(details) => Ok(success_result(&details)),
            Err(e) => Ok(api_error_result(&e)),
        }
    }

    #[tool(
        description = "Fetch a module's source files from its repository, parsing variable and output declarations",
        annotations(
            title = "Get Repository Files",
            read_only_hint = true,
            open_world_hint = true
        )
    )]
    async fn get_repository_files(
        &self,
        params: Parameters<RepositoryFilesInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(module = %params.0.module_name, "executing get_repository_files tool");
        match self
            .hub
            .fetch_module_repository(&params.0.module_name, &params.0.provider)
            .await
        {
            Ok(files) => Ok(success_result(&files)),
            Err(e) => Ok(api_error_result(&e)),
        }
    }

    #[tool(
        description = "Write a complete Terraform scaffold (module call, variables, outputs, backend, per-environment tfvars) into a target repository",
        annotations(title = "Populate Infra Config Repo", destructive_hint = true)
    )]
    async fn populate_infra_config_repo(
        &self,
        params: Parameters<PopulateInput>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            module = %params.0.module_name,
            repo = %params.0.repo_path,
            "executing populate_infra_config_repo tool"
        );

        let repo_path = Path::new(&params.0.repo_path);
        if !repo_path.is_dir() {
            return Ok(error_result(
                "not_found",
                &format!("repository path {} is not a directory", params.0.repo_path),
            ));
        }

        let details: ModuleDescription = match serde_json::from_str(&params.0.module_details) {
            Ok(details) => details,
            Err(e) => {
                return Ok(error_result(
                    "json_error",
                    &format!("module_details is not valid get_module_details output: {}", e),
                ));
            }
        };

        let code = provider_code(&params.0.provider).to_string();
        let version = if details.current_version.is_empty() {
            "latest".to_string()
        } else {
            details.current_version.clone()
        };
        let organization = if self.config.registry.organization.is_empty() {
            details.organization.clone()
        } else {
            self.config.registry.organization.clone()
        };

        match scaffold::write_scaffold(
            repo_path,
            &organization,
            &params.0.module_name,
            &code,
            &version,
            &details.input_variables,
            &details.output_variables,
        ) {
            Ok(report) => Ok(success_result(&report)),
            Err(e) => {
                error!(error = %e, "scaffold write failed");
                let text = serde_json::to_string_pretty(&serde_json::json!({
                    "success": false,
                    "error": "write_error",
                    "message": e.to_string(),
                    "created_files": e.created_files(),
                }))
                .unwrap_or_default();
                Ok(CallToolResult::error(vec![Content::text(text)]))
            }
        }
    }
}

// The ServerHandler trait requires this specific impl Future pattern
#[allow(clippy::manual_async_fn)]
impl ServerHandler for ScaffoldServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                resources: Some(ResourcesCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "tfscaffold".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "tfscaffold queries a private Terraform module registry and writes ready-to-review Terraform scaffolds into infrastructure config repositories.".into(),
            ),
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            Ok(ListResourcesResult {
                resources: vec![Annotated {
                    raw: RawResource {
                        uri: "tfscaffold://scaffold-layout".into(),
                        name: "Scaffold Layout Guide".into(),
                        description: Some(
                            "Layout and conventions of the generated Terraform scaffold".into(),
                        ),
                        mime_type: Some("text/markdown".into()),
                        title: None,
                        size: None,
                        icons: None,
                        meta: None,
                    },
                    annotations: None,
                }],
                ..Default::default()
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let content = match request.uri.as_str() {
                "tfscaffold://scaffold-layout" => SCAFFOLD_LAYOUT_GUIDE,
                _ => {
                    return Err(McpError::resource_not_found(
                        format!("Unknown resource: {}", request.uri),
                        None,
                    ));
                }
            };

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, request.uri)],
            })
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self.tool_router.list_all();
            Ok(ListToolsResult {
                tools,
                ..Default::default()
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let tool_context =
                rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
            self.tool_router.call(tool_context).await
        }
    }
}
