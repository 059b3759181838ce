//! MCP service implementation using rmcp.
//!
//! This module defines the DbService struct exposing the `mysql_query` tool
//! and the table schema resources via the MCP protocol using the rmcp
//! framework's macros.

use crate::db::ConnectionPool;
use crate::resources::{SCHEMA_MIME_TYPE, SchemaResourceHandler};
use crate::tools::query::{QueryInput, QueryToolHandler};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
        PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct DbService {
    /// Handler for the read-only query tool
    query_handler: Arc<QueryToolHandler<ConnectionPool>>,
    /// Handler for table schema resources
    schema_resources: Arc<SchemaResourceHandler<ConnectionPool>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DbService {
    /// Create a new DbService instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared connection pool for all database operations
    /// * `authority` - `host:port` used in resource URIs
    pub fn new(pool: Arc<ConnectionPool>, authority: impl Into<String>) -> Self {
        Self {
            query_handler: Arc::new(QueryToolHandler::new(pool.clone())),
            schema_resources: Arc::new(SchemaResourceHandler::new(pool, authority)),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl DbService {
    #[tool(
        name = "mysql_query",
        description = "Run a read-only MySQL query"
    )]
    async fn mysql_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let text = self
            .query_handler
            .query_text(input)
            .await
            .map_err(McpError::from)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to a MySQL database.\n\
                \n\
                ## Resources\n\
                Each table in the current database is listed as `mysql://<host>:<port>/<table>/schema`.\n\
                Reading it returns the table's columns as JSON: `[{\"column_name\", \"data_type\"}]`.\n\
                \n\
                ## Tools\n\
                - `mysql_query`: run one SQL statement and get the rows back as a JSON array.\n\
                  The statement runs in a read-only transaction that is always rolled back,\n\
                  so INSERT/UPDATE/DELETE/DDL fail with a read-only error."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .schema_resources
            .list()
            .await
            .map_err(McpError::from)?
            .into_iter()
            .map(|resource| {
                let mut raw = RawResource::new(resource.uri, resource.name);
                raw.mime_type = Some(SCHEMA_MIME_TYPE.to_string());
                raw.description = Some(format!("Columns of table {}", resource.table));
                raw.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let contents = self
            .schema_resources
            .read(&request.uri)
            .await
            .map_err(McpError::from)?;

        let mut text = ResourceContents::text(contents.text, contents.uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut text {
            *mime_type = Some(SCHEMA_MIME_TYPE.to_string());
        }

        Ok(ReadResourceResult {
            contents: vec![text],
        })
    }
}
