use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData as McpError, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ToolError;
use crate::redmine_client::RedmineClient;
use crate::tools::{ProjectScope, RedmineTools};

const INSTRUCTIONS: &str = "Read-only access to a Plan.io / Redmine tracker. \
Use get_assigned_issues for your own work, get_issue_details for the full history of one issue, \
search_issues_by_keyword for full-text search, search_issues_by_assignee and get_issues_by_tracker \
for filtered listings, and get_issue_hours_booked for time spent.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IssueIdParams {
    /// Numeric issue id (e.g. 1234)
    pub issue_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AssigneeSearchParams {
    /// Login or name to look up; ignored when user_id is given
    pub username: Option<String>,
    /// Numeric user id
    pub user_id: Option<u64>,
    /// Earliest creation date, YYYY-MM-DD
    pub start_date: Option<String>,
    /// Latest creation date, YYYY-MM-DD
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KeywordSearchParams {
    /// Text to search for across all projects
    pub keyword: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TrackerIssuesParams {
    /// Tracker name, matched case-insensitively (e.g. "Bug")
    pub tracker_name: String,
    /// Numeric project id; takes precedence over project_name
    pub project_id: Option<u64>,
    /// Project identifier
    pub project_name: Option<String>,
}

/// Plan.io MCP server.
#[derive(Clone)]
pub struct PlanioServer {
    tools: Arc<RedmineTools<RedmineClient>>,
    tool_router: ToolRouter<Self>,
}

fn to_mcp_error(tool: &str, err: ToolError) -> McpError {
    error!(tool, error = %err, "Tool call failed");
    McpError::internal_error(err.to_string(), None)
}

pub fn to_json_text<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(to_json_text(value)?)]))
}

impl PlanioServer {
    pub fn new(tools: RedmineTools<RedmineClient>) -> Self {
        Self {
            tools: Arc::new(tools),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl PlanioServer {
    #[tool(description = "Retrieve issues assigned to the authenticated user (any status). Returns only the first page the tracker serves.")]
    pub async fn get_assigned_issues(&self) -> Result<CallToolResult, McpError> {
        info!("get_assigned_issues");
        let issues = self
            .tools
            .get_assigned_issues()
            .await
            .map_err(|e| to_mcp_error("get_assigned_issues", e))?;
        json_result(&issues)
    }

    #[tool(description = "Get full details of one issue including journals (comments and changes), attachments, custom fields, relations, watchers and child issues.")]
    pub async fn get_issue_details(
        &self,
        Parameters(params): Parameters<IssueIdParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(issue_id = params.issue_id, "get_issue_details");
        let detail = self
            .tools
            .get_issue_details(params.issue_id)
            .await
            .map_err(|e| to_mcp_error("get_issue_details", e))?;
        json_result(&detail)
    }

    #[tool(description = "List all issues assigned to a user, given a username or user_id, optionally limited to issues created between start_date and end_date (YYYY-MM-DD).")]
    pub async fn search_issues_by_assignee(
        &self,
        Parameters(params): Parameters<AssigneeSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(?params, "search_issues_by_assignee");
        let response = self
            .tools
            .search_issues_by_assignee(
                params.username.as_deref(),
                params.user_id,
                params.start_date.as_deref(),
                params.end_date.as_deref(),
            )
            .await
            .map_err(|e| to_mcp_error("search_issues_by_assignee", e))?;
        json_result(&response)
    }

    #[tool(description = "Full-text search for issues across all projects. Wiki pages, documents and other non-issue hits are left out.")]
    pub async fn search_issues_by_keyword(
        &self,
        Parameters(params): Parameters<KeywordSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(keyword = %params.keyword, "search_issues_by_keyword");
        let hits = self
            .tools
            .search_issues_by_keyword(&params.keyword)
            .await
            .map_err(|e| to_mcp_error("search_issues_by_keyword", e))?;
        json_result(&hits)
    }

    #[tool(description = "List all issues of a tracker (e.g. Bug, Feature), optionally scoped to a project by id or identifier.")]
    pub async fn get_issues_by_tracker(
        &self,
        Parameters(params): Parameters<TrackerIssuesParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(?params, "get_issues_by_tracker");
        let scope = ProjectScope::from_params(params.project_id, params.project_name);
        let response = self
            .tools
            .get_issues_by_tracker(&params.tracker_name, scope)
            .await
            .map_err(|e| to_mcp_error("get_issues_by_tracker", e))?;
        json_result(&response)
    }

    #[tool(description = "Sum the hours booked on an issue across all of its time entries.")]
    pub async fn get_issue_hours_booked(
        &self,
        Parameters(params): Parameters<IssueIdParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(issue_id = params.issue_id, "get_issue_hours_booked");
        let aggregate = self
            .tools
            .get_issue_hours_booked(params.issue_id)
            .await
            .map_err(|e| to_mcp_error("get_issue_hours_booked", e))?;
        json_result(&aggregate)
    }
}

#[tool_handler]
impl ServerHandler for PlanioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}
