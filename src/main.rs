use planio_redmine_tools::config::Config;
use planio_redmine_tools::redmine_client::RedmineClient;
use planio_redmine_tools::server::PlanioServer;
use planio_redmine_tools::tools::RedmineTools;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let client = RedmineClient::new(&config)?;
    tracing::info!(base_url = %config.base_url, max_pages = config.max_pages, "Starting Plan.io MCP server");

    let server = PlanioServer::new(RedmineTools::new(client, config));
    let service = server
        .serve((tokio::io::stdin(), tokio::io::stdout()))
        .await?;
    service.waiting().await?;

    Ok(())
}
