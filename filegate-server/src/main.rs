use anyhow::Result;
use filegate_server::ServerSettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ServerSettings::from_env();
    let ax = filegate_server::build(&settings)?;

    let addr = settings.addr();
    tracing::info!(public_url = %settings.files.public_url, "[filegate] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
