use anyhow::Context;
use tracing::{info, warn};

use puppetmaster_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    puppetmaster_observability::init(settings.log_format);

    if settings.jwt_secret_is_default {
        warn!("JWT_SECRET not set; using insecure dev default");
    }

    let app = puppetmaster_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
