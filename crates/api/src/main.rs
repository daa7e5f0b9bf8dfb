use anyhow::Context;

use stockledger_infra::LedgerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::load().context("loading configuration")?;
    stockledger_observability::init_with_level(&config.log_level);

    let bind = config.http.bind.clone();
    tracing::info!(
        approval_policy = ?config.approval_policy,
        apply_mode = ?config.apply_mode,
        "starting stock ledger"
    );
    let app = stockledger_api::app::build_app(config);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
