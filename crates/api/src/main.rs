#[tokio::main]
async fn main() -> anyhow::Result<()> {
    catsync_api::telemetry::init();

    let config = catsync_api::config::ApiConfig::from_env();
    let state = catsync_api::app::build_state(&config).await?;
    catsync_api::scheduler::spawn(state.clone(), &config);
    let app = catsync_api::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
