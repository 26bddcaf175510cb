use anyhow::Context;

use studyplanner::{app, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let app_state = AppState::init().await?;

    // Doubles as the connectivity check: nothing is served until the schema is in place.
    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run migrations")?;
    tracing::info!(environment = ?app_state.config.environment, "database ready");

    let host = app_state.config.host.clone();
    let port = app_state.config.port;
    let router = app::build_app(app_state);
    app::serve(router, &host, port).await
}
