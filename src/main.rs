mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod recipes;
mod state;
mod validation;

#[cfg(test)]
mod test_utils;

use crate::{auth::events::EventSender, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipe_catalog=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let addr = config.listen_addr()?;

    let db = db::connect(&config).await?;
    db::migrate(&db).await?;

    let (events, rx) = EventSender::channel();
    auth::events::spawn_listener(rx);

    let seed_path = config.seed_recipes_path.clone();
    let state = AppState::postgres(config, db, events);

    if let Some(path) = seed_path {
        if let Err(e) = recipes::seed::seed_if_empty(state.recipes.as_ref(), &path).await {
            tracing::warn!(error = ?e, "recipe seeding failed; continuing");
        }
    }

    app::serve(app::build_app(state), addr).await
}
