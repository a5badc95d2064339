mod config;
mod frame;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");
    if config.operators.is_empty() {
        tracing::warn!("NOTICEBOARD_OPERATORS is unset; admin and editor logins are disabled");
    }
    let port = config.port;

    let state = state::AppState::from_config(config);
    let _sweeper = services::session::spawn_session_sweeper(state.clone());
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "noticeboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
