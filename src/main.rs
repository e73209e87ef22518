use std::net::SocketAddr;

use inkpress::run_app;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("listening on {}", addr);
    if let Err(error) = run_app(addr).await {
        tracing::error!("server error: {:#}", error);
    }
}
