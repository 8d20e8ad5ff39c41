use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mock_server::{Auth, Store};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let auth = Auth {
        signature: std::env::var("YOURLS_SIGNATURE").ok(),
        username: std::env::var("YOURLS_USERNAME").ok(),
        password: std::env::var("YOURLS_PASSWORD").ok(),
    };
    let store = Store::new(auth, &format!("http://{addr}"));

    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    mock_server::run(listener, mock_server::db(store)).await
}
