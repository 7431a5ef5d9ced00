//! Serves `GET /ping` on `:8099` until a fatal error.

use log::error;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server = serveopt::bootstrap::server();
    if let Err(e) = server.listen_and_serve().await {
        error!("{e}");
        std::process::exit(1);
    }
}
