//! clauderock binary entry point.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let code = clauderock::cli::run(std::env::args().collect()).await;
    std::process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLAUDEROCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
