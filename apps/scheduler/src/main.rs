use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use shared_config::AppConfig;

fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing; stdout is reserved for JSON output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting student affairs scheduler");

    // Load configuration
    let config = AppConfig::from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = match commands::run(&config, &args) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(err) => err.report(),
    };

    std::process::exit(code);
}
