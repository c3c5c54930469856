use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use nmapscope::app::{self, Console};
use nmapscope::cli::Cli;
use nmapscope::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load();
    let mut console = Console::new(std::io::stdout(), std::io::stderr(), cli.is_json());

    let code = match app::run(&cli, &config, &mut console).await {
        Ok(code) => code,
        Err(e) => {
            println!("\n{} {}", "❌ Scan failed:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "nmapscope=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
