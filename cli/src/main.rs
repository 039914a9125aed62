use clap::Parser;
use hrdash_cli::{Cli, default_log_filter};

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(default_log_filter(cli.global.verbose))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("hrdash v{} starting", hrdash_cli::VERSION);

    std::process::exit(cli.run());
}
