use anyhow::Result;
use clap::Parser;
use fmlp_rec::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fmlp_rec=info".parse()?))
        .init();

    Cli::parse().run()
}
