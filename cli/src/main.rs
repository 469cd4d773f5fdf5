//! worldedit command-line tool
//!
//! Usage:
//!   worldedit info worldsector_0.data.fcb.converted.xml
//!   worldedit copy sector.xml Foo Bar --out clip.json
//!   worldedit paste sector.xml --from clip.json --at 100,50,0
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use worldedit_cli::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut stdout = std::io::stdout().lock();
    run(cli, &mut stdout)
}
