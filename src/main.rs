use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;

mod audit;
mod gsc;
mod output;
mod report;
mod sitemap;
mod telemetry;
mod util;

#[derive(Parser)]
#[command(name = "gscw", about = "Sitemap indexation audit against Google Search Console")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Audit(audit::AuditCmd),
    Sitemap(sitemap::SitemapCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs go to stderr; respects RUST_LOG and GSCW_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Audit(args) => audit::run(args).await?,
        Commands::Sitemap(args) => sitemap::run(args).await?,
    }

    Ok(())
}
