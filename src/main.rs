//! folio - Render portfolio content from cache, database or defaults

use clap::Parser;

use folio::cli::{self, Cli};
use folio::config::SiteConfig;
use folio::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = SiteConfig::load(cli.config.as_deref())?;
    let guard = logging::init(&config.log)?;

    match cli::execute(&cli.command, &config).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            // flush file logs before exiting
            drop(guard);
            std::process::exit(1);
        }
    }
}
