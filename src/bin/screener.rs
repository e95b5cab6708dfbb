//! Market screeners
//!
//! ```bash
//! cargo run --bin screener -- funding   # funding rate differentials
//! cargo run --bin screener -- movers    # top movers on one venue
//! ```
//!
//! Reads the `screener` section of the configuration file when present,
//! defaults otherwise.
//!
//! # Logging
//! - Uses LOG_FORMAT env var: `json` (default) or `pretty`

use anyhow::{bail, Context};
use tracing::info;

use spread_paper::adapters::create_market_data;
use spread_paper::config::{self, ScreenerConfig};
use spread_paper::screener::{format_funding_table, format_movers, funding_table, top_movers};

const USAGE: &str = "usage: screener <funding|movers>";

fn load_screener_config() -> anyhow::Result<ScreenerConfig> {
    let path = config::config_path();
    if !path.exists() {
        info!(path = %path.display(), "[CONFIG] No configuration file, using screener defaults");
        return Ok(ScreenerConfig::default());
    }
    let app_config = config::load_config(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(app_config.screener)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::init_logging();

    let command = std::env::args().nth(1).unwrap_or_default();
    let screener = load_screener_config()?;
    screener.validate()?;

    match command.as_str() {
        "funding" => {
            let clients: Vec<_> = screener
                .exchanges
                .iter()
                .map(|exchange| create_market_data(*exchange))
                .collect();
            let rows = funding_table(&clients, &screener.symbols).await;
            print!("{}", format_funding_table(&rows));
        }
        "movers" => {
            let movers = &screener.movers;
            let client = create_market_data(movers.exchange);
            let scores = top_movers(&client, &movers.timeframe, movers.limit, movers.top)
                .await
                .with_context(|| format!("Movers scan on {} failed", movers.exchange))?;
            print!("{}", format_movers(&scores));
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }

    Ok(())
}
