//! Exchange connection used by the rebalancer runtime.

use driftbook_broker::Exchange;
use driftbook_broker::bitkub::BitkubExchange;
use log::info;

use crate::config::Config;
use crate::error::Result;

/// Build the Bitkub exchange handle described by `config`.
///
/// No request is made here; credentials are first exercised by the
/// first wallet call of the first cycle.
pub fn connect_bitkub(config: &Config) -> Result<Box<dyn Exchange>> {
    info!("Using Bitkub API at {}", config.api_url);
    let exchange = BitkubExchange::new(
        &config.api_key,
        &config.api_secret,
        &config.api_url,
        config.request_timeout(),
    )?;
    Ok(Box::new(exchange))
}
