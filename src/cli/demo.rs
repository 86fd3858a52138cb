use crate::{config::Config, prelude::*, tables::build_bands_table};

/// Preview the configured palette without touching the database.
#[instrument(skip_all)]
pub fn demo(config: &Config) -> Result {
    info!(n_bands = config.bands.len(), "colour levels found in the configuration");
    println!("{}", build_bands_table(&config.bands));
    Ok(())
}
