use chrono::{TimeDelta, Utc};

use crate::{
    api::{DataSource, agile, carbon},
    cli::UpdateArgs,
    config::Config,
    core::mode::Mode,
    db::Db,
    prelude::*,
};

/// Fetch the upcoming readings and refresh the database.
#[instrument(skip_all)]
pub async fn update(config: &Config, db: &Db, args: &UpdateArgs) -> Result {
    let source: Box<dyn DataSource> = match config.mode {
        Mode::AgileImport | Mode::AgileExport => {
            Box::new(agile::Api::try_new(config.mode, config.region)?)
        }
        Mode::Carbon => Box::new(carbon::Api::try_new(config.region)?),
        Mode::Tracker => bail!("the Tracker data source is not implemented yet"),
    };

    let records = source.fetch().await?;
    if records.is_empty() {
        warn!("no readings were fetched - maybe the provider is late with their update");
    } else {
        db.upsert(&records)?;
    }

    ensure!(args.prune_age_days > 0, "the prune age must be positive");
    db.prune(Utc::now(), TimeDelta::days(args.prune_age_days))?;
    Ok(())
}
