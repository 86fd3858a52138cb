mod demo;
mod show;
mod update;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::{demo::demo, show::show, update::update};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Path to the configuration file.
    #[clap(long, env = "ECO_INDICATOR_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to the readings database.
    #[clap(long, env = "ECO_INDICATOR_DATABASE", default_value = "eco_indicator.sqlite")]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the upcoming readings from the API, store them, and prune old rows.
    #[clap(name = "update")]
    Update(UpdateArgs),

    /// Compute the display frame from the stored readings and preview it.
    #[clap(name = "show")]
    Show(ShowArgs),

    /// Show the configured palette, one band per pixel.
    #[clap(name = "demo")]
    Demo,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Readings older than this many days are deleted after every update.
    #[clap(long, default_value = "2", env = "PRUNE_AGE_DAYS")]
    pub prune_age_days: i64,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Emit the frame as JSON for a display driver instead of the preview.
    #[clap(long)]
    pub json: bool,
}
