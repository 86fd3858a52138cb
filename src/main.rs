#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod config;
mod core;
mod db;
mod prelude;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    config::Config,
    db::Db,
    prelude::*,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let config = Config::read_from(&args.config)?;

    match args.command {
        Command::Update(update_args) => {
            let db = Db::open(&args.database)?;
            cli::update(&config, &db, &update_args).await?;
        }
        Command::Show(show_args) => {
            let db = Db::open(&args.database)?;
            cli::show(&config, &db, &show_args)?;
        }
        Command::Demo => {
            cli::demo(&config)?;
        }
    }

    info!("done!");
    Ok(())
}
