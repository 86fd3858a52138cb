use chrono::Utc;
use serde::Serialize;

use crate::{
    cli::ShowArgs,
    config::{BlinktConfig, Config, DisplayType, Orientation},
    core::{
        display::{DisplayUnit, map_to_display},
        mode::Mode,
        slot::select_metric,
        trend::{Annotations, TrackerOutlook},
    },
    db::Db,
    prelude::*,
    tables::{build_annotations_table, build_frame_table, build_tracker_table},
};

/// Everything a Blinkt! driver needs for one render pass.
#[derive(Serialize)]
struct BlinktFrame<'a> {
    brightness: u8,
    units: &'a [DisplayUnit],
}

/// Everything an Inky pHAT driver needs for one render pass.
#[derive(Serialize)]
struct InkyFrame<'a> {
    orientation: Orientation,
    units: &'a [DisplayUnit],
    annotations: &'a Annotations,
}

/// Compute the current frame from the stored readings and either preview it
/// in the terminal or hand it over to a display driver as JSON.
#[instrument(skip_all, fields(mode = ?config.mode, display = ?config.display))]
pub fn show(config: &Config, db: &Db, args: &ShowArgs) -> Result {
    let now = Utc::now();

    if config.mode == Mode::Tracker {
        // Tracker rows are daily, the half-hourly pipeline does not apply.
        let outlook = TrackerOutlook::try_new(&db.select_latest(2)?, now)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&outlook)?);
        } else {
            println!("{}", build_tracker_table(&outlook));
        }
        return Ok(());
    }

    let records = db.select_upcoming(now, config.inky.data_duration_slots())?;
    ensure!(!records.is_empty(), "no stored readings - run `update` first");
    let slots = select_metric(&records, config.mode);

    match config.display {
        DisplayType::Blinkt => {
            let units = map_to_display(
                &slots,
                &config.bands,
                BlinktConfig::CAPACITY,
                config.blinkt.slots_per_pixel,
            )?;
            for unit in &units {
                debug!(
                    index = unit.index,
                    band = %unit.band.name,
                    "{}",
                    config.mode.format_value(unit.value),
                );
            }
            if args.json {
                let frame = BlinktFrame { brightness: config.blinkt.brightness, units: &units };
                println!("{}", serde_json::to_string_pretty(&frame)?);
            } else {
                println!("{}", build_frame_table(&units, config.mode));
            }
        }

        DisplayType::InkyPhat => {
            let units =
                map_to_display(&slots, &config.bands, config.inky.data_duration_slots(), 1)?;
            let annotations =
                Annotations::compute(&slots, config.inky.high_value, config.inky.window_slots(), now)?;
            if args.json {
                let frame = InkyFrame {
                    orientation: config.inky.orientation,
                    units: &units,
                    annotations: &annotations,
                };
                println!("{}", serde_json::to_string_pretty(&frame)?);
            } else {
                println!("{}", build_annotations_table(&annotations, config.mode));
                println!("{}", build_frame_table(&units, config.mode));
            }
        }
    }
    Ok(())
}
