use chrono::Local;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::core::{
    band::{BandTable, Rgb},
    display::DisplayUnit,
    mode::Mode,
    trend::{Annotations, TrackerOutlook, TrendSymbol},
};

const fn band_color(colour: Rgb) -> Color {
    Color::Rgb { r: colour.r, g: colour.g, b: colour.b }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

/// Render the pixel frame as the LED strip would show it.
#[must_use]
pub fn build_frame_table(units: &[DisplayUnit], mode: Mode) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Pixel", "From", "Value", "Band"]);
    for unit in units {
        table.add_row(vec![
            Cell::new(unit.index),
            Cell::new(unit.start_time.with_timezone(&Local).format("%H:%M"))
                .add_attribute(Attribute::Dim),
            Cell::new(mode.format_value(unit.value)).set_alignment(CellAlignment::Right),
            Cell::new(&unit.band.name).fg(band_color(unit.band.colour)),
        ]);
    }
    table
}

/// Render the e-paper annotations.
#[must_use]
pub fn build_annotations_table(annotations: &Annotations, mode: Mode) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "Value", "When"]);

    table.add_row(vec![
        Cell::new(mode.descriptor()),
        Cell::new(mode.format_value(annotations.current.value))
            .add_attribute(Attribute::Bold)
            .fg(if annotations.current_is_high { Color::Red } else { Color::Reset }),
        Cell::new(annotations.current.start_time.with_timezone(&Local).format("%H:%M")),
    ]);

    let mut minutes = annotations.minutes_until_next_slot.unwrap_or_default();
    for slot in &annotations.upcoming {
        table.add_row(vec![
            Cell::new(format!("+{minutes}:")).set_alignment(CellAlignment::Right),
            Cell::new(mode.format_value(slot.value)).set_alignment(CellAlignment::Right),
            Cell::new(slot.start_time.with_timezone(&Local).format("%H:%M"))
                .add_attribute(Attribute::Dim),
        ]);
        minutes += 30;
    }

    if let Some(window) = &annotations.lowest_window {
        table.add_row(vec![
            Cell::new(format!("Lowest {}h", window.duration_hours())),
            Cell::new(mode.format_value(window.mean)).fg(Color::Green),
            Cell::new(window.start_label()),
        ]);
    }
    if let Some(window) = &annotations.highest_window {
        table.add_row(vec![
            Cell::new(format!("Highest {}h", window.duration_hours())),
            Cell::new(mode.format_value(window.mean)).fg(Color::Red),
            Cell::new(window.start_label()),
        ]);
    }
    if let Some(average) = annotations.average_excluding_peaks {
        table.add_row(vec![
            Cell::new("Average excl. peaks"),
            Cell::new(mode.format_value(average)),
            Cell::new(""),
        ]);
    }
    table
}

/// Render the Tracker today/tomorrow outlook.
#[must_use]
pub fn build_tracker_table(outlook: &TrackerOutlook) -> Table {
    fn symbol_cell(symbol: Option<TrendSymbol>) -> Cell {
        match symbol {
            Some(symbol) if symbol.emphasized => Cell::new(symbol).fg(Color::Red),
            Some(symbol) => Cell::new(symbol),
            None => Cell::new("No data yet."),
        }
    }

    let mut table = new_table();
    table.set_header(vec!["", "Today", "Tomorrow", ""]);
    table.add_row(vec![
        Cell::new("Elec"),
        Cell::new(format!("{:.1}p", outlook.electricity_today)).add_attribute(Attribute::Bold),
        Cell::new(
            outlook
                .electricity_tomorrow
                .map_or_else(|| "No data yet.".to_string(), |price| format!("{price:.1}p")),
        ),
        symbol_cell(outlook.electricity_symbol()),
    ]);
    table.add_row(vec![
        Cell::new("Gas"),
        Cell::new(format!("{:.1}p", outlook.gas_today)).add_attribute(Attribute::Bold),
        Cell::new(
            outlook
                .gas_tomorrow
                .map_or_else(|| "No data yet.".to_string(), |price| format!("{price:.1}p")),
        ),
        symbol_cell(outlook.gas_symbol()),
    ]);
    table
}

/// Render the configured palette, one row per band, for the demo mode.
#[must_use]
pub fn build_bands_table(bands: &BandTable) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Band", "Above", "Colour"]);
    for band in bands.iter() {
        table.add_row(vec![
            Cell::new(&band.name),
            Cell::new(band.above.map_or_else(|| "catch-all".to_string(), |above| above.to_string()))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} {} {}", band.colour.r, band.colour.g, band.colour.b))
                .fg(band_color(band.colour)),
        ]);
    }
    table
}
