use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{core::mode::Mode, prelude::*};

/// One stored half-hourly reading.
///
/// Only the metric matching the configured [`Mode`] is relevant,
/// the other columns stay empty. Missing data is represented by
/// absent rows or `None`, never by sentinel values.
#[derive(Clone, Debug, PartialEq, bon::Builder)]
pub struct SlotRecord {
    /// Slot start time. Slots are 30 minutes long.
    pub start_time: DateTime<Utc>,

    #[builder(into)]
    pub price: Option<f64>,

    #[builder(into)]
    pub export_price: Option<f64>,

    #[builder(into)]
    pub carbon_intensity: Option<f64>,

    #[builder(into)]
    pub gas_price: Option<f64>,
}

impl SlotRecord {
    pub const fn metric(&self, mode: Mode) -> Option<f64> {
        match mode {
            Mode::AgileImport | Mode::Tracker => self.price,
            Mode::AgileExport => self.export_price,
            Mode::Carbon => self.carbon_intensity,
        }
    }
}

/// A slot with its active metric already selected,
/// the unit the rest of the pipeline works on.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub value: f64,
}

/// Select the active metric from each record, stopping at the first record
/// that lacks it. The storage is trusted to return a contiguous window, so
/// anything after a missing value would be an interior hole.
pub fn select_metric(records: &[SlotRecord], mode: Mode) -> Vec<Slot> {
    let slots: Vec<Slot> = records
        .iter()
        .map_while(|record| {
            record.metric(mode).map(|value| Slot { start_time: record.start_time, value })
        })
        .collect();
    if slots.len() < records.len() {
        warn!(
            n_records = records.len(),
            n_selected = slots.len(),
            "some records are missing the {mode:?} metric",
        );
    }
    slots
}

#[cfg(test)]
pub mod tests {
    use chrono::TimeDelta;

    use super::*;

    /// Build a contiguous half-hourly price series starting at an arbitrary instant.
    pub fn price_slots(prices: &[f64]) -> Vec<SlotRecord> {
        let start = DateTime::from_timestamp(1_700_000_400, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(index, price)| {
                SlotRecord::builder()
                    .start_time(start + TimeDelta::minutes(30 * index as i64))
                    .price(*price)
                    .build()
            })
            .collect()
    }

    #[test]
    fn test_metric_follows_mode() {
        let record = SlotRecord::builder().start_time(Utc::now()).price(12.5).build();
        assert_eq!(record.metric(Mode::AgileImport), Some(12.5));
        assert_eq!(record.metric(Mode::AgileExport), None);
        assert_eq!(record.metric(Mode::Carbon), None);
    }

    #[test]
    fn test_select_metric_stops_at_missing() {
        let mut records = price_slots(&[10.0, 20.0]);
        records[1].price = None;
        let slots = select_metric(&records, Mode::AgileImport);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].value, 10.0);
    }
}
