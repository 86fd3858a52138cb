use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    core::{
        band::{Band, BandTable},
        series,
        slot::Slot,
    },
    prelude::*,
};

/// One renderable position, rebuilt from scratch on every render pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayUnit {
    /// Pixel or bar index, `0..capacity`.
    pub index: usize,

    pub start_time: DateTime<Utc>,

    /// The slot value, or the group mean when slots are aggregated.
    pub value: f64,

    pub band: Band,

    /// Which input slots this unit stands for.
    pub source_slots: Range<usize>,
}

/// Aggregate, classify, and lay out the slots over at most `capacity`
/// positions in chronological order.
///
/// Fewer slots than positions is a degraded state, not an error: the display
/// simply keeps dark pixels at the end. Excess slots are dropped silently.
pub fn map_to_display(
    slots: &[Slot],
    bands: &BandTable,
    capacity: usize,
    slots_per_unit: usize,
) -> Result<Vec<DisplayUnit>> {
    let aggregated = series::aggregate(slots, slots_per_unit);
    if aggregated.len() < capacity {
        warn!("not enough data to fill the display - we will get dark pixels");
    }
    aggregated
        .iter()
        .take(capacity)
        .enumerate()
        .map(|(index, slot)| {
            let band = bands.classify(slot.value)?.clone();
            let source_start = index * slots_per_unit;
            Ok(DisplayUnit {
                index,
                start_time: slot.start_time,
                value: slot.value,
                band,
                source_slots: source_start..slots.len().min(source_start + slots_per_unit),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{band::tests::agile_bands, mode::Mode, slot::tests::price_slots};

    fn slots(prices: &[f64]) -> Vec<Slot> {
        crate::core::slot::select_metric(&price_slots(prices), Mode::AgileImport)
    }

    #[test]
    fn test_truncates_to_capacity() -> Result {
        let slots = slots(&vec![12.0; 20]);
        let units = map_to_display(&slots, &agile_bands(), 8, 1)?;
        assert_eq!(units.len(), 8);
        assert_eq!(units[0].start_time, slots[0].start_time);
        assert_eq!(units[7].start_time, slots[7].start_time);
        Ok(())
    }

    #[test]
    fn test_degrades_when_short_of_data() -> Result {
        let units = map_to_display(&slots(&[12.0, 3.0, -1.0]), &agile_bands(), 8, 1)?;
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].band.name, "orange");
        assert_eq!(units[1].band.name, "cyan");
        assert_eq!(units[2].band.name, "blue");
        Ok(())
    }

    #[test]
    fn test_aggregated_units_track_source_slots() -> Result {
        let units = map_to_display(&slots(&[10.0, 20.0, 30.0]), &agile_bands(), 8, 2)?;
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].value, 15.0);
        assert_eq!(units[0].source_slots, 0..2);
        assert_eq!(units[1].value, 30.0);
        assert_eq!(units[1].source_slots, 2..3);
        Ok(())
    }

    /// Identical snapshots must render to identical frames.
    #[test]
    fn test_render_pass_is_deterministic() -> Result {
        let slots = slots(&[5.5, 11.0, 29.0, -2.0, 8.0, 14.0, 18.0, 31.0, 2.0]);
        let bands = agile_bands();
        let first = map_to_display(&slots, &bands, 8, 1)?;
        let second = map_to_display(&slots, &bands, 8, 1)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_empty_input_is_not_an_error() -> Result {
        assert!(map_to_display(&[], &agile_bands(), 8, 1)?.is_empty());
        Ok(())
    }
}
