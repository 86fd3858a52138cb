use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::core::slot::Slot;

impl<T> Mean for T where T: ?Sized {}

pub trait Mean {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    fn mean(self) -> Option<f64>
    where
        Self: Sized + Iterator<Item = f64>,
    {
        let (sum, count) = self.fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
        (count != 0).then(|| sum / count as f64)
    }
}

/// Collapse consecutive groups of `group_size` slots into one synthetic slot:
/// the first member's timestamp and the group mean rounded to one decimal.
/// The final group may be shorter when the input is not an exact multiple.
pub fn aggregate(slots: &[Slot], group_size: usize) -> Vec<Slot> {
    assert!(group_size != 0, "group size must be positive");
    slots
        .iter()
        .chunks(group_size)
        .into_iter()
        .map(|chunk| {
            let chunk = chunk.collect_vec();
            let mean = chunk.iter().map(|slot| slot.value).mean().unwrap();
            Slot { start_time: chunk[0].start_time, value: (mean * 10.0).round() / 10.0 }
        })
        .collect()
}

/// Means of every `window`-sized run of consecutive values, for start
/// indices `0..len - window - 1`.
///
/// Note that this is one window short of the maximal count: the original
/// device firmware behaved this way and the extremum reports are tuned to
/// it, so it is kept as is.
pub fn rolling_means(values: &[f64], window: usize) -> Vec<f64> {
    let n_windows = values.len().saturating_sub(window + 1);
    (0..n_windows).map(|start| values[start..start + window].iter().copied().mean().unwrap()).collect()
}

/// Index of the first occurrence of the smallest value.
pub fn position_min(values: &[f64]) -> Option<usize> {
    values.iter().copied().map(OrderedFloat).position_min()
}

/// Index of the first occurrence of the largest value.
pub fn position_max(values: &[f64]) -> Option<usize> {
    values.iter().copied().map(OrderedFloat).position_max()
}
