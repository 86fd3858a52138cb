use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, TimeDelta, Utc};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::{
    core::{
        series::{self, Mean},
        slot::{Slot, SlotRecord},
    },
    prelude::*,
};

/// Day-on-day movement symbol, as drawn next to tomorrow's price.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TrendSymbol {
    pub direction: Direction,

    /// A move of 10% or more is drawn doubled and in the highlight colour.
    pub emphasized: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Direction {
    Flat,
    Up,
    Down,
}

impl TrendSymbol {
    /// Bucket the relative change from today's to tomorrow's value.
    ///
    /// A zero reference value would make the relative change meaningless,
    /// so it maps to the flat symbol with a warning instead of faulting.
    pub fn new(today: f64, tomorrow: f64) -> Self {
        if today == 0.0 {
            warn!("today's value is zero, cannot compute a relative change");
            return Self { direction: Direction::Flat, emphasized: false };
        }
        let change = (tomorrow - today) / today;
        let direction = if change == 0.0 {
            Direction::Flat
        } else if change > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };
        Self { direction, emphasized: change.abs() >= 0.1 }
    }
}

impl Display for TrendSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = match (self.direction, self.emphasized) {
            (Direction::Flat, _) => "-",
            (Direction::Up, false) => "^",
            (Direction::Up, true) => "^^",
            (Direction::Down, false) => "v",
            (Direction::Down, true) => "vv",
        };
        write!(f, "( {inner} )")
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Extremum {
    Min,
    Max,
}

/// The cheapest or priciest rolling window of the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowStat {
    pub start_index: usize,
    pub start_time: DateTime<Utc>,
    pub n_slots: usize,
    pub mean: f64,
}

impl WindowStat {
    /// Find the extremum among all rolling `n_slots`-sized window means.
    /// Ties resolve to the earliest window.
    pub fn find(slots: &[Slot], n_slots: usize, extremum: Extremum) -> Option<Self> {
        let values = slots.iter().map(|slot| slot.value).collect_vec();
        let means = series::rolling_means(&values, n_slots);
        let start_index = match extremum {
            Extremum::Min => series::position_min(&means)?,
            Extremum::Max => series::position_max(&means)?,
        };
        Some(Self {
            start_index,
            start_time: slots[start_index].start_time,
            n_slots,
            mean: means[start_index],
        })
    }

    /// `"now"` when the window starts at the current slot,
    /// the local clock time otherwise.
    pub fn start_label(&self) -> String {
        if self.start_index == 0 {
            "now".to_string()
        } else {
            self.start_time.with_timezone(&Local).format("%H:%M").to_string()
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn duration_hours(&self) -> f64 {
        self.n_slots as f64 / 2.0
    }
}

/// Mean of the snapshot with the six highest readings dropped, so a couple of
/// evening peak slots do not drag the dashed average line upwards.
pub fn average_excluding_peaks(slots: &[Slot]) -> Option<f64> {
    const N_PEAKS: usize = 6;
    slots
        .iter()
        .map(|slot| OrderedFloat(slot.value))
        .sorted_unstable()
        .rev()
        .skip(N_PEAKS)
        .map(OrderedFloat::into_inner)
        .mean()
}

/// Scalar annotations for the e-paper layout, computed once per render pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotations {
    pub current: Slot,

    /// Whether the current value exceeds the configured high threshold,
    /// which switches the border and the big number to the highlight colour.
    pub current_is_high: bool,

    /// Up to the next three slots.
    pub upcoming: Vec<Slot>,

    pub minutes_until_next_slot: Option<i64>,

    pub lowest_window: Option<WindowStat>,
    pub highest_window: Option<WindowStat>,

    pub average_excluding_peaks: Option<f64>,
}

impl Annotations {
    #[instrument(skip_all, fields(n_slots = slots.len()))]
    pub fn compute(
        slots: &[Slot],
        high_value: f64,
        window_slots: usize,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let current = *slots.first().context("no data to annotate")?;
        let minutes_until_next_slot =
            slots.get(1).map(|next| minutes_until(now, next.start_time));
        Ok(Self {
            current,
            current_is_high: current.value > high_value,
            upcoming: slots.iter().skip(1).take(3).copied().collect(),
            minutes_until_next_slot,
            lowest_window: WindowStat::find(slots, window_slots, Extremum::Min),
            highest_window: WindowStat::find(slots, window_slots, Extremum::Max),
            average_excluding_peaks: average_excluding_peaks(slots),
        })
    }
}

fn minutes_until(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    let seconds = (then - now).num_seconds();
    seconds.div_euclid(60) + i64::from(seconds.rem_euclid(60) != 0)
}

/// Today-versus-tomorrow outlook for the daily Tracker tariff.
///
/// Tracker rows are daily rather than half-hourly: the first row is the most
/// recent one and may already belong to tomorrow, in which case the second
/// row holds today's prices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackerOutlook {
    pub electricity_today: f64,
    pub gas_today: f64,
    pub electricity_tomorrow: Option<f64>,
    pub gas_tomorrow: Option<f64>,
}

impl TrackerOutlook {
    pub fn try_new(records: &[SlotRecord], now: DateTime<Utc>) -> Result<Self> {
        let latest = records.first().context("no tracker data")?;
        // Tracker prices are published against midnight, nudge to mid-day
        // before comparing dates to dodge daylight-saving wobbles.
        let latest_date = (latest.start_time + TimeDelta::hours(12)).date_naive();
        let days_ahead = (latest_date - now.date_naive()).num_days();
        match days_ahead {
            0 => Ok(Self {
                electricity_today: latest.price.context("missing today's electricity price")?,
                gas_today: latest.gas_price.context("missing today's gas price")?,
                electricity_tomorrow: None,
                gas_tomorrow: None,
            }),
            1 => {
                let today = records.get(1).context("missing today's tracker row")?;
                let outlook = Self {
                    electricity_today: today.price.context("missing today's electricity price")?,
                    gas_today: today.gas_price.context("missing today's gas price")?,
                    electricity_tomorrow: latest.price,
                    gas_tomorrow: latest.gas_price,
                };
                ensure!(
                    outlook.electricity_tomorrow.is_some() || outlook.gas_tomorrow.is_some(),
                    "there is a row for tomorrow but it holds no valid data",
                );
                Ok(outlook)
            }
            _ => bail!("impossible date difference of {days_ahead} days"),
        }
    }

    pub fn electricity_symbol(&self) -> Option<TrendSymbol> {
        self.electricity_tomorrow
            .map(|tomorrow| TrendSymbol::new(self.electricity_today, tomorrow))
    }

    pub fn gas_symbol(&self) -> Option<TrendSymbol> {
        self.gas_tomorrow.map(|tomorrow| TrendSymbol::new(self.gas_today, tomorrow))
    }
}
