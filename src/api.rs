pub mod agile;
pub mod carbon;
pub mod client;

use async_trait::async_trait;

use crate::{core::slot::SlotRecord, prelude::*};

/// A public time-series API the indicator can track.
#[async_trait]
pub trait DataSource {
    /// Fetch the upcoming readings, in chronological order.
    async fn fetch(&self) -> Result<Vec<SlotRecord>>;
}
