use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use rusqlite::{Connection, params};

use crate::{
    core::{mode::Mode, slot::SlotRecord},
    prelude::*,
};

/// SQLite timestamp format: the built-in `datetime()` functions are picky.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The local half-hourly readings database.
///
/// One row per slot start time, one column per metric. Conflicting inserts
/// merge column-wise, so re-fetching the same window is a cheap upsert and
/// price and carbon readings can share a row.
pub struct Db(Connection);

impl Db {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open the database at `{}`", path.display()))?;
        Self::initialize(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> Result<Self> {
        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS eco (
                    valid_from TEXT PRIMARY KEY,
                    value_inc_vat REAL,
                    export REAL,
                    intensity REAL,
                    gas REAL
                )",
            )
            .context("failed to initialize the schema")?;
        Ok(Self(connection))
    }

    /// Upsert the fetched readings. Returns the number of affected rows.
    #[instrument(skip_all, fields(n_records = records.len()))]
    pub fn upsert(&self, records: &[SlotRecord]) -> Result<usize> {
        let mut statement = self.0.prepare(
            "INSERT INTO eco (valid_from, value_inc_vat, export, intensity, gas)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (valid_from) DO UPDATE SET
                value_inc_vat = coalesce(excluded.value_inc_vat, value_inc_vat),
                export = coalesce(excluded.export, export),
                intensity = coalesce(excluded.intensity, intensity),
                gas = coalesce(excluded.gas, gas)",
        )?;
        let mut n_rows = 0;
        for record in records {
            n_rows += statement.execute(params![
                record.start_time.format(TIMESTAMP_FORMAT).to_string(),
                record.price,
                record.export_price,
                record.carbon_intensity,
                record.gas_price,
            ])?;
        }
        info!(n_rows, "readings stored");
        Ok(n_rows)
    }

    /// Delete readings older than the given age, they would never be
    /// displayed again and the database must not grow forever.
    #[instrument(skip_all)]
    pub fn prune(&self, now: DateTime<Utc>, age: TimeDelta) -> Result<usize> {
        let cutoff = (now - age).format(TIMESTAMP_FORMAT).to_string();
        let n_rows = self
            .0
            .execute("DELETE FROM eco WHERE valid_from < ?1", [&cutoff])
            .context("failed to remove old readings")?;
        if n_rows > 0 {
            info!(n_rows, "unneeded data points from the past were deleted");
        } else {
            debug!("there were no old data points to delete");
        }
        Ok(n_rows)
    }

    /// Readings from the slot that is current at `now` onwards,
    /// in chronological order.
    #[instrument(skip_all)]
    pub fn select_upcoming(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<SlotRecord>> {
        let since = (now - TimeDelta::minutes(30)).format(TIMESTAMP_FORMAT).to_string();
        self.select(
            "SELECT valid_from, value_inc_vat, export, intensity, gas FROM eco
             WHERE valid_from > ?1 ORDER BY valid_from LIMIT ?2",
            params![since, i64::try_from(limit)?],
        )
    }

    /// The most recent readings first, as the Tracker outlook expects them.
    #[instrument(skip_all)]
    pub fn select_latest(&self, limit: usize) -> Result<Vec<SlotRecord>> {
        self.select(
            "SELECT valid_from, value_inc_vat, export, intensity, gas FROM eco
             ORDER BY valid_from DESC LIMIT ?1",
            params![i64::try_from(limit)?],
        )
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SlotRecord>> {
        let mut statement = self.0.prepare(sql)?;
        let records = statement
            .query_map(params, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read the stored readings")?
            .into_iter()
            .map(|(valid_from, price, export_price, carbon_intensity, gas_price)| {
                let start_time = NaiveDateTime::parse_from_str(&valid_from, TIMESTAMP_FORMAT)
                    .with_context(|| format!("bad timestamp in the database: `{valid_from}`"))?
                    .and_utc();
                Ok(SlotRecord { start_time, price, export_price, carbon_intensity, gas_price })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }
}

/// Build a reading carrying the active metric of the given mode.
pub fn record_for_mode(start_time: DateTime<Utc>, mode: Mode, value: f64) -> SlotRecord {
    let mut record = SlotRecord {
        start_time,
        price: None,
        export_price: None,
        carbon_intensity: None,
        gas_price: None,
    };
    match mode {
        Mode::AgileImport | Mode::Tracker => record.price = Some(value),
        Mode::AgileExport => record.export_price = Some(value),
        Mode::Carbon => record.carbon_intensity = Some(value),
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slot::tests::price_slots;

    #[test]
    fn test_upsert_and_select_round_trip() -> Result {
        let db = Db::open_in_memory()?;
        let records = price_slots(&[10.0, 20.0, 30.0]);
        assert_eq!(db.upsert(&records)?, 3);

        let selected = db.select_upcoming(records[0].start_time, 8)?;
        assert_eq!(selected, records);
        Ok(())
    }

    #[test]
    fn test_upsert_is_idempotent() -> Result {
        let db = Db::open_in_memory()?;
        let records = price_slots(&[10.0]);
        db.upsert(&records)?;
        db.upsert(&records)?;
        assert_eq!(db.select_latest(8)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_upsert_merges_metrics() -> Result {
        let db = Db::open_in_memory()?;
        let start_time = price_slots(&[10.0])[0].start_time;
        db.upsert(&[record_for_mode(start_time, Mode::AgileImport, 10.0)])?;
        db.upsert(&[record_for_mode(start_time, Mode::Carbon, 180.0)])?;

        let records = db.select_latest(8)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(10.0));
        assert_eq!(records[0].carbon_intensity, Some(180.0));
        Ok(())
    }

    #[test]
    fn test_prune_removes_only_old_rows() -> Result {
        let db = Db::open_in_memory()?;
        let records = price_slots(&[10.0, 20.0]);
        db.upsert(&records)?;

        let now = records[1].start_time + TimeDelta::days(3);
        db.prune(now, TimeDelta::days(2))?;
        assert!(db.select_latest(8)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_select_upcoming_skips_past_slots() -> Result {
        let db = Db::open_in_memory()?;
        let records = price_slots(&[10.0, 20.0, 30.0]);
        db.upsert(&records)?;

        // 10 minutes into the second slot: the first one is gone for good.
        let now = records[1].start_time + TimeDelta::minutes(10);
        let selected = db.select_upcoming(now, 8)?;
        assert_eq!(selected, &records[1..]);
        Ok(())
    }

    #[test]
    fn test_select_latest_is_reverse_chronological() -> Result {
        let db = Db::open_in_memory()?;
        let records = price_slots(&[10.0, 20.0]);
        db.upsert(&records)?;

        let selected = db.select_latest(8)?;
        assert_eq!(selected[0], records[1]);
        assert_eq!(selected[1], records[0]);
        Ok(())
    }
}
