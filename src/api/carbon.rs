//! [National Grid carbon intensity](https://carbonintensity.org.uk) forecast.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::{Deserialize, Deserializer, de};

use crate::{
    api::{DataSource, client},
    config::Region,
    core::{mode::Mode, slot::SlotRecord},
    db::record_for_mode,
    prelude::*,
};

const BASE_URL: &str = "https://api.carbonintensity.org.uk";

pub struct Api {
    client: Client,
    region: Region,
}

impl Api {
    pub fn try_new(region: Region) -> Result<Self> {
        Ok(Self { client: client::try_new()?, region })
    }

    /// 24-hour forward forecast from `from_time`, either for one DNO region
    /// or nationally for region `Z`.
    fn url(&self, from_time: DateTime<Utc>) -> String {
        let from_time = from_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        match self.region.carbon_region_id() {
            Some(region_id) => {
                format!("{BASE_URL}/regional/intensity/{from_time}/fw24h/regionid/{region_id}")
            }
            None => format!("{BASE_URL}/intensity/{from_time}/fw24h"),
        }
    }
}

#[async_trait]
impl DataSource for Api {
    #[instrument(skip_all, fields(region = %self.region))]
    async fn fetch(&self) -> Result<Vec<SlotRecord>> {
        info!("fetching…");
        let url = self.url(Utc::now());
        // The regional endpoint nests the slots one level deeper.
        let slots = if self.region.carbon_region_id().is_some() {
            client::get_json::<RegionalResponse>(&self.client, &url).await?.data.data
        } else {
            client::get_json::<NationalResponse>(&self.client, &url).await?.data
        };
        info!(n_slots = slots.len(), "fetched");
        Ok(slots
            .into_iter()
            .map(|slot| record_for_mode(slot.from, Mode::Carbon, slot.intensity.forecast))
            .sorted_by_key(|record| record.start_time)
            .collect())
    }
}

#[derive(Deserialize)]
struct NationalResponse {
    data: Vec<IntensitySlot>,
}

#[derive(Deserialize)]
struct RegionalResponse {
    data: RegionalData,
}

#[derive(Deserialize)]
struct RegionalData {
    data: Vec<IntensitySlot>,
}

#[derive(Deserialize)]
struct IntensitySlot {
    #[serde(deserialize_with = "IntensitySlot::deserialize_timestamp")]
    from: DateTime<Utc>,

    intensity: Intensity,
}

impl IntensitySlot {
    /// The API omits the seconds: `2024-03-01T00:30Z`.
    fn deserialize_timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let timestamp = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%dT%H:%MZ")
            .map(|timestamp| timestamp.and_utc())
            .map_err(|_| {
                de::Error::invalid_value(de::Unexpected::Str(&timestamp), &"a valid timestamp")
            })
    }
}

#[derive(Deserialize)]
struct Intensity {
    /// Grams of CO₂ per kilowatt-hour.
    forecast: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGIONAL_SAMPLE: &str = r#"{
        "data": {
            "regionid": 13,
            "dnoregion": "NPg North East",
            "shortname": "North East England",
            "postcode": "NE1",
            "data": [
                {
                    "from": "2024-03-01T00:00Z",
                    "to": "2024-03-01T00:30Z",
                    "intensity": { "forecast": 51, "index": "low" }
                },
                {
                    "from": "2024-03-01T00:30Z",
                    "to": "2024-03-01T01:00Z",
                    "intensity": { "forecast": 62, "index": "moderate" }
                }
            ]
        }
    }"#;

    const NATIONAL_SAMPLE: &str = r#"{
        "data": [
            {
                "from": "2024-03-01T00:00Z",
                "to": "2024-03-01T00:30Z",
                "intensity": { "forecast": 160, "actual": null, "index": "moderate" }
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_regional() -> Result {
        let response: RegionalResponse = serde_json::from_str(REGIONAL_SAMPLE)?;
        assert_eq!(response.data.data.len(), 2);
        assert_eq!(response.data.data[1].intensity.forecast, 62.0);
        Ok(())
    }

    #[test]
    fn test_deserialize_national() -> Result {
        let response: NationalResponse = serde_json::from_str(NATIONAL_SAMPLE)?;
        assert_eq!(response.data.len(), 1);
        assert_eq!(
            response.data[0].from,
            DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z").unwrap(),
        );
        Ok(())
    }

    #[test]
    fn test_regional_url() -> Result {
        let api = Api::try_new(Region::C)?;
        let from_time = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().to_utc();
        assert_eq!(
            api.url(from_time),
            "https://api.carbonintensity.org.uk/regional/intensity/2024-03-01T12:00:00Z/fw24h/regionid/13",
        );
        Ok(())
    }

    #[test]
    fn test_national_url() -> Result {
        let api = Api::try_new(Region::Z)?;
        let from_time = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().to_utc();
        assert_eq!(
            api.url(from_time),
            "https://api.carbonintensity.org.uk/intensity/2024-03-01T12:00:00Z/fw24h",
        );
        Ok(())
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_fetch_ok() -> Result {
        let records = Api::try_new(Region::Z)?.fetch().await?;
        assert!(!records.is_empty());
        assert!(records.iter().all(|record| record.carbon_intensity.is_some()));
        Ok(())
    }
}
