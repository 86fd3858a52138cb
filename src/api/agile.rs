//! [Octopus Agile](https://developer.octopus.energy/docs/api/) unit rates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    api::{DataSource, client},
    config::Region,
    core::{mode::Mode, slot::SlotRecord},
    db::record_for_mode,
    prelude::*,
};

pub struct Api {
    client: Client,
    mode: Mode,
    region: Region,
}

impl Api {
    pub fn try_new(mode: Mode, region: Region) -> Result<Self> {
        ensure!(
            matches!(mode, Mode::AgileImport | Mode::AgileExport),
            "the Agile API does not serve {mode:?} data",
        );
        ensure!(region != Region::Z, "region Z is only valid for carbon intensity");
        Ok(Self { client: client::try_new()?, mode, region })
    }

    /// The tariff endpoint is public, no authentication required.
    fn url(&self) -> String {
        let product = match self.mode {
            Mode::AgileExport => "AGILE-OUTGOING-19-05-13",
            _ => "AGILE-18-02-21",
        };
        format!(
            "https://api.octopus.energy/v1/products/{product}/electricity-tariffs/E-1R-{product}-{region}/standard-unit-rates/",
            region = self.region,
        )
    }
}

#[async_trait]
impl DataSource for Api {
    #[instrument(skip_all, fields(mode = ?self.mode, region = %self.region))]
    async fn fetch(&self) -> Result<Vec<SlotRecord>> {
        info!("fetching…");
        let response: UnitRatesResponse = client::get_json(&self.client, &self.url()).await?;
        info!(n_results = response.results.len(), "fetched");
        // Octopus returns the rates newest first.
        Ok(response
            .results
            .into_iter()
            .map(|rate| record_for_mode(rate.valid_from, self.mode, rate.value_inc_vat))
            .sorted_by_key(|record| record.start_time)
            .collect())
    }
}

#[derive(Deserialize)]
struct UnitRatesResponse {
    results: Vec<UnitRate>,
}

#[derive(Deserialize)]
struct UnitRate {
    valid_from: DateTime<Utc>,

    /// Pence per kilowatt-hour, VAT included.
    value_inc_vat: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            {
                "value_exc_vat": 21.0,
                "value_inc_vat": 22.05,
                "valid_from": "2024-03-01T00:30:00Z",
                "valid_to": "2024-03-01T01:00:00Z",
                "payment_method": null
            },
            {
                "value_exc_vat": 20.0,
                "value_inc_vat": 21.0,
                "valid_from": "2024-03-01T00:00:00Z",
                "valid_to": "2024-03-01T00:30:00Z",
                "payment_method": null
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_unit_rates() -> Result {
        let response: UnitRatesResponse = serde_json::from_str(SAMPLE)?;
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].value_inc_vat, 22.05);
        Ok(())
    }

    #[test]
    fn test_import_url() -> Result {
        let api = Api::try_new(Mode::AgileImport, Region::C)?;
        assert_eq!(
            api.url(),
            "https://api.octopus.energy/v1/products/AGILE-18-02-21/electricity-tariffs/E-1R-AGILE-18-02-21-C/standard-unit-rates/",
        );
        Ok(())
    }

    #[test]
    fn test_carbon_mode_is_rejected() {
        assert!(Api::try_new(Mode::Carbon, Region::A).is_err());
    }

    #[tokio::test]
    #[ignore = "makes the API request"]
    async fn test_fetch_ok() -> Result {
        let records = Api::try_new(Mode::AgileImport, Region::A)?.fetch().await?;
        assert!(!records.is_empty());
        assert!(records.iter().is_sorted_by_key(|record| record.start_time));
        Ok(())
    }
}
