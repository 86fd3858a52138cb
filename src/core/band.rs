use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// LED colour of a band.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One severity level: every value above `above` (and below the next
/// band up) falls into it. The final band omits `above` and catches
/// everything else, including negative plunge prices.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Band {
    pub name: String,
    pub colour: Rgb,
    pub above: Option<f64>,
}

/// Validated band table, ordered from the highest threshold down.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandTable(Vec<Band>);

impl BandTable {
    /// Validate the configured bands: thresholds must strictly decrease and
    /// the last band must be a catch-all, so that every finite value maps to
    /// exactly one band. Gaps or overlaps are a configuration error.
    pub fn try_new(bands: Vec<Band>) -> Result<Self> {
        ensure!(bands.len() >= 2, "at least two bands are required, found {}", bands.len());
        let (catch_all, bounded) = bands.split_last().context("no bands configured")?;
        ensure!(
            catch_all.above.is_none(),
            "the last band `{}` must have no `above` threshold to catch low and negative values",
            catch_all.name,
        );
        let mut previous: Option<(&str, f64)> = None;
        for band in bounded {
            let above = band.above.with_context(|| {
                format!("band `{}` is missing the `above` threshold", band.name)
            })?;
            ensure!(above.is_finite(), "band `{}` has a non-finite threshold", band.name);
            if let Some((previous_name, previous_above)) = previous {
                ensure!(
                    above < previous_above,
                    "band `{}` ({above}) must have a lower threshold than `{previous_name}` ({previous_above})",
                    band.name,
                );
            }
            previous = Some((&band.name, above));
        }
        Ok(Self(bands))
    }

    /// Map a value onto the first band whose threshold it exceeds.
    ///
    /// With a validated table this cannot fail for any finite value, and a
    /// failure aborts the render pass rather than defaulting to some band.
    pub fn classify(&self, value: f64) -> Result<&Band> {
        ensure!(value.is_finite(), "cannot continue: a value of {value} makes no sense");
        for band in &self.0 {
            match band.above {
                Some(above) if value > above => return Ok(band),
                Some(_) => {}
                None => return Ok(band),
            }
        }
        bail!("value {value} does not fall into any band, the table is broken")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
