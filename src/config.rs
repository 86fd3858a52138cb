use std::path::Path;

use serde::Deserialize;

use crate::{
    core::{
        band::{Band, BandTable},
        mode::Mode,
    },
    prelude::*,
};

const DEFAULT_BRIGHTNESS: u8 = 10;
const DEFAULT_SLOTS_PER_PIXEL: usize = 1;
const DEFAULT_HIGH_VALUE: f64 = 30.0;
const DEFAULT_WINDOW_HOURS: f64 = 3.0;
const DEFAULT_DATA_DURATION_HOURS: u32 = 24;

/// Validated indicator configuration.
///
/// Structural problems (unknown mode, broken band table) are fatal at load
/// time, while out-of-range tunables fall back to their defaults with a
/// warning, so a fat-fingered brightness does not take the display down.
#[derive(Debug)]
pub struct Config {
    pub mode: Mode,
    pub region: Region,
    pub display: DisplayType,
    pub bands: BandTable,
    pub blinkt: BlinktConfig,
    pub inky: InkyConfig,
}

impl Config {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to find `{}`", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).context("error reading configuration")?;
        let bands = BandTable::try_new(raw.bands).context("the `bands` table is invalid")?;
        Ok(Self {
            mode: raw.mode,
            region: raw.region,
            display: raw.display,
            bands,
            blinkt: raw.blinkt.validated(),
            inky: raw.inky.validated(),
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawConfig {
    mode: Mode,

    /// DNO region letter.
    region: Region,

    display: DisplayType,

    bands: Vec<Band>,

    #[serde(default)]
    blinkt: BlinktConfig,

    #[serde(default)]
    inky: InkyConfig,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayType {
    Blinkt,
    InkyPhat,
}

/// Distribution network operator region, as used by both the Agile tariff
/// codes and the regional carbon intensity API. `Z` selects the national
/// carbon intensity figures.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, derive_more::Display)]
pub enum Region {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    J,
    K,
    L,
    M,
    N,
    P,
    Z,
}

impl Region {
    /// Region identifier of the regional carbon intensity endpoint.
    pub const fn carbon_region_id(self) -> Option<u32> {
        match self {
            Self::A => Some(10),
            Self::B => Some(9),
            Self::C => Some(13),
            Self::D => Some(6),
            Self::E => Some(8),
            Self::F => Some(4),
            Self::G => Some(3),
            Self::H => Some(12),
            Self::J => Some(14),
            Self::K => Some(7),
            Self::L => Some(11),
            Self::M => Some(5),
            Self::N => Some(2),
            Self::P => Some(1),
            Self::Z => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BlinktConfig {
    /// LED brightness percentage, it burns at 100.
    #[serde(default = "BlinktConfig::default_brightness")]
    pub brightness: u8,

    /// How many half-hour slots are averaged into one pixel.
    #[serde(default = "BlinktConfig::default_slots_per_pixel")]
    pub slots_per_pixel: usize,
}

impl Default for BlinktConfig {
    fn default() -> Self {
        Self { brightness: DEFAULT_BRIGHTNESS, slots_per_pixel: DEFAULT_SLOTS_PER_PIXEL }
    }
}

impl BlinktConfig {
    /// The Blinkt! strip is 8 pixels, end of story.
    pub const CAPACITY: usize = 8;

    const fn default_brightness() -> u8 {
        DEFAULT_BRIGHTNESS
    }

    const fn default_slots_per_pixel() -> usize {
        DEFAULT_SLOTS_PER_PIXEL
    }

    fn validated(mut self) -> Self {
        if !(5..=100).contains(&self.brightness) {
            warn!(
                misconfigured = self.brightness,
                "misconfigured brightness value, using the default of {DEFAULT_BRIGHTNESS}",
            );
            self.brightness = DEFAULT_BRIGHTNESS;
        }
        if !(1..=12).contains(&self.slots_per_pixel) {
            warn!(
                misconfigured = self.slots_per_pixel,
                "misconfigured slots per pixel, using the default of {DEFAULT_SLOTS_PER_PIXEL}",
            );
            self.slots_per_pixel = DEFAULT_SLOTS_PER_PIXEL;
        }
        self
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct InkyConfig {
    /// Above this value the current reading is drawn in the highlight colour.
    #[serde(default = "InkyConfig::default_high_value")]
    pub high_value: f64,

    /// Length of the cheapest/priciest window, in hours,
    /// half-hour increments between 0.5 and 6.
    #[serde(default = "InkyConfig::default_window_hours")]
    pub window_hours: f64,

    /// How many hours of data the graph covers.
    #[serde(default = "InkyConfig::default_data_duration_hours")]
    pub data_duration_hours: u32,

    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for InkyConfig {
    fn default() -> Self {
        Self {
            high_value: DEFAULT_HIGH_VALUE,
            window_hours: DEFAULT_WINDOW_HOURS,
            data_duration_hours: DEFAULT_DATA_DURATION_HOURS,
            orientation: Orientation::default(),
        }
    }
}

impl InkyConfig {
    const fn default_high_value() -> f64 {
        DEFAULT_HIGH_VALUE
    }

    const fn default_window_hours() -> f64 {
        DEFAULT_WINDOW_HOURS
    }

    const fn default_data_duration_hours() -> u32 {
        DEFAULT_DATA_DURATION_HOURS
    }

    fn validated(mut self) -> Self {
        if !self.high_value.is_finite() {
            warn!("misconfigured high value, using the default of {DEFAULT_HIGH_VALUE}");
            self.high_value = DEFAULT_HIGH_VALUE;
        }
        if !(0.5..=6.0).contains(&self.window_hours) || (self.window_hours % 0.5) != 0.0 {
            warn!(
                misconfigured = self.window_hours,
                "window duration must be between 0.5 and 6 hours in half-hour increments, \
                 using the default of {DEFAULT_WINDOW_HOURS}",
            );
            self.window_hours = DEFAULT_WINDOW_HOURS;
        }
        if !(12..=48).contains(&self.data_duration_hours) {
            warn!(
                misconfigured = self.data_duration_hours,
                "data duration must be between 12 and 48 hours, \
                 using the default of {DEFAULT_DATA_DURATION_HOURS}",
            );
            self.data_duration_hours = DEFAULT_DATA_DURATION_HOURS;
        }
        self
    }

    /// The window length in half-hour slots.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn window_slots(&self) -> usize {
        (self.window_hours * 2.0) as usize
    }

    pub const fn data_duration_slots(&self) -> usize {
        (self.data_duration_hours * 2) as usize
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    Standard,
    Inverted,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        mode = "agile-import"
        region = "A"
        display = "blinkt"

        [[bands]]
        name = "high"
        colour = { r = 255, g = 0, b = 0 }
        above = 10.0

        [[bands]]
        name = "low"
        colour = { r = 0, g = 255, b = 0 }
    "#;

    #[test]
    fn test_minimal_config() -> Result {
        let config = Config::from_toml(MINIMAL)?;
        assert_eq!(config.mode, Mode::AgileImport);
        assert_eq!(config.display, DisplayType::Blinkt);
        assert_eq!(config.blinkt.brightness, DEFAULT_BRIGHTNESS);
        assert_eq!(config.bands.len(), 2);
        assert_eq!(config.inky.window_slots(), 6);
        Ok(())
    }

    #[test]
    fn test_out_of_range_brightness_falls_back() -> Result {
        let contents = format!("{MINIMAL}\n[blinkt]\nbrightness = 101\n");
        let config = Config::from_toml(&contents)?;
        assert_eq!(config.blinkt.brightness, DEFAULT_BRIGHTNESS);
        Ok(())
    }

    #[test]
    fn test_odd_window_duration_falls_back() -> Result {
        let contents = format!("{MINIMAL}\n[inky]\nwindow-hours = 1.75\n");
        let config = Config::from_toml(&contents)?;
        assert_eq!(config.inky.window_slots(), 6);
        Ok(())
    }

    #[test]
    fn test_unknown_mode_is_fatal() {
        let contents = MINIMAL.replace("agile-import", "quantum");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn test_band_gap_is_fatal() {
        // `low` above 20 does not decrease from `high` above 10.
        let contents = r#"
            mode = "agile-import"
            region = "A"
            display = "blinkt"

            [[bands]]
            name = "high"
            colour = { r = 255, g = 0, b = 0 }
            above = 10.0

            [[bands]]
            name = "low"
            colour = { r = 0, g = 255, b = 0 }
            above = 20.0

            [[bands]]
            name = "lowest"
            colour = { r = 0, g = 0, b = 255 }
        "#;
        assert!(Config::from_toml(contents).is_err());
    }
}
