use serde::Deserialize;

/// Which metric the indicator tracks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Octopus Agile import unit rates.
    AgileImport,

    /// Octopus Agile Outgoing export unit rates.
    AgileExport,

    /// National Grid carbon intensity forecast.
    Carbon,

    /// Octopus Tracker daily electricity and gas prices.
    Tracker,
}

impl Mode {
    /// Short unit suffix shown next to values, for example `24.5p`.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::AgileImport | Self::AgileExport | Self::Tracker => "p",
            Self::Carbon => "g",
        }
    }

    pub const fn descriptor(self) -> &'static str {
        match self {
            Self::AgileImport => "Price from",
            Self::AgileExport => "Export at",
            Self::Carbon => "Carbon at",
            Self::Tracker => "Tracker from",
        }
    }

    /// Prices are shown with one decimal, carbon intensity is whole grams.
    pub fn format_value(self, value: f64) -> String {
        match self {
            Self::Carbon => format!("{value:.0}{}", self.unit()),
            _ => format!("{value:.1}{}", self.unit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(Mode::AgileImport.format_value(24.45), "24.4p");
        assert_eq!(Mode::Carbon.format_value(181.6), "182g");
    }
}
