pub mod band;
pub mod display;
pub mod mode;
pub mod series;
pub mod slot;
pub mod trend;
