pub mod density;
pub mod stats;

pub use density::{DensityGrid, Raster};
pub use stats::StatsHelper;
