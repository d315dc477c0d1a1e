pub mod geo;
pub mod request;
pub mod response;

pub use geo::{GeoBounds, GeoPoint};
pub use request::{Month, PredictionRequest, Selection, SelectionRange};
pub use response::{ChartEntry, DetailMonth, HeatmapFragment, HotspotDetail, PredictionResponse};
