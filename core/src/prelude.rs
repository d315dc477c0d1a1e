pub use crate::client::{ClientConfig, HttpPredictionClient, PredictionClient};
pub use crate::lifecycle::{
    Applied, ErrorInfo, ErrorKind, LifecycleState, PendingPrediction, Presentation,
    RequestLifecycleController, Resolution, TriggerOutcome,
};
pub use crate::model::{
    GeoBounds, GeoPoint, HeatmapFragment, HotspotDetail, Month, PredictionRequest,
    PredictionResponse, Selection, SelectionRange,
};
pub use crate::render::{HeatLayer, HeatLayerOptions, HeatLayerRenderer, MapSurface};

/// Failure outcomes of a single prediction call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    #[error("no response within the request deadline: {0}")]
    Timeout(String),
    #[error("server responded with status {status}")]
    ServerError { status: u16 },
    #[error("request could not be sent: {message}")]
    ClientSetupError { message: String },
    #[error("unexpected response shape: {0}")]
    UnexpectedResponseShape(String),
}

pub type PredictionResult<T> = Result<T, PredictionError>;

/// Rejected year/month selections.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("year {year} outside selectable range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
    #[error("month {0} outside 1..=12")]
    MonthOutOfRange(u32),
}
