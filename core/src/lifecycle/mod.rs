pub mod controller;
pub mod episode;
pub mod presentation;
pub mod state;

pub use controller::{
    Applied, PendingPrediction, RequestLifecycleController, Resolution, TriggerOutcome,
};
pub use episode::{CancellationToken, EpisodeId};
pub use presentation::{Presentation, ResultView, DISCLAIMER};
pub use state::{ErrorInfo, ErrorKind, LifecycleState, PREDICTION_FAILED_MESSAGE};
