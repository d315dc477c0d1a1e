use crate::lifecycle::episode::EpisodeId;
use crate::model::{PredictionRequest, PredictionResponse};
use crate::prelude::PredictionError;

pub const PREDICTION_FAILED_MESSAGE: &str = "Prediction failed. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    ServerError { status: u16 },
    ClientSetupError { message: String },
}

/// Failure shown to the user until the next Predict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind) -> Self {
        let message = match &kind {
            ErrorKind::Timeout | ErrorKind::ServerError { .. } => {
                PREDICTION_FAILED_MESSAGE.to_string()
            }
            ErrorKind::ClientSetupError { .. } => {
                "Prediction could not be sent. The prediction service is not configured correctly."
                    .to_string()
            }
        };
        Self { kind, message }
    }

    /// `None` for errors that do not fail the episode.
    pub fn from_error(err: &PredictionError) -> Option<Self> {
        let kind = match err {
            PredictionError::Timeout(_) => ErrorKind::Timeout,
            PredictionError::ServerError { status } => ErrorKind::ServerError { status: *status },
            PredictionError::ClientSetupError { message } => ErrorKind::ClientSetupError {
                message: message.clone(),
            },
            PredictionError::UnexpectedResponseShape(_) => return None,
        };
        Some(Self::new(kind))
    }
}

/// What the view is showing. Exactly one per controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LifecycleState {
    #[default]
    Idle,
    AwaitingConfirmation,
    InFlight {
        episode: EpisodeId,
        request: PredictionRequest,
    },
    Succeeded {
        request: PredictionRequest,
        response: PredictionResponse,
        active_fragment: usize,
    },
    Failed(ErrorInfo),
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::AwaitingConfirmation => "AwaitingConfirmation",
            LifecycleState::InFlight { .. } => "InFlight",
            LifecycleState::Succeeded { .. } => "Succeeded",
            LifecycleState::Failed(_) => "Failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, LifecycleState::InFlight { .. })
    }

    pub fn response(&self) -> Option<&PredictionResponse> {
        match self {
            LifecycleState::Succeeded { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            LifecycleState::Failed(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_server_errors_share_the_generic_message() {
        let timeout = ErrorInfo::from_error(&PredictionError::Timeout("slow".into())).unwrap();
        assert_eq!(timeout.kind, ErrorKind::Timeout);
        assert_eq!(timeout.message, "Prediction failed. Please try again later.");

        let server = ErrorInfo::from_error(&PredictionError::ServerError { status: 502 }).unwrap();
        assert_eq!(server.kind, ErrorKind::ServerError { status: 502 });
        assert_eq!(server.message, PREDICTION_FAILED_MESSAGE);
    }

    #[test]
    fn setup_errors_get_their_own_message() {
        let info = ErrorInfo::from_error(&PredictionError::ClientSetupError {
            message: "no base url".into(),
        })
        .unwrap();
        assert_ne!(info.message, PREDICTION_FAILED_MESSAGE);
        assert!(info.message.contains("not configured"));
    }

    #[test]
    fn unexpected_shape_does_not_fail() {
        assert!(ErrorInfo::from_error(&PredictionError::UnexpectedResponseShape("x".into())).is_none());
    }
}
