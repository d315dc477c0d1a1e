use crate::lifecycle::state::LifecycleState;
use crate::model::{ChartEntry, PredictionRequest, PredictionResponse};

pub const DISCLAIMER: &[&str] = &[
    "Please note that the predictions are based on simulated data and may not fully reflect actual conditions.",
    "The longer the date you want to predict, the accuracy becomes poorer.",
];

pub const MARKUP_WITHHELD_NOTICE: &str =
    "This month was delivered as server markup or in an unknown form, which is not displayed. Showing the reported hotspots instead.";

/// Everything the shell needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub loading: bool,
    /// Disclaimer lines while a confirmation is pending.
    pub confirmation: Option<&'static [&'static str]>,
    pub error_message: Option<String>,
    pub show_default_map: bool,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub title: String,
    pub active_fragment: Option<usize>,
    pub fragment_count: usize,
    pub fragment_title: Option<String>,
    pub markup_notice: Option<&'static str>,
    pub charts: Vec<ChartEntry>,
    pub no_results: bool,
}

impl ResultView {
    pub fn new(request: &PredictionRequest, response: &PredictionResponse, active: usize) -> Self {
        let fragment_count = response.heatmap_fragments.len();
        let active_fragment = (active < fragment_count).then_some(active);
        let markup_notice = active_fragment
            .and_then(|index| response.heatmap_fragments.get(index))
            .filter(|fragment| fragment.is_withheld())
            .map(|_| MARKUP_WITHHELD_NOTICE);
        Self {
            title: heatmap_title(request),
            active_fragment,
            fragment_count,
            fragment_title: active_fragment.and_then(|index| response.fragment_title(index)),
            markup_notice,
            charts: response.chart_entries(),
            no_results: response.is_empty(),
        }
    }
}

pub fn heatmap_title(request: &PredictionRequest) -> String {
    format!(
        "Generated Heatmap for {} {}",
        request.month_name(),
        request.year()
    )
}

impl Presentation {
    pub fn derive(state: &LifecycleState) -> Self {
        let mut view = Presentation {
            loading: false,
            confirmation: None,
            error_message: None,
            show_default_map: true,
            result: None,
        };
        match state {
            LifecycleState::Idle => {}
            LifecycleState::AwaitingConfirmation => view.confirmation = Some(DISCLAIMER),
            LifecycleState::InFlight { .. } => view.loading = true,
            LifecycleState::Succeeded {
                request,
                response,
                active_fragment,
            } => {
                view.show_default_map = response.heatmap_fragments.is_empty();
                view.result = Some(ResultView::new(request, response, *active_fragment));
            }
            LifecycleState::Failed(info) => view.error_message = Some(info.message.clone()),
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::episode::EpisodeId;
    use crate::lifecycle::state::{ErrorInfo, ErrorKind};
    use serde_json::json;

    fn request() -> PredictionRequest {
        PredictionRequest::new(2024, 3).unwrap()
    }

    #[test]
    fn confirmation_shows_disclaimer() {
        let view = Presentation::derive(&LifecycleState::AwaitingConfirmation);
        assert_eq!(view.confirmation.map(<[_]>::len), Some(2));
        assert!(view.show_default_map);
        assert!(!view.loading);
    }

    #[test]
    fn in_flight_is_loading_over_default_map() {
        let view = Presentation::derive(&LifecycleState::InFlight {
            episode: EpisodeId(1),
            request: request(),
        });
        assert!(view.loading);
        assert!(view.show_default_map);
    }

    #[test]
    fn failure_shows_message() {
        let view = Presentation::derive(&LifecycleState::Failed(ErrorInfo::new(ErrorKind::Timeout)));
        assert_eq!(
            view.error_message.as_deref(),
            Some("Prediction failed. Please try again later.")
        );
    }

    #[test]
    fn markup_result_replaces_default_map_with_notice() {
        let response: PredictionResponse =
            serde_json::from_value(json!({"heatmaps": ["<div>ok</div>"]})).unwrap();
        let view = Presentation::derive(&LifecycleState::Succeeded {
            request: request(),
            response,
            active_fragment: 0,
        });
        assert!(!view.show_default_map);
        let result = view.result.unwrap();
        assert_eq!(result.title, "Generated Heatmap for March 2024");
        assert_eq!(result.active_fragment, Some(0));
        assert_eq!(result.markup_notice, Some(MARKUP_WITHHELD_NOTICE));
        assert!(!result.no_results);
    }

    #[test]
    fn empty_success_flags_no_results() {
        let view = Presentation::derive(&LifecycleState::Succeeded {
            request: request(),
            response: PredictionResponse::default(),
            active_fragment: 0,
        });
        assert!(view.show_default_map);
        let result = view.result.unwrap();
        assert!(result.no_results);
        assert_eq!(result.active_fragment, None);
        assert!(result.charts.is_empty());
    }

    #[test]
    fn graphs_only_keep_default_map_and_list_charts() {
        let response: PredictionResponse =
            serde_json::from_value(json!({"graphs": {"11.2,123.1": "/charts/1"}})).unwrap();
        let view = Presentation::derive(&LifecycleState::Succeeded {
            request: request(),
            response,
            active_fragment: 0,
        });
        assert!(view.show_default_map);
        assert_eq!(view.result.unwrap().charts[0].image_url, "/charts/1");
    }
}
