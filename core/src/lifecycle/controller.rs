use crate::client::PredictionClient;
use crate::lifecycle::episode::{CancellationToken, EpisodeId};
use crate::lifecycle::presentation::Presentation;
use crate::lifecycle::state::{ErrorInfo, LifecycleState};
use crate::model::{GeoPoint, Month, PredictionRequest, PredictionResponse, Selection, SelectionRange};
use crate::prelude::{PredictionResult, SelectionError};
use crate::render::{HeatLayerRenderer, MapSurface};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The disclaimer is (now) showing and waits for confirm or abandon.
    AwaitingConfirmation,
    /// A request is outstanding; nothing changed.
    AlreadyInFlight,
    /// The controller was torn down.
    Ignored,
}

/// Result of feeding a [`Resolution`] back into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Succeeded,
    Failed,
    /// Stale or cancelled episode; state untouched.
    Discarded,
}

#[derive(Debug, Clone)]
enum Outcome {
    Completed(PredictionResult<PredictionResponse>),
    Cancelled,
}

/// How an episode's request ended, tagged with the episode it belongs to.
#[derive(Debug, Clone)]
pub struct Resolution {
    episode: EpisodeId,
    token: CancellationToken,
    outcome: Outcome,
}

impl Resolution {
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self.outcome, Outcome::Cancelled)
    }
}

/// The single outstanding request of an episode. Drive it with
/// [`run`](Self::run) and hand the result to
/// [`RequestLifecycleController::apply`].
pub struct PendingPrediction<C: PredictionClient> {
    client: Arc<C>,
    request: PredictionRequest,
    episode: EpisodeId,
    token: CancellationToken,
}

impl<C: PredictionClient> PendingPrediction<C> {
    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn request(&self) -> PredictionRequest {
        self.request
    }

    /// Waits for the client unless the episode is cancelled first.
    pub async fn run(self) -> Resolution {
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => Outcome::Cancelled,
            result = self.client.submit(self.request) => Outcome::Completed(result),
        };
        Resolution {
            episode: self.episode,
            token: self.token,
            outcome,
        }
    }
}

/// Drives confirmation, single-flight submission and result propagation
/// for one view.
pub struct RequestLifecycleController<C: PredictionClient> {
    client: Arc<C>,
    range: SelectionRange,
    selection: Selection,
    state: LifecycleState,
    last_episode: u64,
    in_flight: Option<(EpisodeId, CancellationToken)>,
    revision: u64,
    torn_down: bool,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl<C: PredictionClient> RequestLifecycleController<C> {
    pub fn new(client: C) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    pub fn with_shared_client(client: Arc<C>) -> Self {
        Self {
            client,
            range: SelectionRange::default(),
            selection: Selection::default(),
            state: LifecycleState::Idle,
            last_episode: 0,
            in_flight: None,
            revision: 0,
            torn_down: false,
            metrics: Arc::new(MetricsRecorder::new()),
            logger: LogManager::new("lifecycle"),
        }
    }

    /// Replaces the selectable years; the current year is moved into range.
    pub fn with_range(mut self, range: SelectionRange) -> Self {
        if range.check_year(self.selection.year).is_err() {
            self.selection.year = *range.years.start();
        }
        self.range = range;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_range(&self) -> &SelectionRange {
        &self.range
    }

    /// Bumped on every state or selection change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        Arc::clone(&self.metrics)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Only affects the next confirmed request.
    pub fn select_year(&mut self, year: i32) -> Result<(), SelectionError> {
        let year = self.range.check_year(year)?;
        if self.selection.year != year {
            self.selection.year = year;
            self.revision += 1;
        }
        Ok(())
    }

    pub fn select_month(&mut self, month: u32) -> Result<(), SelectionError> {
        let month = Month::from_number(month)?;
        if self.selection.month != month {
            self.selection.month = month;
            self.revision += 1;
        }
        Ok(())
    }

    pub fn trigger_predict(&mut self) -> TriggerOutcome {
        if self.torn_down {
            return TriggerOutcome::Ignored;
        }
        match self.state {
            LifecycleState::InFlight { .. } => {
                self.logger
                    .detail("predict ignored, a request is already outstanding");
                TriggerOutcome::AlreadyInFlight
            }
            LifecycleState::AwaitingConfirmation => TriggerOutcome::AwaitingConfirmation,
            LifecycleState::Idle
            | LifecycleState::Succeeded { .. }
            | LifecycleState::Failed(_) => {
                self.transition(LifecycleState::AwaitingConfirmation);
                TriggerOutcome::AwaitingConfirmation
            }
        }
    }

    /// Leaves the confirmation step without issuing anything.
    pub fn abandon(&mut self) -> bool {
        if self.torn_down || !matches!(self.state, LifecycleState::AwaitingConfirmation) {
            return false;
        }
        self.transition(LifecycleState::Idle);
        true
    }

    /// Starts the episode for the current selection. `None` unless a
    /// confirmation is pending.
    pub fn confirm(&mut self) -> Option<PendingPrediction<C>> {
        if self.torn_down || !matches!(self.state, LifecycleState::AwaitingConfirmation) {
            return None;
        }

        self.last_episode += 1;
        let episode = EpisodeId(self.last_episode);
        let token = CancellationToken::new();
        let request = self.selection.to_request();

        self.in_flight = Some((episode, token.clone()));
        self.transition(LifecycleState::InFlight { episode, request });
        self.metrics.record_issued();
        self.logger.record(&format!(
            "{episode}: requesting {} {}",
            request.month_name(),
            request.year()
        ));

        Some(PendingPrediction {
            client: Arc::clone(&self.client),
            request,
            episode,
            token,
        })
    }

    /// Applies the resolution of the current episode. Anything else is
    /// discarded without touching state.
    pub fn apply(&mut self, resolution: Resolution) -> Applied {
        let current = match (&self.in_flight, &self.state) {
            (Some((episode, token)), LifecycleState::InFlight { request, .. })
                if !self.torn_down
                    && *episode == resolution.episode
                    && token.same_as(&resolution.token)
                    && !token.is_cancelled() =>
            {
                Some(*request)
            }
            _ => None,
        };
        let (Some(request), Outcome::Completed(result)) = (current, resolution.outcome) else {
            self.metrics.record_discarded();
            self.logger
                .warn(&format!("{}: resolution discarded", resolution.episode));
            return Applied::Discarded;
        };

        self.in_flight = None;
        let err = match result {
            Ok(response) => return self.succeed(request, response),
            Err(err) => err,
        };
        match ErrorInfo::from_error(&err) {
            Some(info) => {
                self.logger
                    .warn(&format!("{}: prediction failed: {err}", resolution.episode));
                self.metrics.record_failed();
                self.transition(LifecycleState::Failed(info));
                Applied::Failed
            }
            None => {
                self.logger.warn(&format!(
                    "{}: {err}, showing an empty result",
                    resolution.episode
                ));
                self.succeed(request, PredictionResponse::default())
            }
        }
    }

    /// Makes fragment `index` the one drawn on the map.
    pub fn select_fragment(&mut self, index: usize) -> bool {
        let LifecycleState::Succeeded {
            response,
            active_fragment,
            ..
        } = &mut self.state
        else {
            return false;
        };
        if index >= response.heatmap_fragments.len() || *active_fragment == index {
            return false;
        }
        *active_fragment = index;
        self.revision += 1;
        true
    }

    /// Points of the active fragment, or `None` while the default map shows.
    pub fn heat_points(&self) -> Option<Vec<GeoPoint>> {
        match &self.state {
            LifecycleState::Succeeded {
                response,
                active_fragment,
                ..
            } if !response.heatmap_fragments.is_empty() => {
                Some(response.fragment_points(*active_fragment))
            }
            _ => None,
        }
    }

    /// Brings `renderer` in line with the current state.
    pub fn feed_renderer<S: MapSurface>(&self, renderer: &mut HeatLayerRenderer<S>) {
        match self.heat_points() {
            Some(points) => {
                renderer.render(&points);
            }
            None => renderer.clear(),
        }
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::derive(&self.state)
    }

    /// Cancels the outstanding episode, if any; later resolutions are
    /// discarded.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some((episode, token)) = self.in_flight.take() {
            token.cancel();
            self.logger
                .record(&format!("{episode}: cancelled by teardown"));
        }
    }

    fn succeed(&mut self, request: PredictionRequest, response: PredictionResponse) -> Applied {
        self.metrics.record_succeeded();
        self.logger.detail(&format!(
            "{} fragment(s), {} graph(s)",
            response.heatmap_fragments.len(),
            response.graphs.len()
        ));
        self.transition(LifecycleState::Succeeded {
            request,
            response,
            active_fragment: 0,
        });
        Applied::Succeeded
    }

    fn transition(&mut self, next: LifecycleState) {
        self.logger.transition(self.state.name(), next.name());
        self.state = next;
        self.revision += 1;
    }
}

impl<C: PredictionClient> Drop for RequestLifecycleController<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
