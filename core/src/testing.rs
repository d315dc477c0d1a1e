//! Test doubles for the client and the map surface.

use crate::client::{with_deadline, PredictionClient};
use crate::model::{PredictionRequest, PredictionResponse};
use crate::prelude::{PredictionError, PredictionResult};
use crate::render::{HeatLayer, LayerStore, MapSurface, MarkerHandle, OverlayHandle, PointMarker};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// One scripted reply.
pub(crate) struct Step {
    result: PredictionResult<PredictionResponse>,
    delay: Duration,
    gated: bool,
    deadline: Option<Duration>,
}

impl Step {
    pub(crate) fn ok(response: PredictionResponse) -> Self {
        Self::from_result(Ok(response))
    }

    pub(crate) fn err(err: PredictionError) -> Self {
        Self::from_result(Err(err))
    }

    fn from_result(result: PredictionResult<PredictionResponse>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            gated: false,
            deadline: None,
        }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Waits for [`ScriptedClient::release`] before replying.
    pub(crate) fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub(crate) fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Replays steps in order; an exhausted script answers with an empty body.
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<PredictionRequest>>,
    gate: Notify,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedClient {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<PredictionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_step(&self, request: PredictionRequest) -> Step {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::ok(PredictionResponse::default()))
    }

    async fn reply(&self, step: Step) -> PredictionResult<PredictionResponse> {
        if step.gated {
            self.gate.notified().await;
        }
        tokio::time::sleep(step.delay).await;
        step.result
    }
}

impl PredictionClient for ScriptedClient {
    fn submit(
        &self,
        request: PredictionRequest,
    ) -> impl Future<Output = PredictionResult<PredictionResponse>> + Send {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);

            let mut step = self.next_step(request);
            let outcome = match step.deadline.take() {
                Some(deadline) => with_deadline(deadline, self.reply(step)).await,
                None => self.reply(step).await,
            };
            self.active.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceOp {
    AttachOverlay(OverlayHandle),
    DetachOverlay(OverlayHandle),
    AttachMarker(MarkerHandle),
    DetachMarker(MarkerHandle),
    RestyleMarker(MarkerHandle),
}

/// A [`LayerStore`] that logs every effective operation it receives.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    store: LayerStore,
    history: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub(crate) fn store(&self) -> &LayerStore {
        &self.store
    }

    pub(crate) fn history(&self) -> &[SurfaceOp] {
        &self.history
    }
}

impl MapSurface for RecordingSurface {
    fn attach_overlay(&mut self, layer: HeatLayer) -> OverlayHandle {
        let handle = self.store.attach_overlay(layer);
        self.history.push(SurfaceOp::AttachOverlay(handle));
        handle
    }

    fn detach_overlay(&mut self, handle: OverlayHandle) {
        if self.store.overlay(handle).is_some() {
            self.store.detach_overlay(handle);
            self.history.push(SurfaceOp::DetachOverlay(handle));
        }
    }

    fn attach_marker(&mut self, marker: PointMarker) -> MarkerHandle {
        let handle = self.store.attach_marker(marker);
        self.history.push(SurfaceOp::AttachMarker(handle));
        handle
    }

    fn detach_marker(&mut self, handle: MarkerHandle) {
        if self.store.marker(handle).is_some() {
            self.store.detach_marker(handle);
            self.history.push(SurfaceOp::DetachMarker(handle));
        }
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, marker: &PointMarker) {
        if self.store.marker(handle).is_some() {
            self.store.restyle_marker(handle, marker);
            self.history.push(SurfaceOp::RestyleMarker(handle));
        }
    }
}

/// A [`LayerStore`] that outlives the renderer it is mounted on.
#[derive(Clone, Default)]
pub(crate) struct SharedSurface {
    store: Arc<Mutex<LayerStore>>,
}

impl SharedSurface {
    pub(crate) fn overlay_count(&self) -> usize {
        self.store.lock().unwrap().overlay_count()
    }

    pub(crate) fn marker_count(&self) -> usize {
        self.store.lock().unwrap().marker_count()
    }
}

impl MapSurface for SharedSurface {
    fn attach_overlay(&mut self, layer: HeatLayer) -> OverlayHandle {
        self.store.lock().unwrap().attach_overlay(layer)
    }

    fn detach_overlay(&mut self, handle: OverlayHandle) {
        self.store.lock().unwrap().detach_overlay(handle)
    }

    fn attach_marker(&mut self, marker: PointMarker) -> MarkerHandle {
        self.store.lock().unwrap().attach_marker(marker)
    }

    fn detach_marker(&mut self, handle: MarkerHandle) {
        self.store.lock().unwrap().detach_marker(handle)
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, marker: &PointMarker) {
        self.store.lock().unwrap().restyle_marker(handle, marker)
    }
}
