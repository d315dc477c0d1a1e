use crate::render::heat::HeatLayer;
use crate::render::marker::PointMarker;
use std::collections::BTreeMap;

/// Opaque id of a heat overlay attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(pub u64);

/// Opaque id of a point marker attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub u64);

/// A map that heat overlays and point markers can be attached to.
///
/// The surface only stores and draws what it is given; attach/detach
/// ordering is the caller's responsibility.
pub trait MapSurface {
    fn attach_overlay(&mut self, layer: HeatLayer) -> OverlayHandle;
    fn detach_overlay(&mut self, handle: OverlayHandle);
    fn attach_marker(&mut self, marker: PointMarker) -> MarkerHandle;
    fn detach_marker(&mut self, handle: MarkerHandle);
    fn restyle_marker(&mut self, handle: MarkerHandle, marker: &PointMarker);
}

/// In-memory surface: holds exactly the layers and markers currently
/// attached so a canvas can paint them.
#[derive(Debug, Default)]
pub struct LayerStore {
    next_id: u64,
    overlays: BTreeMap<OverlayHandle, HeatLayer>,
    markers: BTreeMap<MarkerHandle, PointMarker>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn overlays(&self) -> impl Iterator<Item = (OverlayHandle, &HeatLayer)> + '_ {
        self.overlays.iter().map(|(handle, layer)| (*handle, layer))
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn overlay(&self, handle: OverlayHandle) -> Option<&HeatLayer> {
        self.overlays.get(&handle)
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerHandle, &PointMarker)> + '_ {
        self.markers.iter().map(|(handle, marker)| (*handle, marker))
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&PointMarker> {
        self.markers.get(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty() && self.markers.is_empty()
    }
}

impl MapSurface for LayerStore {
    fn attach_overlay(&mut self, layer: HeatLayer) -> OverlayHandle {
        let handle = OverlayHandle(self.next());
        self.overlays.insert(handle, layer);
        handle
    }

    fn detach_overlay(&mut self, handle: OverlayHandle) {
        self.overlays.remove(&handle);
    }

    fn attach_marker(&mut self, marker: PointMarker) -> MarkerHandle {
        let handle = MarkerHandle(self.next());
        self.markers.insert(handle, marker);
        handle
    }

    fn detach_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, marker: &PointMarker) {
        if let Some(stored) = self.markers.get_mut(&handle) {
            *stored = marker.clone();
        }
    }
}
