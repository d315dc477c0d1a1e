use crate::math::{DensityGrid, Raster};
use crate::model::{GeoBounds, GeoPoint};
use crate::render::marker::PointMarker;
use crate::render::surface::{MapSurface, MarkerHandle, OverlayHandle};
use crate::telemetry::LogManager;

pub const DEFAULT_RADIUS: f32 = 25.0;
pub const DEFAULT_BLUR: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatLayerOptions {
    pub radius: f32,
    pub blur: f32,
    /// Weight that maps to full intensity; the largest point weight when unset.
    pub max_intensity: Option<f64>,
    pub markers: bool,
}

impl Default for HeatLayerOptions {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            blur: DEFAULT_BLUR,
            max_intensity: None,
            markers: true,
        }
    }
}

/// Density overlay handed to a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatLayer {
    pub points: Vec<GeoPoint>,
    pub options: HeatLayerOptions,
    /// Points received before unplottable positions were dropped.
    pub source_count: usize,
}

impl HeatLayer {
    pub fn new(points: Vec<GeoPoint>, options: HeatLayerOptions) -> Self {
        let source_count = points.len();
        let points = points
            .into_iter()
            .filter(GeoPoint::is_plottable)
            .collect();
        Self {
            points,
            options,
            source_count,
        }
    }

    pub fn density(&self, bounds: &GeoBounds, cols: usize, rows: usize, cell_px: f32) -> DensityGrid {
        DensityGrid::rasterize(
            &self.points,
            bounds,
            Raster {
                cols,
                rows,
                cell_px,
                radius_px: self.options.radius,
                blur_px: self.options.blur,
            },
            self.options.max_intensity,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Attached { overlay: OverlayHandle, points: usize },
    /// No surface mounted yet; the points are kept for the next mount.
    Deferred,
}

/// Owns the overlay and markers drawn on a map surface.
///
/// At most one overlay is attached at any time. Every attachment is preceded
/// by detaching whatever this renderer attached before, and dropping the
/// renderer detaches everything it still owns.
pub struct HeatLayerRenderer<S: MapSurface> {
    surface: Option<S>,
    options: HeatLayerOptions,
    points: Option<Vec<GeoPoint>>,
    overlay: Option<OverlayHandle>,
    markers: Vec<(MarkerHandle, PointMarker)>,
    logger: LogManager,
}

impl<S: MapSurface> HeatLayerRenderer<S> {
    pub fn new(options: HeatLayerOptions) -> Self {
        Self {
            surface: None,
            options,
            points: None,
            overlay: None,
            markers: Vec::new(),
            logger: LogManager::new("heat-layer"),
        }
    }

    pub fn options(&self) -> &HeatLayerOptions {
        &self.options
    }

    /// Mounts a (possibly different) surface and re-renders the current
    /// points on it. Returns the previously mounted surface, already cleaned.
    pub fn mount(&mut self, surface: S) -> Option<S> {
        let previous = self.unmount();
        self.surface = Some(surface);
        self.attach_current();
        previous
    }

    /// Detaches everything and hands the surface back.
    pub fn unmount(&mut self) -> Option<S> {
        self.detach_all();
        self.surface.take()
    }

    pub fn render(&mut self, points: &[GeoPoint]) -> RenderOutcome {
        self.detach_all();
        self.points = Some(points.to_vec());
        match self.attach_current() {
            Some((overlay, points)) => RenderOutcome::Attached { overlay, points },
            None => {
                self.logger
                    .detail("no map surface mounted, deferring heat layer");
                RenderOutcome::Deferred
            }
        }
    }

    /// Removes the overlay and markers and forgets the points.
    pub fn clear(&mut self) {
        self.detach_all();
        self.points = None;
    }

    /// Moves hover to `target`, restyling the markers whose state changed.
    pub fn hover(&mut self, target: Option<MarkerHandle>) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        let mut changed = false;
        for (handle, marker) in &mut self.markers {
            let hovered = Some(*handle) == target;
            if marker.hovered != hovered {
                marker.hovered = hovered;
                surface.restyle_marker(*handle, marker);
                changed = true;
            }
        }
        changed
    }

    /// Opens the popup of `target` (closing any other), or closes it if it
    /// is already open.
    pub fn toggle_popup(&mut self, target: MarkerHandle) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        if !self.markers.iter().any(|(handle, _)| *handle == target) {
            return false;
        }
        for (handle, marker) in &mut self.markers {
            let open = *handle == target && !marker.popup_open;
            if marker.popup_open != open {
                marker.popup_open = open;
                surface.restyle_marker(*handle, marker);
            }
        }
        true
    }

    pub fn markers(&self) -> &[(MarkerHandle, PointMarker)] {
        &self.markers
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn attached_overlay(&self) -> Option<OverlayHandle> {
        self.overlay
    }

    fn attach_current(&mut self) -> Option<(OverlayHandle, usize)> {
        let surface = self.surface.as_mut()?;
        let points = self.points.as_ref()?;
        debug_assert!(self.overlay.is_none() && self.markers.is_empty());

        let layer = HeatLayer::new(points.clone(), self.options);
        let dropped = layer.source_count - layer.points.len();
        if dropped > 0 {
            self.logger
                .warn(&format!("dropped {dropped} point(s) with a position off the globe"));
        }
        if self.options.markers {
            self.markers = layer
                .points
                .iter()
                .map(|point| {
                    let marker = PointMarker::new(*point);
                    (surface.attach_marker(marker.clone()), marker)
                })
                .collect();
        }
        let count = layer.points.len();
        let overlay = surface.attach_overlay(layer);
        self.logger
            .detail(&format!("attached overlay {} with {count} point(s)", overlay.0));
        self.overlay = Some(overlay);
        Some((overlay, count))
    }

    fn detach_all(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            self.overlay = None;
            self.markers.clear();
            return;
        };
        if let Some(overlay) = self.overlay.take() {
            surface.detach_overlay(overlay);
        }
        for (handle, _) in self.markers.drain(..) {
            surface.detach_marker(handle);
        }
    }
}

impl<S: MapSurface> Drop for HeatLayerRenderer<S> {
    fn drop(&mut self) {
        self.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::LayerStore;
    use crate::testing::{RecordingSurface, SharedSurface, SurfaceOp};

    fn two_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(11.2, 123.1, 4.0),
            GeoPoint::new(11.3, 123.2, 2.0),
        ]
    }

    fn mounted() -> HeatLayerRenderer<LayerStore> {
        let mut renderer = HeatLayerRenderer::new(HeatLayerOptions::default());
        assert!(renderer.mount(LayerStore::new()).is_none());
        renderer
    }

    fn overlay_of(renderer: &HeatLayerRenderer<LayerStore>) -> &HeatLayer {
        let surface = renderer.surface().unwrap();
        surface.overlay(renderer.attached_overlay().unwrap()).unwrap()
    }

    #[test]
    fn two_points_attach_one_overlay_with_fixed_kernel() {
        let mut renderer = mounted();
        let outcome = renderer.render(&two_points());

        assert!(matches!(outcome, RenderOutcome::Attached { points: 2, .. }));
        let surface = renderer.surface().unwrap();
        assert_eq!(surface.overlay_count(), 1);
        assert_eq!(surface.marker_count(), 2);
        let layer = overlay_of(&renderer);
        assert_eq!(layer.options.radius, 25.0);
        assert_eq!(layer.options.blur, 15.0);
        assert_eq!(layer.points, two_points());
    }

    #[test]
    fn empty_input_attaches_an_empty_overlay() {
        let mut renderer = mounted();
        renderer.render(&two_points());
        let outcome = renderer.render(&[]);

        assert!(matches!(outcome, RenderOutcome::Attached { points: 0, .. }));
        let surface = renderer.surface().unwrap();
        assert_eq!(surface.overlay_count(), 1);
        assert_eq!(surface.marker_count(), 0);
        assert!(overlay_of(&renderer).points.is_empty());
    }

    #[test]
    fn successive_inputs_keep_exactly_one_overlay() {
        let mut renderer = HeatLayerRenderer::new(HeatLayerOptions::default());
        renderer.mount(RecordingSurface::default());
        let inputs = [
            two_points(),
            vec![GeoPoint::new(11.4, 123.4, 1.0)],
            Vec::new(),
            two_points(),
        ];
        for points in &inputs {
            renderer.render(points);
            assert_eq!(renderer.surface().unwrap().store().overlay_count(), 1);
        }
        let surface = renderer.surface().unwrap();
        let overlay = surface.store().overlay(renderer.attached_overlay().unwrap());
        assert_eq!(overlay.unwrap().points, two_points());

        // Each attach after the first is preceded by a detach.
        let mut attached = false;
        for op in surface.history() {
            match op {
                SurfaceOp::AttachOverlay(_) => {
                    assert!(!attached, "overlay attached twice without detach");
                    attached = true;
                }
                SurfaceOp::DetachOverlay(_) => attached = false,
                _ => {}
            }
        }
    }

    #[test]
    fn render_without_surface_is_deferred_until_mount() {
        let mut renderer: HeatLayerRenderer<LayerStore> =
            HeatLayerRenderer::new(HeatLayerOptions::default());
        assert_eq!(renderer.render(&two_points()), RenderOutcome::Deferred);
        assert!(renderer.attached_overlay().is_none());

        renderer.mount(LayerStore::new());
        assert!(renderer.attached_overlay().is_some());
        assert_eq!(renderer.surface().unwrap().overlay_count(), 1);
    }

    #[test]
    fn remount_moves_overlay_to_new_surface() {
        let mut renderer = mounted();
        renderer.render(&two_points());

        let old = renderer.mount(LayerStore::new()).unwrap();
        assert!(old.is_empty());
        assert_eq!(renderer.surface().unwrap().overlay_count(), 1);
    }

    #[test]
    fn clear_and_unmount_leave_nothing_attached() {
        let mut renderer = mounted();
        renderer.render(&two_points());
        renderer.clear();
        assert!(renderer.surface().unwrap().is_empty());

        renderer.render(&two_points());
        let surface = renderer.unmount().unwrap();
        assert!(surface.is_empty());
    }

    #[test]
    fn unplottable_positions_are_dropped() {
        let mut renderer = mounted();
        let outcome = renderer.render(&[
            GeoPoint::new(f64::NAN, 123.0, 1.0),
            GeoPoint::new(1e20, 123.0, 1.0),
            GeoPoint::new(11.2, -1e17, 1.0),
            GeoPoint::new(11.2, 123.1, 1.0),
        ]);
        assert!(matches!(outcome, RenderOutcome::Attached { points: 1, .. }));
        assert_eq!(overlay_of(&renderer).source_count, 4);
        assert_eq!(renderer.markers().len(), 1);
    }

    #[test]
    fn hover_and_popup_restyle_markers() {
        let mut renderer = mounted();
        renderer.render(&two_points());
        let first = renderer.markers()[0].0;
        let second = renderer.markers()[1].0;

        assert!(renderer.hover(Some(first)));
        assert!(!renderer.hover(Some(first)));
        let surface = renderer.surface().unwrap();
        assert_eq!(surface.marker(first).unwrap().style().radius, 10.0);

        assert!(renderer.hover(None));
        assert_eq!(renderer.surface().unwrap().marker(first).unwrap().style().radius, 7.0);

        renderer.toggle_popup(first);
        renderer.toggle_popup(second);
        let surface = renderer.surface().unwrap();
        assert!(!surface.marker(first).unwrap().popup_open);
        assert!(surface.marker(second).unwrap().popup_text().is_some());

        renderer.toggle_popup(second);
        assert!(renderer.surface().unwrap().marker(second).unwrap().popup_text().is_none());
    }

    #[test]
    fn markers_can_be_disabled() {
        let mut renderer = HeatLayerRenderer::new(HeatLayerOptions {
            markers: false,
            ..HeatLayerOptions::default()
        });
        renderer.mount(LayerStore::new());
        renderer.render(&two_points());
        assert_eq!(renderer.surface().unwrap().marker_count(), 0);
    }

    #[test]
    fn dropping_the_renderer_detaches_everything() {
        let shared = SharedSurface::default();
        {
            let mut renderer = HeatLayerRenderer::new(HeatLayerOptions::default());
            renderer.mount(shared.clone());
            renderer.render(&two_points());
            assert_eq!(shared.overlay_count(), 1);
        }
        assert_eq!(shared.overlay_count(), 0);
        assert_eq!(shared.marker_count(), 0);
    }

    #[test]
    fn density_uses_layer_kernel() {
        let layer = HeatLayer::new(two_points(), HeatLayerOptions::default());
        let grid = layer.density(&GeoBounds::VISAYAN_SEA, 40, 40, 5.0);
        assert!(grid.peak() > 0.99);
    }
}
