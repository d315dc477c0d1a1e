pub mod heat;
pub mod legend;
pub mod marker;
pub mod surface;

pub use heat::{HeatLayer, HeatLayerOptions, HeatLayerRenderer, RenderOutcome};
pub use legend::{heat_color, AbundanceBand, Rgb};
pub use marker::{MarkerStyle, PointMarker};
pub use surface::{LayerStore, MapSurface, MarkerHandle, OverlayHandle};
