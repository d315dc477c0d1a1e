use crate::model::GeoPoint;
use crate::render::legend::Rgb;

pub const MARKER_RADIUS: f32 = 7.0;
pub const MARKER_HOVER_RADIUS: f32 = 10.0;

/// Circle marker drawn over one heat point. Its look and popup are derived
/// from the interaction flags only.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMarker {
    pub point: GeoPoint,
    pub hovered: bool,
    pub popup_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub fill: Rgb,
    pub fill_opacity: f32,
    pub stroke: Rgb,
    pub stroke_width: f32,
}

impl PointMarker {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            hovered: false,
            popup_open: false,
        }
    }

    pub fn style(&self) -> MarkerStyle {
        let (radius, fill) = if self.hovered {
            (MARKER_HOVER_RADIUS, Rgb::ORANGE)
        } else {
            (MARKER_RADIUS, Rgb::RED)
        };
        MarkerStyle {
            radius,
            fill,
            fill_opacity: 0.8,
            stroke: Rgb::STROKE_ORANGE,
            stroke_width: 1.0,
        }
    }

    /// Popup body, one `label: value` per line. `None` while closed.
    pub fn popup_text(&self) -> Option<String> {
        self.popup_open.then(|| {
            format!(
                "Latitude: {}\nLongitude: {}\nAbundance: {}",
                self.point.lat, self.point.lng, self.point.abundance
            )
        })
    }
}
