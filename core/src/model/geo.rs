use serde::{Deserialize, Serialize};

/// Weighted geographic sample consumed by the heat-layer renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "GeoPointRepr")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub abundance: f64,
}

impl GeoPoint {
    /// Abundance is clamped to a finite, non-negative weight.
    pub fn new(lat: f64, lng: f64, abundance: f64) -> Self {
        let abundance = if abundance.is_finite() {
            abundance.max(0.0)
        } else {
            0.0
        };
        Self {
            lat,
            lng,
            abundance,
        }
    }

    /// Finite and on the globe: latitude within ±90, longitude within ±180.
    pub fn is_plottable(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Wire forms accepted for a point: `[lat, lng, abundance]` or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeoPointRepr {
    Triple(f64, f64, f64),
    Object {
        #[serde(alias = "latitude")]
        lat: f64,
        #[serde(alias = "lon", alias = "longitude")]
        lng: f64,
        #[serde(default, alias = "abundance_value", alias = "weight")]
        abundance: f64,
    },
}

impl From<GeoPointRepr> for GeoPoint {
    fn from(repr: GeoPointRepr) -> Self {
        match repr {
            GeoPointRepr::Triple(lat, lng, abundance) => GeoPoint::new(lat, lng, abundance),
            GeoPointRepr::Object {
                lat,
                lng,
                abundance,
            } => GeoPoint::new(lat, lng, abundance),
        }
    }
}

/// Latitude/longitude rectangle used as a map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Northern Iloilo, Visayan Sea: the default map before any prediction.
    pub const VISAYAN_SEA: GeoBounds = GeoBounds {
        south: 11.0,
        west: 123.0,
        north: 11.5,
        east: 123.5,
    };

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }

    /// Smallest box holding every plottable point, padded by `margin` degrees.
    /// Falls back to the default view when nothing is plottable.
    pub fn fit(points: &[GeoPoint], margin: f64) -> Self {
        let mut finite = points.iter().filter(|p| p.is_plottable());
        let Some(first) = finite.next() else {
            return Self::VISAYAN_SEA;
        };

        let mut bounds = GeoBounds {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        for point in finite {
            bounds.south = bounds.south.min(point.lat);
            bounds.north = bounds.north.max(point.lat);
            bounds.west = bounds.west.min(point.lng);
            bounds.east = bounds.east.max(point.lng);
        }

        let margin = margin.max(0.0);
        GeoBounds {
            south: bounds.south - margin,
            west: bounds.west - margin,
            north: bounds.north + margin,
            east: bounds.east + margin,
        }
    }

    /// Maps a coordinate to `0..=1` fractions of the viewport, y growing south.
    pub fn normalize(&self, lat: f64, lng: f64) -> (f64, f64) {
        let width = self.width();
        let height = self.height();
        let x = if width > 0.0 {
            (lng - self.west) / width
        } else {
            0.5
        };
        let y = if height > 0.0 {
            (self.north - lat) / height
        } else {
            0.5
        };
        (x, y)
    }

    pub fn denormalize(&self, x: f64, y: f64) -> (f64, f64) {
        (self.north - y * self.height(), self.west + x * self.width())
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::VISAYAN_SEA
    }
}
