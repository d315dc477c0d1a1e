use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const HOTSPOT_COUNT: usize = 19;
pub const LATITUDE_RANGE: (f64, f64) = (11.0, 12.0);
pub const LONGITUDE_RANGE: (f64, f64) = (123.0, 124.0);

/// Synthetic abundance profile of one hotspot, in kilograms per haul.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotProfile {
    pub hotspot_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub baseline: f64,
    /// Relative change per month.
    pub trend: f64,
    pub seasonal_amplitude: f64,
    /// Month (0-based) of the seasonal peak.
    pub peak_month: f64,
    pub noise: f64,
    pub depth_m: f64,
}

impl HotspotProfile {
    /// Abundance `months_ahead` months after the base month (1 = first
    /// forecast month). Never negative.
    pub fn abundance(&self, months_ahead: u32, seed: u64) -> f64 {
        let t = f64::from(months_ahead);
        let seasonal = self.seasonal_amplitude * (2.0 * PI * (t - self.peak_month) / 12.0).cos();
        let mut rng = StdRng::seed_from_u64(
            seed ^ (u64::from(self.hotspot_id) << 32) ^ u64::from(months_ahead),
        );
        let jitter = rng.gen_range(-self.noise..=self.noise);
        let value = self.baseline * (1.0 + self.trend * t) + seasonal + jitter;
        (value.max(0.0) * 100.0).round() / 100.0
    }

    pub fn series(&self, horizon: u32, seed: u64) -> Vec<f64> {
        (1..=horizon)
            .map(|months_ahead| self.abundance(months_ahead, seed))
            .collect()
    }
}

/// Deterministic set of hotspots inside the forecast area.
#[derive(Debug, Clone)]
pub struct HotspotCatalogue {
    seed: u64,
    hotspots: Vec<HotspotProfile>,
}

impl HotspotCatalogue {
    pub fn seeded(seed: u64) -> Self {
        Self::with_count(seed, HOTSPOT_COUNT)
    }

    pub fn with_count(seed: u64, count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let hotspots = (1..=count as u32)
            .map(|hotspot_id| HotspotProfile {
                hotspot_id,
                latitude: round4(rng.gen_range(LATITUDE_RANGE.0..LATITUDE_RANGE.1)),
                longitude: round4(rng.gen_range(LONGITUDE_RANGE.0..LONGITUDE_RANGE.1)),
                baseline: rng.gen_range(20.0..120.0),
                trend: rng.gen_range(-0.02..0.02),
                seasonal_amplitude: rng.gen_range(5.0..25.0),
                peak_month: rng.gen_range(0.0..12.0),
                noise: rng.gen_range(0.5..4.0),
                depth_m: rng.gen_range(15.0..80.0_f64).round(),
            })
            .collect();
        Self { seed, hotspots }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn hotspots(&self) -> &[HotspotProfile] {
        &self.hotspots
    }

    pub fn get(&self, hotspot_id: u32) -> Option<&HotspotProfile> {
        self.hotspots
            .iter()
            .find(|hotspot| hotspot.hotspot_id == hotspot_id)
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
