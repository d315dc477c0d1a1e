use crate::generator::chart::line_chart_svg;
use crate::generator::profile::{HotspotCatalogue, HotspotProfile};
use crate::workflow::config::ServiceConfig;
use anyhow::Context;
use serde_json::Value;
use squidcore::model::response::month_title;
use squidcore::model::{
    HeatmapFragment, HotspotDetail, Month, PredictionRequest, PredictionResponse,
};
use std::collections::BTreeMap;

/// Longest forecast the service agrees to compute.
pub const MAX_HORIZON_MONTHS: u32 = 120;
/// Months returned as heat layers, counted back from the requested month.
pub const DISPLAY_MONTHS: u32 = 12;

/// Computes synthetic forecasts over the hotspot catalogue.
#[derive(Clone)]
pub struct Forecaster {
    config: ServiceConfig,
    catalogue: HotspotCatalogue,
}

impl Forecaster {
    pub fn new(config: ServiceConfig) -> Self {
        let catalogue = HotspotCatalogue::seeded(config.seed);
        Self { config, catalogue }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &HotspotCatalogue {
        &self.catalogue
    }

    /// Months from January of the base year up to the requested month;
    /// zero for months before it.
    pub fn horizon(&self, request: &PredictionRequest) -> anyhow::Result<u32> {
        let months = i64::from(request.year() - self.config.base_year) * 12
            + i64::from(request.month());
        if months <= 0 {
            return Ok(0);
        }
        anyhow::ensure!(
            months <= i64::from(MAX_HORIZON_MONTHS),
            "forecast horizon of {months} months exceeds {MAX_HORIZON_MONTHS}"
        );
        Ok(months as u32)
    }

    pub fn forecast(&self, request: &PredictionRequest) -> anyhow::Result<PredictionResponse> {
        let horizon = self.horizon(request)?;
        if horizon == 0 {
            return Ok(PredictionResponse::default());
        }

        let first_shown = horizon.saturating_sub(DISPLAY_MONTHS - 1).max(1);
        let mut heatmaps = Vec::new();
        let mut details = BTreeMap::new();
        for months_ahead in first_shown..=horizon {
            let title = self.title_for(months_ahead);
            let month_details: Vec<HotspotDetail> = self
                .catalogue
                .hotspots()
                .iter()
                .map(|hotspot| self.detail(hotspot, months_ahead))
                .collect();
            heatmaps.push(HeatmapFragment::Layer {
                title: Some(title.clone()),
                points: month_details.iter().map(HotspotDetail::to_point).collect(),
            });
            details.insert(title, month_details);
        }

        let graphs = self
            .catalogue
            .hotspots()
            .iter()
            .map(|hotspot| {
                (
                    format!("{},{}", hotspot.latitude, hotspot.longitude),
                    self.config
                        .chart_url(hotspot.hotspot_id, request.year(), request.month()),
                )
            })
            .collect();

        Ok(PredictionResponse {
            graphs,
            heatmap_fragments: heatmaps,
            hotspot_details: Some(
                serde_json::to_value(details).context("encoding hotspot details")?,
            ),
        })
    }

    /// SVG chart of one hotspot's series up to the requested month.
    pub fn chart(&self, hotspot_id: u32, request: &PredictionRequest) -> anyhow::Result<Option<String>> {
        let Some(hotspot) = self.catalogue.get(hotspot_id) else {
            return Ok(None);
        };
        let horizon = self.horizon(request)?;
        let series: Vec<(String, f64)> = hotspot
            .series(horizon, self.catalogue.seed())
            .into_iter()
            .enumerate()
            .map(|(index, value)| (self.title_for(index as u32 + 1), value))
            .collect();
        let title = format!(
            "Predicted Squid Abundance at Hotspot ({}, {})",
            hotspot.latitude, hotspot.longitude
        );
        Ok(Some(line_chart_svg(&title, &series)))
    }

    fn detail(&self, hotspot: &HotspotProfile, months_ahead: u32) -> HotspotDetail {
        let mut extra = BTreeMap::new();
        extra.insert("depth_m".to_string(), Value::from(hotspot.depth_m));
        HotspotDetail {
            hotspot_id: hotspot.hotspot_id.to_string(),
            latitude: hotspot.latitude,
            longitude: hotspot.longitude,
            abundance_value: hotspot.abundance(months_ahead, self.catalogue.seed()),
            extra,
        }
    }

    fn title_for(&self, months_ahead: u32) -> String {
        let offset = months_ahead.saturating_sub(1);
        let year = self.config.base_year + (offset / 12) as i32;
        let month = Month::ALL[(offset % 12) as usize];
        month_title(year, month)
    }
}
