use crate::model::geo::GeoPoint;
use crate::model::request::Month;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Success body of `POST /predict`. Everything in it is untrusted input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Chart URL per hotspot key; entries whose value is not a string are
    /// dropped while decoding.
    #[serde(default, deserialize_with = "string_entries")]
    pub graphs: BTreeMap<String, String>,
    #[serde(default, rename = "heatmaps", deserialize_with = "null_as_default")]
    pub heatmap_fragments: Vec<HeatmapFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot_details: Option<Value>,
}

/// One entry of the `heatmaps` list, usually one forecast month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeatmapFragment {
    Points(Vec<GeoPoint>),
    Layer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        points: Vec<GeoPoint>,
    },
    /// Server-rendered markup. Kept verbatim, never interpreted.
    Markup(String),
    /// Any other JSON value. Kept, never interpreted.
    Other(Value),
}

impl HeatmapFragment {
    /// Markup and unrecognised entries: carried along but never drawn.
    pub fn is_withheld(&self) -> bool {
        matches!(self, HeatmapFragment::Markup(_) | HeatmapFragment::Other(_))
    }

    pub fn structured_points(&self) -> Option<&[GeoPoint]> {
        match self {
            HeatmapFragment::Points(points) | HeatmapFragment::Layer { points, .. } => {
                Some(points)
            }
            HeatmapFragment::Markup(_) | HeatmapFragment::Other(_) => None,
        }
    }
}

/// Per-hotspot metadata reported for one forecast month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotDetail {
    #[serde(deserialize_with = "string_or_number")]
    pub hotspot_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub abundance_value: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HotspotDetail {
    pub fn to_point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude, self.abundance_value)
    }
}

/// `hotspot_details` entry for one month, ordered chronologically.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailMonth {
    pub title: String,
    pub period: Option<(i32, Month)>,
    pub details: Vec<HotspotDetail>,
}

/// Chart-list row for one hotspot key of `graphs`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub hotspot_id: String,
    pub image_url: String,
    pub coordinates: Option<(f64, f64)>,
    pub series: Vec<(String, f64)>,
}

impl PredictionResponse {
    pub fn is_empty(&self) -> bool {
        self.heatmap_fragments.is_empty() && self.graphs.is_empty()
    }

    /// Interprets `hotspot_details` as `title -> [detail]`; entries that do
    /// not have that shape are skipped rather than failing the response.
    pub fn detail_months(&self) -> Vec<DetailMonth> {
        let Some(Value::Object(months)) = &self.hotspot_details else {
            return Vec::new();
        };

        let mut parsed = months
            .iter()
            .filter_map(|(title, entries)| {
                let Value::Array(entries) = entries else {
                    return None;
                };
                let details = entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect();
                Some(DetailMonth {
                    title: title.clone(),
                    period: parse_month_title(title),
                    details,
                })
            })
            .collect::<Vec<_>>();

        // Unparseable titles go last, in title order.
        parsed.sort_by(|a, b| match (a.period, b.period) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.title.cmp(&b.title),
        });
        parsed
    }

    /// Points to draw for fragment `index`. Withheld fragments fall back to
    /// the structured details of the same month.
    pub fn fragment_points(&self, index: usize) -> Vec<GeoPoint> {
        match self.heatmap_fragments.get(index) {
            Some(fragment) => match fragment.structured_points() {
                Some(points) => points.to_vec(),
                None => self
                    .detail_months()
                    .get(index)
                    .map(|month| month.details.iter().map(HotspotDetail::to_point).collect())
                    .unwrap_or_default(),
            },
            None => Vec::new(),
        }
    }

    pub fn fragment_title(&self, index: usize) -> Option<String> {
        match self.heatmap_fragments.get(index)? {
            HeatmapFragment::Layer {
                title: Some(title), ..
            } => Some(title.clone()),
            _ => self
                .detail_months()
                .get(index)
                .map(|month| month.title.clone()),
        }
    }

    pub fn chart_entries(&self) -> Vec<ChartEntry> {
        let months = self.detail_months();
        self.graphs
            .iter()
            .map(|(key, url)| {
                let coordinates = parse_coordinate_key(key);
                let series = months
                    .iter()
                    .filter_map(|month| {
                        month
                            .details
                            .iter()
                            .find(|detail| detail_matches(detail, key, coordinates))
                            .map(|detail| (month.title.clone(), detail.abundance_value))
                    })
                    .collect();
                ChartEntry {
                    hotspot_id: key.clone(),
                    image_url: url.clone(),
                    coordinates,
                    series,
                }
            })
            .collect()
    }
}

fn detail_matches(detail: &HotspotDetail, key: &str, coordinates: Option<(f64, f64)>) -> bool {
    if detail.hotspot_id == key {
        return true;
    }
    coordinates.is_some_and(|(lat, lng)| {
        (detail.latitude - lat).abs() < 1e-6 && (detail.longitude - lng).abs() < 1e-6
    })
}

/// Parses `"11.25,123.4"` style graph keys.
pub fn parse_coordinate_key(key: &str) -> Option<(f64, f64)> {
    let (lat, lng) = key.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
}

/// Parses `"Jan 2024"` month titles.
pub fn parse_month_title(title: &str) -> Option<(i32, Month)> {
    let mut parts = title.split_whitespace();
    let month = Month::from_abbreviation(parts.next()?)?;
    let year = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((year, month))
}

pub fn month_title(year: i32, month: Month) -> String {
    format!("{} {}", month.abbreviation(), year)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(url) => Some((key, url)),
            _ => None,
        })
        .collect())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "hotspot id must be a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> PredictionResponse {
        serde_json::from_value(json!({
            "graphs": {
                "11.2,123.1": "data:image/png;base64,AAAA",
                "11.3,123.2": "https://charts.example/2.png"
            },
            "heatmaps": ["<div>m1</div>", "<div>m2</div>"],
            "hotspot_details": {
                "Feb 2024": [
                    {"hotspot_id": 1, "latitude": 11.2, "longitude": 123.1, "abundance_value": 4.0, "depth_m": 40}
                ],
                "Jan 2024": [
                    {"hotspot_id": 1, "latitude": 11.2, "longitude": 123.1, "abundance_value": 3.0},
                    {"hotspot_id": 2, "latitude": 11.3, "longitude": 123.2, "abundance_value": 1.0}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn missing_and_null_fields_default_to_empty() {
        let response: PredictionResponse =
            serde_json::from_value(json!({"heatmaps": ["<div>ok</div>"], "graphs": null})).unwrap();
        assert!(response.graphs.is_empty());
        assert_eq!(
            response.heatmap_fragments,
            vec![HeatmapFragment::Markup("<div>ok</div>".into())]
        );
        assert!(response.hotspot_details.is_none());

        let empty: PredictionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn fragments_accept_points_layers_and_markup() {
        let response: PredictionResponse = serde_json::from_value(json!({
            "heatmaps": [
                [[11.2, 123.1, 5.0]],
                {"title": "Mar 2024", "points": [{"lat": 11.3, "lng": 123.2, "abundance": 2.0}]},
                "<div>raw</div>"
            ]
        }))
        .unwrap();

        assert_eq!(
            response.fragment_points(0),
            vec![GeoPoint::new(11.2, 123.1, 5.0)]
        );
        assert_eq!(response.fragment_title(1).as_deref(), Some("Mar 2024"));
        assert!(response.heatmap_fragments[2].is_withheld());
        assert!(response.fragment_points(2).is_empty());
        assert!(response.fragment_points(7).is_empty());
    }

    #[test]
    fn odd_entries_do_not_sink_the_response() {
        let response: PredictionResponse = serde_json::from_value(json!({
            "heatmaps": ["<div>ok</div>", 42, {"html": "<p>x</p>"}, [[11.2, 123.1, 1.0]]],
            "graphs": {
                "11.2,123.1": "https://charts.example/1.png",
                "11.3,123.2": null,
                "11.4,123.3": {"url": "nested"}
            }
        }))
        .unwrap();

        assert_eq!(response.heatmap_fragments.len(), 4);
        assert_eq!(response.heatmap_fragments[1], HeatmapFragment::Other(json!(42)));
        assert!(response.heatmap_fragments[1].is_withheld());
        assert!(response.heatmap_fragments[2].is_withheld());
        assert!(response.fragment_points(1).is_empty());
        assert_eq!(response.fragment_points(3).len(), 1);

        assert_eq!(response.graphs.len(), 1);
        assert_eq!(response.chart_entries()[0].hotspot_id, "11.2,123.1");
    }

    #[test]
    fn graphs_that_are_not_an_object_still_fail() {
        let result = serde_json::from_value::<PredictionResponse>(json!({"graphs": [1, 2]}));
        assert!(result.is_err());
    }

    #[test]
    fn detail_months_are_chronological_and_back_markup_fragments() {
        let response = sample_response();
        let months = response.detail_months();
        assert_eq!(months[0].title, "Jan 2024");
        assert_eq!(months[1].title, "Feb 2024");
        assert_eq!(months[1].details[0].extra.get("depth_m"), Some(&json!(40)));

        assert_eq!(response.fragment_points(0).len(), 2);
        assert_eq!(response.fragment_title(1).as_deref(), Some("Feb 2024"));
    }

    #[test]
    fn chart_entries_carry_coordinates_and_series() {
        let entries = sample_response().chart_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hotspot_id, "11.2,123.1");
        assert_eq!(entries[0].coordinates, Some((11.2, 123.1)));
        assert_eq!(
            entries[0].series,
            vec![("Jan 2024".to_string(), 3.0), ("Feb 2024".to_string(), 4.0)]
        );
        assert_eq!(entries[1].series.len(), 1);
    }

    #[test]
    fn malformed_details_are_skipped() {
        let response: PredictionResponse = serde_json::from_value(json!({
            "hotspot_details": {"Jan 2024": "oops", "Feb 2024": [{"hotspot_id": true}]}
        }))
        .unwrap();
        let months = response.detail_months();
        assert_eq!(months.len(), 1);
        assert!(months[0].details.is_empty());
    }

    #[test]
    fn month_titles_parse() {
        assert_eq!(parse_month_title("Jan 2024"), Some((2024, Month::January)));
        assert_eq!(parse_month_title("Foo 2024"), None);
        assert_eq!(month_title(2025, Month::March), "Mar 2025");
        assert_eq!(parse_coordinate_key("11.2, 123.1"), Some((11.2, 123.1)));
        assert_eq!(parse_coordinate_key("hotspot-1"), None);
    }
}
