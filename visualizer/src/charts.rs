use base64::Engine as _;
use iced::widget::{image, svg};
use reqwest::Url;

/// Largest chart body accepted, inline or fetched.
pub const MAX_CHART_BYTES: usize = 4 * 1024 * 1024;

/// A decoded hotspot chart ready for an iced widget.
#[derive(Debug, Clone)]
pub enum ChartImage {
    Raster(image::Handle),
    Vector(svg::Handle),
}

#[derive(Debug, Clone)]
pub enum ChartStatus {
    Loading,
    Ready(ChartImage),
    Unavailable(String),
}

/// Where the bytes of a chart URL come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    Inline { mime: String, bytes: Vec<u8> },
    Remote(Url),
}

/// Classifies `url`: `data:` URLs are decoded in place, absolute http(s)
/// URLs are fetched as-is, and anything else is resolved against `base`.
pub fn resolve(url: &str, base: &str) -> Result<ChartSource, String> {
    let url = url.trim();
    if let Some(rest) = url.strip_prefix("data:") {
        let (mime, bytes) = decode_data_url(rest)?;
        return Ok(ChartSource::Inline { mime, bytes });
    }

    let absolute = match Url::parse(url) {
        Ok(absolute) => absolute,
        Err(_) => {
            let mut base = Url::parse(base).map_err(|err| format!("chart base {base:?}: {err}"))?;
            if !base.path().ends_with('/') {
                base.set_path(&format!("{}/", base.path()));
            }
            base.join(url.trim_start_matches('/'))
                .map_err(|err| format!("chart url {url:?}: {err}"))?
        }
    };
    match absolute.scheme() {
        "http" | "https" => Ok(ChartSource::Remote(absolute)),
        other => Err(format!("unsupported chart scheme {other:?}")),
    }
}

/// Splits `<mime>[;base64],<payload>` (the part after `data:`).
fn decode_data_url(rest: &str) -> Result<(String, Vec<u8>), String> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data url without payload".to_string())?;
    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    let bytes = if params.any(|param| param.trim().eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|err| format!("bad base64 chart: {err}"))?
    } else {
        payload.as_bytes().to_vec()
    };
    if bytes.len() > MAX_CHART_BYTES {
        return Err(format!("chart of {} bytes is too large", bytes.len()));
    }
    Ok((mime, bytes))
}

fn looks_like_svg(mime: &str, bytes: &[u8]) -> bool {
    if mime.contains("svg") {
        return true;
    }
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let head = &bytes[start..];
    head.starts_with(b"<svg") || head.starts_with(b"<?xml")
}

pub fn to_image(mime: &str, bytes: Vec<u8>) -> ChartImage {
    if looks_like_svg(mime, &bytes) {
        ChartImage::Vector(svg::Handle::from_memory(bytes))
    } else {
        ChartImage::Raster(image::Handle::from_bytes(bytes))
    }
}

pub async fn load(http: reqwest::Client, url: String, base: String) -> Result<ChartImage, String> {
    match resolve(&url, &base)? {
        ChartSource::Inline { mime, bytes } => Ok(to_image(&mime, bytes)),
        ChartSource::Remote(target) => {
            let response = http
                .get(target.clone())
                .send()
                .await
                .map_err(|err| err.to_string())?;
            let status = response.status();
            if !status.is_success() {
                return Err(format!("{target}: {status}"));
            }
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let bytes = response.bytes().await.map_err(|err| err.to_string())?;
            if bytes.len() > MAX_CHART_BYTES {
                return Err(format!("chart of {} bytes is too large", bytes.len()));
            }
            Ok(to_image(&mime, bytes.to_vec()))
        }
    }
}
