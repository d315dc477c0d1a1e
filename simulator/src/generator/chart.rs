use std::fmt::Write;

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 432.0;
const MARGIN: f64 = 56.0;

/// Renders a monthly abundance series as a standalone SVG line chart.
pub fn line_chart_svg(title: &str, points: &[(String, f64)]) -> String {
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let max = points
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let step = if points.len() > 1 {
        plot_w / (points.len() - 1) as f64
    } else {
        0.0
    };
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, (_, value))| {
            (
                MARGIN + step * index as f64,
                MARGIN + plot_h * (1.0 - value / max),
            )
        })
        .collect();

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = write!(
        svg,
        r#"<text x="{}" y="28" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );
    let _ = write!(
        svg,
        r#"<path d="M{MARGIN} {MARGIN} V{} H{}" stroke="black" fill="none"/>"#,
        HEIGHT - MARGIN,
        WIDTH - MARGIN
    );
    let _ = write!(
        svg,
        r#"<text x="14" y="{}" transform="rotate(-90 14 {})" font-family="sans-serif" font-size="12" text-anchor="middle">Squid Abundance (kg)</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    );

    if !coords.is_empty() {
        let polyline = coords
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            r#"<polyline points="{polyline}" fill="none" stroke="blue" stroke-width="2"/>"#
        );
    }
    for ((x, y), (label, value)) in coords.iter().zip(points) {
        let _ = write!(
            svg,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="blue"><title>{}: {value:.2}</title></circle>"#,
            escape(label)
        );
        let _ = write!(
            svg,
            r#"<text x="{x:.1}" y="{}" transform="rotate(45 {x:.1} {})" font-family="sans-serif" font-size="10">{}</text>"#,
            HEIGHT - MARGIN + 14.0,
            HEIGHT - MARGIN + 14.0,
            escape(label)
        );
    }
    svg.push_str("</svg>");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
