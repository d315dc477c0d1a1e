use crate::Message;
use iced::{
    mouse,
    widget::canvas::{self, Action, Event, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};
use squidcore::model::{GeoBounds, GeoPoint};
use squidcore::render::{heat_color, HeatLayer, LayerStore, MarkerHandle, PointMarker, Rgb};

const CELL_PX: f32 = 6.0;
const FIT_MARGIN_DEG: f64 = 0.05;
const GRATICULE_STEP_DEG: f64 = 0.1;
const MAX_GRATICULE_LINES: usize = 24;

/// Grid-line positions in `from..=to`, on a multiple of 0.1° widened until
/// at most `MAX_GRATICULE_LINES` remain.
fn graticule_lines(from: f64, to: f64) -> Vec<f64> {
    let span = to - from;
    if !span.is_finite() || span < 0.0 {
        return Vec::new();
    }
    let widen = (span / GRATICULE_STEP_DEG / MAX_GRATICULE_LINES as f64).ceil().max(1.0);
    let step = GRATICULE_STEP_DEG * widen;
    // Absorbs rounding so lines that sit exactly on an edge are kept.
    let slack = step * 1e-6;
    let first = ((from - slack) / step).ceil() * step;
    (0..=MAX_GRATICULE_LINES)
        .map(|index| first + index as f64 * step)
        .take_while(|value| *value <= to + slack)
        .collect()
}

fn color(rgb: Rgb, alpha: f32) -> Color {
    let [r, g, b] = rgb.to_f32();
    Color::from_rgba(r, g, b, alpha)
}

/// Canvas view of whatever the heat-layer renderer attached to its store.
#[derive(Clone)]
pub struct HeatMap {
    layer: Option<HeatLayer>,
    markers: Vec<(MarkerHandle, PointMarker)>,
    bounds: GeoBounds,
}

#[derive(Default)]
pub struct HeatMapState {
    hovered: Option<MarkerHandle>,
}

impl HeatMap {
    pub fn from_store(store: Option<&LayerStore>) -> Self {
        let layer = store
            .and_then(|store| store.overlays().next().map(|(_, layer)| layer.clone()));
        let markers: Vec<_> = store
            .map(|store| {
                store
                    .markers()
                    .map(|(handle, marker)| (handle, marker.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let bounds = match &layer {
            Some(layer) if !layer.points.is_empty() => {
                GeoBounds::fit(&layer.points, FIT_MARGIN_DEG)
            }
            _ => GeoBounds::VISAYAN_SEA,
        };
        Self {
            layer,
            markers,
            bounds,
        }
    }

    fn project(&self, point: &GeoPoint, size: Size) -> Point {
        let (x, y) = self.bounds.normalize(point.lat, point.lng);
        Point::new(x as f32 * size.width, y as f32 * size.height)
    }

    fn marker_at(&self, position: Point, size: Size) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .rev()
            .find(|(_, marker)| {
                let center = self.project(&marker.point, size);
                center.distance(position) <= marker.style().radius
            })
            .map(|(handle, _)| *handle)
    }

    fn draw_graticule(&self, frame: &mut Frame, size: Size) {
        let grid = Stroke::default()
            .with_width(1.0)
            .with_color(Color::from_rgb(0.2, 0.27, 0.35));
        let label = Color::from_rgb(0.45, 0.55, 0.65);

        for lat in graticule_lines(self.bounds.south, self.bounds.north) {
            let (_, y) = self.bounds.normalize(lat, self.bounds.west);
            let y = y as f32 * size.height;
            frame.stroke(
                &Path::line(Point::new(0.0, y), Point::new(size.width, y)),
                grid,
            );
            frame.fill_text(canvas::Text {
                content: format!("{lat:.1}°N"),
                position: Point::new(4.0, y + 2.0),
                color: label,
                size: 10.0.into(),
                ..canvas::Text::default()
            });
        }

        for lng in graticule_lines(self.bounds.west, self.bounds.east) {
            let (x, _) = self.bounds.normalize(self.bounds.south, lng);
            let x = x as f32 * size.width;
            frame.stroke(
                &Path::line(Point::new(x, 0.0), Point::new(x, size.height)),
                grid,
            );
            frame.fill_text(canvas::Text {
                content: format!("{lng:.1}°E"),
                position: Point::new(x + 2.0, size.height - 14.0),
                color: label,
                size: 10.0.into(),
                ..canvas::Text::default()
            });
        }
    }

    fn draw_heat(&self, frame: &mut Frame, size: Size) {
        let Some(layer) = &self.layer else {
            return;
        };
        let cols = (size.width / CELL_PX).ceil() as usize;
        let rows = (size.height / CELL_PX).ceil() as usize;
        let grid = layer.density(&self.bounds, cols, rows, CELL_PX);
        for (row, col, intensity) in grid.hot_cells() {
            frame.fill_rectangle(
                Point::new(col as f32 * CELL_PX, row as f32 * CELL_PX),
                Size::new(CELL_PX, CELL_PX),
                color(heat_color(intensity), (intensity * 0.85).min(0.85)),
            );
        }
    }

    fn draw_markers(&self, frame: &mut Frame, size: Size) {
        for (_, marker) in &self.markers {
            let style = marker.style();
            let center = self.project(&marker.point, size);
            let circle = Path::circle(center, style.radius);
            frame.fill(&circle, color(style.fill, style.fill_opacity));
            frame.stroke(
                &circle,
                Stroke::default()
                    .with_width(style.stroke_width)
                    .with_color(color(style.stroke, 1.0)),
            );
        }

        // Popups go last so they sit above every marker.
        for (_, marker) in &self.markers {
            let Some(body) = marker.popup_text() else {
                continue;
            };
            let anchor = self.project(&marker.point, size);
            let origin = Point::new(
                (anchor.x + 12.0).min(size.width - 170.0).max(0.0),
                (anchor.y - 56.0).max(0.0),
            );
            frame.fill_rectangle(origin, Size::new(168.0, 52.0), Color::from_rgba(0.0, 0.0, 0.0, 0.8));
            frame.fill_text(canvas::Text {
                content: body,
                position: Point::new(origin.x + 6.0, origin.y + 4.0),
                color: Color::WHITE,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }
    }
}

impl canvas::Program<Message> for HeatMap {
    type State = HeatMapState;

    fn update(
        &self,
        state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<Message>> {
        let Event::Mouse(mouse_event) = event else {
            return None;
        };
        let target = cursor
            .position_in(bounds)
            .and_then(|position| self.marker_at(position, bounds.size()));
        match mouse_event {
            mouse::Event::CursorMoved { .. } | mouse::Event::CursorLeft => {
                if target == state.hovered {
                    return None;
                }
                state.hovered = target;
                Some(Action::publish(Message::MarkerHovered(target)))
            }
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                target.map(|handle| Action::publish(Message::MarkerClicked(handle)).and_capture())
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let size = bounds.size();
        let mut frame = Frame::new(renderer, size);
        frame.fill_rectangle(Point::ORIGIN, size, Color::from_rgb(0.05, 0.1, 0.18));
        self.draw_graticule(&mut frame, size);
        self.draw_heat(&mut frame, size);
        self.draw_markers(&mut frame, size);
        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        _bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.hovered.is_some() {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Monthly abundance series of one hotspot.
#[derive(Clone)]
pub struct SeriesChart {
    values: Vec<f64>,
}

impl SeriesChart {
    pub fn new(series: &[(String, f64)]) -> Self {
        Self {
            values: series.iter().map(|(_, value)| *value).collect(),
        }
    }
}

impl canvas::Program<Message> for SeriesChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        if self.values.len() > 1 {
            let min = self.values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = self.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let range = (max - min).max(1.0) as f32;
            let step = bounds.width / (self.values.len() as f32 - 1.0);
            let path = Path::new(|builder| {
                for (i, value) in self.values.iter().enumerate() {
                    let x = i as f32 * step;
                    let normalized = (*value - min) as f32 / range;
                    let y = bounds.height - normalized * bounds.height;
                    if i == 0 {
                        builder.move_to(Point::new(x, y));
                    } else {
                        builder.line_to(Point::new(x, y));
                    }
                }
            });

            frame.stroke(
                &path,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.18, 0.72, 0.89)),
            );
        }

        vec![frame.into_geometry()]
    }
}
