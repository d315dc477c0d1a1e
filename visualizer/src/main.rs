use charts::{ChartImage, ChartStatus};
use iced::{
    widget::{
        button, canvas::Canvas, column, container, image, pick_list, row, scrollable, svg, text,
        Column, Container,
    },
    Alignment, Color, Element, Length, Task, Theme,
};
use map::{HeatMap, SeriesChart};
use squidcore::client::{ClientConfig, HttpPredictionClient};
use squidcore::lifecycle::{Applied, Presentation, Resolution, TriggerOutcome};
use squidcore::model::{ChartEntry, Month};
use squidcore::render::{
    AbundanceBand, HeatLayerOptions, HeatLayerRenderer, LayerStore, MarkerHandle,
};
use squidcore::lifecycle::RequestLifecycleController;
use std::collections::HashMap;

mod charts;
mod map;

const HISTORY_LIMIT: usize = 20;
const DEFAULT_REGION: &str = "Northern Iloilo, Visayan Sea";

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Squid Abundance Forecaster".into()
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

struct Visualizer {
    controller: RequestLifecycleController<HttpPredictionClient>,
    renderer: HeatLayerRenderer<LayerStore>,
    http: reqwest::Client,
    chart_base: String,
    charts: HashMap<String, ChartStatus>,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    YearSelected(i32),
    MonthSelected(Month),
    Predict,
    Confirm,
    Abandon,
    Resolved(Resolution),
    FragmentSelected(usize),
    MarkerHovered(Option<MarkerHandle>),
    MarkerClicked(MarkerHandle),
    ChartLoaded(String, Result<ChartImage, String>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let config = ClientConfig::from_env();
        log::info!(
            "prediction endpoint {} (deadline {} ms)",
            config.base_url,
            config.timeout_ms
        );
        let controller = RequestLifecycleController::new(HttpPredictionClient::new(&config));
        let mut renderer = HeatLayerRenderer::new(HeatLayerOptions::default());
        renderer.mount(LayerStore::new());
        (
            Visualizer {
                controller,
                renderer,
                http: reqwest::Client::new(),
                chart_base: config.base_url.clone(),
                charts: HashMap::new(),
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::YearSelected(year) => {
                if let Err(err) = state.controller.select_year(year) {
                    log::warn!("{err}");
                }
                Task::none()
            }
            Message::MonthSelected(month) => {
                if let Err(err) = state.controller.select_month(month.number()) {
                    log::warn!("{err}");
                }
                Task::none()
            }
            Message::Predict => {
                match state.controller.trigger_predict() {
                    TriggerOutcome::AwaitingConfirmation => {
                        state.controller.feed_renderer(&mut state.renderer);
                        state.charts.clear();
                    }
                    TriggerOutcome::AlreadyInFlight => {
                        state.push_history("Prediction already running".into());
                    }
                    TriggerOutcome::Ignored => {}
                }
                Task::none()
            }
            Message::Abandon => {
                if state.controller.abandon() {
                    state.push_history("Prediction cancelled".into());
                }
                Task::none()
            }
            Message::Confirm => match state.controller.confirm() {
                Some(pending) => {
                    let request = pending.request();
                    state.push_history(format!(
                        "{}: requesting {} {}",
                        pending.episode(),
                        request.month_name(),
                        request.year()
                    ));
                    Task::perform(pending.run(), Message::Resolved)
                }
                None => Task::none(),
            },
            Message::Resolved(resolution) => {
                let episode = resolution.episode();
                let applied = state.controller.apply(resolution);
                let entry = match applied {
                    Applied::Succeeded => format!("{episode}: forecast received"),
                    Applied::Failed => format!("{episode}: prediction failed"),
                    Applied::Discarded => format!("{episode}: stale result discarded"),
                };
                state.controller.feed_renderer(&mut state.renderer);
                state.push_history(entry);
                if applied == Applied::Succeeded {
                    state.load_charts()
                } else {
                    Task::none()
                }
            }
            Message::ChartLoaded(url, result) => {
                // Loads for a result that has since been replaced are dropped.
                if let Some(status) = state.charts.get_mut(&url) {
                    *status = match result {
                        Ok(image) => ChartStatus::Ready(image),
                        Err(err) => {
                            log::warn!("chart unavailable: {err}");
                            ChartStatus::Unavailable(err)
                        }
                    };
                }
                Task::none()
            }
            Message::FragmentSelected(index) => {
                if state.controller.select_fragment(index) {
                    state.controller.feed_renderer(&mut state.renderer);
                }
                Task::none()
            }
            Message::MarkerHovered(target) => {
                state.renderer.hover(target);
                Task::none()
            }
            Message::MarkerClicked(handle) => {
                state.renderer.toggle_popup(handle);
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let presentation = state.controller.presentation();
        let selection = state.controller.selection();

        let selectors = row![
            pick_list(
                state.controller.selection_range().years(),
                Some(selection.year),
                Message::YearSelected
            ),
            pick_list(Month::ALL, Some(selection.month), Message::MonthSelected),
            button("Predict")
                .on_press_maybe((!presentation.loading).then_some(Message::Predict))
                .padding(10),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut controls = column![text("Forecast").size(26), selectors]
            .spacing(10)
            .padding(16)
            .width(Length::Fixed(360.0));

        if let Some(lines) = presentation.confirmation {
            controls = controls.push(confirmation_panel(lines));
        }
        if presentation.loading {
            controls = controls.push(text("Generating prediction...").size(16));
        }
        if let Some(message) = &presentation.error_message {
            controls = controls.push(
                Container::new(text(message.clone()).size(14).color(Color::from_rgb(1.0, 0.4, 0.4)))
                    .padding(8),
            );
        }

        let metrics = state.controller.metrics().snapshot();
        controls = controls
            .push(legend())
            .push(
                text(format!(
                    "Requests: {} issued / {} ok / {} failed / {} discarded",
                    metrics.issued, metrics.succeeded, metrics.failed, metrics.discarded
                ))
                .size(12),
            )
            .push(text("Activity log").size(16))
            .push(
                Container::new(scrollable(state.history_list()).height(Length::Fixed(120.0)))
                    .padding(6),
            );

        let layout = row![controls, result_column(&presentation, state)]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn history_list(&self) -> Column<'_, Message> {
        if self.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            self.history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        }
    }

    fn load_charts(&mut self) -> Task<Message> {
        self.charts.clear();
        let Some(result) = self.controller.presentation().result else {
            return Task::none();
        };
        let mut tasks = Vec::new();
        for entry in result.charts {
            let url = entry.image_url;
            if self.charts.contains_key(&url) {
                continue;
            }
            self.charts.insert(url.clone(), ChartStatus::Loading);
            let load = charts::load(self.http.clone(), url.clone(), self.chart_base.clone());
            tasks.push(Task::perform(load, move |result| {
                Message::ChartLoaded(url.clone(), result)
            }));
        }
        Task::batch(tasks)
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

fn confirmation_panel(lines: &'static [&'static str]) -> Element<'static, Message> {
    let body = lines
        .iter()
        .fold(Column::new().spacing(6), |col, line| col.push(text(*line).size(13)));
    container(
        column![
            text("Before you continue").size(18),
            body,
            row![
                button("Continue").on_press(Message::Confirm).padding(8),
                button("Cancel").on_press(Message::Abandon).padding(8),
            ]
            .spacing(10),
        ]
        .spacing(10),
    )
    .padding(10)
    .style(container::rounded_box)
    .into()
}

fn legend() -> Element<'static, Message> {
    let entries = AbundanceBand::ALL.iter().fold(
        Column::new().spacing(4),
        |col, band| {
            let [r, g, b] = band.color().to_f32();
            col.push(
                row![
                    text("■").size(16).color(Color::from_rgb(r, g, b)),
                    text(band.label()).size(12),
                ]
                .spacing(6)
                .align_y(Alignment::Center),
            )
        },
    );
    column![text(AbundanceBand::TITLE).size(16), entries]
        .spacing(6)
        .into()
}

fn result_column<'a>(presentation: &Presentation, state: &'a Visualizer) -> Element<'a, Message> {
    let heading = match &presentation.result {
        Some(result) => result.title.clone(),
        None => DEFAULT_REGION.to_string(),
    };
    let heat_map = Canvas::new(HeatMap::from_store(state.renderer.surface()))
        .width(Length::Fill)
        .height(Length::Fixed(420.0));

    let mut result_column = column![text(heading).size(26), heat_map]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

    let Some(result) = &presentation.result else {
        return result_column.into();
    };

    if result.no_results {
        result_column = result_column.push(text("No results for this month.").size(14));
    }

    if let Some(active) = result.active_fragment {
        let previous = active.checked_sub(1).map(Message::FragmentSelected);
        let next = (active + 1 < result.fragment_count).then_some(Message::FragmentSelected(active + 1));
        let label = result
            .fragment_title
            .clone()
            .unwrap_or_else(|| format!("Layer {}", active + 1));
        result_column = result_column.push(
            row![
                button("<").on_press_maybe(previous).padding(6),
                text(format!("{label} ({}/{})", active + 1, result.fragment_count)).size(14),
                button(">").on_press_maybe(next).padding(6),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
        );
    }
    if let Some(notice) = result.markup_notice {
        result_column = result_column.push(text(notice).size(12));
    }

    if !result.charts.is_empty() {
        let charts = result
            .charts
            .iter()
            .fold(Column::new().spacing(8), |col, entry| {
                col.push(chart_row(entry, state.charts.get(&entry.image_url)))
            });
        result_column = result_column
            .push(text("Hotspot forecasts").size(18))
            .push(scrollable(charts).height(Length::Fixed(260.0)));
    }

    result_column.into()
}

fn chart_row<'a>(entry: &ChartEntry, status: Option<&ChartStatus>) -> Element<'a, Message> {
    let caption = match entry.coordinates {
        Some((lat, lng)) => format!("Hotspot {} ({lat}, {lng})", entry.hotspot_id),
        None => format!("Hotspot {}", entry.hotspot_id),
    };
    let body: Element<'a, Message> = match status {
        Some(ChartStatus::Ready(ChartImage::Raster(handle))) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fixed(200.0))
            .into(),
        Some(ChartStatus::Ready(ChartImage::Vector(handle))) => svg(handle.clone())
            .width(Length::Fill)
            .height(Length::Fixed(200.0))
            .into(),
        other => {
            let note = match other {
                Some(ChartStatus::Loading) => "Loading chart...",
                _ => "Chart image unavailable; showing the reported series.",
            };
            column![
                text(note).size(11),
                Canvas::new(SeriesChart::new(&entry.series))
                    .width(Length::Fill)
                    .height(Length::Fixed(80.0)),
            ]
            .spacing(4)
            .into()
        }
    };
    column![text(caption).size(14), body].spacing(4).into()
}
