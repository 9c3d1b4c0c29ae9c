use crate::config::DisplayConfig;
use crate::gui::gmeter::model::{WAITING_LABEL, scale_label, values_label};
use crate::pipeline::{Pipeline, RenderState};
use crate::sys::ticker::Ticker;
use simtelem::TelemetrySource;
use std::time::{Duration, Instant};

const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(250);

/// Runs the pipeline without a window, printing the text readout instead of drawing.
pub fn run<S: TelemetrySource>(source: S, config: &DisplayConfig, max_polls: Option<u64>) {
    let mut pipeline = Pipeline::new(source);
    let start = Instant::now();
    let mut poll = Ticker::new(config.poll_interval(), start);
    let mut report = Ticker::new(config.render_interval().max(MIN_REPORT_INTERVAL), start);
    let mut polls = 0;

    log::info!(
        "Headless mode: polling every {:?}, reporting every {:?}",
        poll.period(),
        report.period()
    );

    while max_polls.is_none_or(|max| polls < max) {
        let now = Instant::now();
        if poll.poll(now) {
            pipeline.tick(config);
            polls += 1;
        }
        if report.poll(now) {
            println!("{}", readout(&pipeline.render_state(), config));
        }

        let next = poll.next_deadline().min(report.next_deadline());
        std::thread::sleep(next.saturating_duration_since(Instant::now()));
    }
}

pub fn readout(state: &RenderState<'_>, config: &DisplayConfig) -> String {
    let values = state
        .position
        .map(values_label)
        .unwrap_or_else(|| WAITING_LABEL.to_string());
    format!("{}   |   {}", values, scale_label(config))
}
