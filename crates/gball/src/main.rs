use clap::Parser;
use gball::config;
use gball::gui::app::AppModel;
use gball::sys::{headless, runtime};
use gball::telemetry;
use relm4::prelude::*;
use simtelem::TelemetrySource;
use simtelem::demo::DemoSource;

#[derive(Parser, Debug)]
#[command(version, about = "G-force overlay for racing simulator telemetry", long_about = None)]
struct Args {
    /// Use synthetic telemetry instead of the simulator
    #[arg(long)]
    demo: bool,

    /// Print the readout to stdout instead of opening the overlay
    #[arg(long)]
    headless: bool,

    /// Stop after this many polls (headless only)
    #[arg(long, requires = "headless")]
    ticks: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = config::load_or_setup();

    // --demo only affects this run, the saved source stays as configured
    let source: Box<dyn TelemetrySource> = if args.demo {
        Box::new(DemoSource::new())
    } else {
        telemetry::open_source(&config.source)
    };

    if args.headless {
        headless::run(source, &config, args.ticks);
        return Ok(());
    }

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    let app = RelmApp::new("io.gball.overlay").with_args(Vec::new());
    app.run::<AppModel>((config, source, rx));

    Ok(())
}
