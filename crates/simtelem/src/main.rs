use clap::{Parser, Subcommand};
use simtelem::TelemetrySource;
use simtelem::demo::DemoSource;
use simtelem::irsdk::{self, IrsdkSource};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "simtelem", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path of the iRacing shared-memory telemetry file
    #[arg(short = 'p', long, global = true, default_value = irsdk::DEFAULT_PATH)]
    path: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// List the variables published by the simulator.
    Vars,
    /// Print variable values until interrupted.
    Watch {
        /// Variables to print
        #[arg(default_values = ["LongAccel", "LatAccel", "Pitch", "Roll"])]
        names: Vec<String>,

        /// Delay between samples
        #[arg(short = 'i', long, default_value_t = 250)]
        interval_ms: u64,

        /// Read synthetic telemetry instead of the simulator
        #[arg(long)]
        demo: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Vars => list_vars(cli.path),
        Commands::Watch {
            names,
            interval_ms,
            demo,
        } => {
            let source: Box<dyn TelemetrySource> = if demo {
                Box::new(DemoSource::new())
            } else {
                Box::new(IrsdkSource::new(cli.path))
            };
            watch(source, &names, Duration::from_millis(interval_ms))
        }
    }
}

fn list_vars(path: PathBuf) -> anyhow::Result<()> {
    let mut source = IrsdkSource::new(path);
    if !source.connect() {
        anyhow::bail!(
            "No simulator telemetry at {}. Is the simulator running?",
            source.path().display()
        );
    }

    for var in source.variables() {
        println!(
            "{:<32} {:<8} x{:<3} {:<12} {}",
            var.name, var.kind, var.count, var.unit, var.desc
        );
    }
    Ok(())
}

fn watch(
    mut source: Box<dyn TelemetrySource>,
    names: &[String],
    interval: Duration,
) -> anyhow::Result<()> {
    loop {
        if !source.is_connected() && !source.connect() {
            println!("waiting for telemetry");
            std::thread::sleep(interval);
            continue;
        }

        if let Err(e) = source.freeze_latest() {
            log::warn!("Lost telemetry: {}", e);
            source.disconnect();
            continue;
        }

        let line = names
            .iter()
            .map(|name| match source.read_variable(name) {
                Ok(Some(value)) => format!("{name}={value:.3}"),
                Ok(None) => format!("{name}=-"),
                Err(e) => format!("{name}=<{e}>"),
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("{line}");

        std::thread::sleep(interval);
    }
}
