use anyhow::Context;
use clap::Parser;
use generator::profile::build_trace_from_config;
use gui_bridge::bridge::{default_bind_address, GuiBridge};
use sensorcore::prelude::SourceSelector;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;
use workflow::trace::Trace;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Replay driver for the location/orientation sensor core")]
struct Args {
    /// Replay one trace and emit a summary report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Replay a recorded JSON trace instead of generating one
    #[arg(long)]
    trace: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Sources::Any)]
    sources: Sources,
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
    /// Magnetic declination in degrees, subtracted from azimuth
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    declination: f32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    duration_ms: Option<i64>,
    /// Keep the HTTP bridge alive for incoming traces
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = default_bind_address())]
    bind: SocketAddr,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Sources {
    Network,
    Gps,
    Any,
}

impl From<Sources> for SourceSelector {
    fn from(sources: Sources) -> Self {
        match sources {
            Sources::Network => SourceSelector::Network,
            Sources::Gps => SourceSelector::Gps,
            Sources::Any => SourceSelector::Any,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.sources.into(), args.timeout_ms, args.declination)
    };
    if let Some(seed) = args.seed {
        workflow_config.trace.seed = seed;
    }
    if let Some(duration_ms) = args.duration_ms {
        workflow_config.trace.duration_ms = duration_ms;
    }

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let gui_bridge = GuiBridge::new(runner);
    let trace = match args.trace.as_ref() {
        Some(path) => Trace::load(path)?,
        None => build_trace_from_config(&workflow_config.trace)
            .context("generating synthetic trace")?,
    };

    if args.offline {
        let model = gui_bridge.ingest(&trace)?;

        println!(
            "Offline run -> location changes {}, timeouts {}, orientation updates {}, events {}",
            model.location_changes,
            model.timeouts,
            model.orientation_updates,
            trace.events.len()
        );

        gui_bridge.publish_status("Offline workflow results ready.");

        let report = format!("{}\n", model.report_line());
        let report_path = PathBuf::from("tools/data/offline_replay.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)
            .with_context(|| format!("opening {}", report_path.display()))?;
        file.write_all(report.as_bytes())?;
    }
    if args.serve {
        let _server = gui_bridge.serve(args.bind);
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
