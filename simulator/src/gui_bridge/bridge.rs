use crate::generator::profile::{build_trace_from_config, TraceConfig};
use crate::gui_bridge::model::SummaryModel;
use crate::workflow::runner::Runner;
use crate::workflow::trace::Trace;
use anyhow::Result;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct IngestError;

impl warp::reject::Reject for IngestError {}

type SharedSummary = Arc<RwLock<SummaryModel>>;

/// Replays `trace` and stores its summary as the published state.
fn run_and_store(runner: &Runner, state: &SharedSummary, trace: &Trace) -> Result<SummaryModel> {
    let result = runner.execute(trace)?;
    let model = SummaryModel::from(&result);
    store(state, &model)?;
    Ok(model)
}

fn store(state: &SharedSummary, model: &SummaryModel) -> Result<()> {
    let mut guard = state
        .write()
        .map_err(|_| anyhow::anyhow!("summary state poisoned"))?;
    *guard = model.clone();
    Ok(())
}

/// Hosts the summary HTTP endpoint and replays traces posted to it.
pub struct GuiBridge {
    state: SharedSummary,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SummaryModel::default())),
            runner,
        }
    }

    /// Starts the HTTP server on a background thread.
    pub fn serve(&self, address: SocketAddr) -> thread::JoinHandle<()> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("summary")
            .and(warp::get())
            .and(state_filter.clone())
            .and_then(|state: SharedSummary| async move {
                match state.read() {
                    Ok(guard) => Ok(warp::reply::json(&*guard)),
                    Err(_) => Err(warp::reject::custom(IngestError)),
                }
            });

        let post_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |trace: Trace, state: SharedSummary, runner: Arc<Runner>| async move {
                    match run_and_store(&runner, &state, &Trace::new(trace.events)) {
                        Ok(model) => Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "ok",
                                "location_changes": model.location_changes,
                                "orientation_updates": model.orientation_updates,
                            })),
                            StatusCode::OK,
                        )),
                        Err(err) => {
                            error!("ingest error: {:#}", err);
                            Err(warp::reject::custom(IngestError))
                        }
                    }
                },
            );

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: TraceConfig, state: SharedSummary, runner: Arc<Runner>| async move {
                    match build_trace_from_config(&config)
                        .and_then(|trace| run_and_store(&runner, &state, &trace))
                    {
                        Ok(model) => {
                            if let Some(description) = config.description.as_ref() {
                                info!(
                                    "[GUI] Trace {} -> location changes {}",
                                    description, model.location_changes
                                );
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "location_changes": model.location_changes,
                                    "timeouts": model.timeouts,
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("ingest-config error: {:#}", err);
                            Err(warp::reject::custom(IngestError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(post_route).or(generator_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                match warp::serve(routes).try_bind_ephemeral(address) {
                    Ok((bound, server)) => {
                        info!("[GUI] bridge listening on {}", bound);
                        server.await;
                    }
                    Err(err) => error!("failed to bind bridge on {}: {}", address, err),
                }
            });
        })
    }

    /// Replays a trace and publishes its summary.
    pub fn ingest(&self, trace: &Trace) -> Result<SummaryModel> {
        let model = run_and_store(&self.runner, &self.state, trace)?;
        println!("[GUI] {}", model.report_line());
        Ok(model)
    }

    pub fn publish(&self, model: &SummaryModel) -> Result<()> {
        store(&self.state, model)?;
        println!("[GUI] {}", model.report_line());
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> SummaryModel {
        self.state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
