//! The end-to-end handoff: create a context, bind it on a worker thread,
//! join, release it on the creating thread.
//!
//! ```text
//! main: acquire ── spawn ─────────────── join ── probe ── release context
//!                    │                    ▲               release device
//! worker:            └─ name, create, bind ┘ (thread exit tears down)
//! ```
use crate::acquire::{acquire_context, AcquireOptions, AcquiredContext};
use crate::exec_context::{bind_on_current_thread, TeardownPolicy};
use crate::runtime::{DeviceType, SharedRuntime};
use crate::{Error, Result};
use std::thread;

const WORKER_NAME: &str = "exec-context-worker";

/// Options for [`run()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioOptions {
    /// Teardown behaviour of the worker's execution context.
    pub policy: TeardownPolicy,
    pub device_type: DeviceType,
    /// Query reference counts after the join.
    ///
    /// Against a real runtime this is itself a use-after-free when the
    /// worker already released the handles.
    pub probe_reference_counts: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            policy: TeardownPolicy::default(),
            device_type: DeviceType::default(),
            probe_reference_counts: true,
        }
    }
}

/// What the main thread observed after the worker exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Context reference count after the join; `None` when not probed or
    /// when the query failed.
    pub context_refs_after_join: Option<u32>,
    /// Device reference count after the join; `None` when not probed or
    /// when the query failed.
    pub device_refs_after_join: Option<u32>,
}

impl ScenarioReport {
    /// Both handles still held exactly the main thread's reference.
    pub fn handles_survived(&self) -> bool {
        self.context_refs_after_join == Some(1) && self.device_refs_after_join == Some(1)
    }
}

/// Runs the full handoff against `runtime`.
///
/// # Errors
///
/// Any failure during acquisition, on the worker, or during cleanup. When
/// the worker's teardown already freed the context, the main thread's
/// release fails with [`Error::Api`] for `clReleaseContext` (on a runtime
/// that detects it).
pub fn run(runtime: SharedRuntime, options: &ScenarioOptions) -> Result<ScenarioReport> {
    let AcquiredContext {
        platform,
        device,
        context,
    } = acquire_context(
        &runtime,
        &AcquireOptions {
            device_type: options.device_type,
        },
    )?;

    // Plain identifier copies; no reference count changes hands here.
    let (device_id, context_id) = (device.id(), context.id());
    let worker_runtime = runtime.clone();
    let policy = options.policy;
    let worker = thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || {
            bind_on_current_thread(worker_runtime, platform, device_id, context_id, policy)
        })?;
    // The worker's thread-local storage has been torn down once this returns.
    worker.join().map_err(|_| Error::WorkerPanicked)??;
    log::debug!("Worker joined");

    let mut report = ScenarioReport::default();
    if options.probe_reference_counts {
        report.context_refs_after_join = probe("context", runtime.context_reference_count(context_id));
        report.device_refs_after_join = probe("device", runtime.device_reference_count(device_id));
    }

    // Both releases are attempted; the first failure is reported.
    let released_context = context.release();
    let released_device = device.release();
    released_context.and(released_device)?;

    Ok(report)
}

fn probe(what: &str, count: Result<u32>) -> Option<u32> {
    match count {
        Ok(count) => {
            log::info!("{what} reference count after join: {count}");
            Some(count)
        }
        Err(e) => {
            log::warn!("Could not read {what} reference count after join: {e}");
            None
        }
    }
}
