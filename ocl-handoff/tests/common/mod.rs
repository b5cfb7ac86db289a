//! Helpers shared by the integration tests.
#![allow(dead_code)]

use ocl_handoff::sim::SimRuntime;
use ocl_handoff::SharedRuntime;
use std::sync::Arc;

/// A simulated runtime with one platform and one device.
pub fn one_device() -> SimRuntime {
    SimRuntime::builder().platform("Simulated Platform", 1).build()
}

/// Shares `sim` as a runtime; the returned handle sees the same state.
pub fn shared(sim: &SimRuntime) -> SharedRuntime {
    Arc::new(sim.clone())
}
