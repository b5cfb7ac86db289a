//! # Compute Context Handoff
//!
//! Reproduces and checks an ownership hazard: a compute context is created on
//! one thread, handed to a second thread that binds it as that thread's
//! active execution context, and released again by the creating thread once
//! the second thread has exited.
//!
//! Whether the execution-context wrapper *borrows* the handles or silently
//! *takes over* the creator's references decides whether that last release
//! is a clean decrement to zero or a double release. This crate makes the
//! contract explicit ([`TeardownPolicy`], [`Ownership`]) instead of guessing
//! it, and checks each variant against a reference-counting runtime.
//!
//! ## Layout
//!
//! * [`runtime`] – the [`ComputeRuntime`] trait, the platform/device/context
//!   subset of the OpenCL API.
//! * [`native`] – the trait over the system's OpenCL loader (feature
//!   `opencl`).
//! * [`sim`] – an in-process runtime that records use-after-free and
//!   release-after-free accesses.
//! * [`handle`] – plain handle identifiers and owning wrappers.
//! * [`acquire`] – first platform, first device, one context.
//! * [`platform`] – the two-call platform info query.
//! * [`exec_context`] – the per-thread execution context.
//! * [`scenario`] – the whole handoff, end to end.
//!
//! ## Features
#![doc = document_features::document_features!()]

pub mod acquire;
pub mod error;
pub mod exec_context;
pub mod handle;
#[cfg(feature = "opencl")]
pub mod native;
pub mod platform;
pub mod runtime;
pub mod scenario;
pub mod sim;

pub use acquire::{acquire_context, AcquireOptions, AcquiredContext};
pub use error::{Error, Result};
pub use exec_context::{ExecutionContext, TeardownPolicy};
pub use handle::{ContextId, DeviceId, OwnedContext, OwnedDevice, Ownership, PlatformId};
pub use platform::{platform_info_string, platform_name};
pub use runtime::{ComputeRuntime, DeviceType, PlatformInfo, SharedRuntime};
pub use scenario::{run, ScenarioOptions, ScenarioReport};
