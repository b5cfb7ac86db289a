//! End-to-end handoff: create, bind on a worker, join, release.

use ocl_handoff::sim::{FindingKind, ObjectKind, SimCall, SimRuntime};
use ocl_handoff::{
    run, ComputeRuntime, ContextId, DeviceId, DeviceType, Error, PlatformId, PlatformInfo,
    ScenarioOptions, ScenarioReport, TeardownPolicy,
};
use ocl_handoff_sys as sys;
use std::sync::Arc;

mod common;
use common::{one_device, shared};

fn options(policy: TeardownPolicy) -> ScenarioOptions {
    ScenarioOptions {
        policy,
        ..Default::default()
    }
}

#[test]
fn test_default_options_reproduce_the_baseline() {
    let options = ScenarioOptions::default();
    assert_eq!(options.policy, TeardownPolicy::Adopt);
    assert_eq!(options.device_type, DeviceType::Default);
    assert!(options.probe_reference_counts);
}

#[test]
fn test_borrowing_context_survives_the_worker() -> anyhow::Result<()> {
    let sim = one_device();
    let report = run(shared(&sim), &options(TeardownPolicy::Borrow))?;

    assert!(report.handles_survived());
    assert!(sim.findings().is_empty());
    assert_eq!(sim.live_objects(), 0);
    assert_eq!(sim.call_count(SimCall::ReleaseContext), 1);
    assert_eq!(sim.call_count(SimCall::ReleaseDevice), 1);
    Ok(())
}

#[test]
fn test_retaining_context_survives_the_worker() -> anyhow::Result<()> {
    let sim = one_device();
    let report = run(shared(&sim), &options(TeardownPolicy::Retain))?;

    assert_eq!(
        report,
        ScenarioReport {
            context_refs_after_join: Some(1),
            device_refs_after_join: Some(1),
        }
    );
    assert!(sim.findings().is_empty());
    assert_eq!(sim.live_objects(), 0);
    assert_eq!(
        sim.call_count(SimCall::RetainContext),
        sim.call_count(SimCall::ReleaseContext) - 1
    );
    Ok(())
}

#[test]
fn test_adopting_context_is_released_twice() {
    let sim = one_device();
    let err = run(shared(&sim), &options(TeardownPolicy::Adopt)).unwrap_err();

    assert_eq!(err.api_code("clReleaseContext"), Some(sys::CL_INVALID_CONTEXT));

    let findings = sim.findings();
    // The probes touch freed objects first, then both releases do.
    let kinds: Vec<_> = findings.iter().map(|f| (f.kind, f.object)).collect();
    assert_eq!(
        kinds,
        vec![
            (FindingKind::QueryAfterFree, ObjectKind::Context),
            (FindingKind::QueryAfterFree, ObjectKind::Device),
            (FindingKind::ReleaseAfterFree, ObjectKind::Context),
            (FindingKind::ReleaseAfterFree, ObjectKind::Device),
        ]
    );
    assert_eq!(sim.live_objects(), 0);
}

#[test]
fn test_adopting_context_without_probe() {
    let sim = one_device();
    let err = run(
        shared(&sim),
        &ScenarioOptions {
            probe_reference_counts: false,
            ..Default::default()
        },
    )
    .unwrap_err();

    assert!(err.api_code("clReleaseContext").is_some());
    assert_eq!(sim.call_count(SimCall::GetContextInfo), 0);
    let findings = sim.findings();
    assert_eq!(findings.len(), 2);
    assert!(findings
        .iter()
        .all(|f| f.kind == FindingKind::ReleaseAfterFree));
}

#[test]
fn test_probe_is_skipped_when_disabled() -> anyhow::Result<()> {
    let sim = one_device();
    let report = run(
        shared(&sim),
        &ScenarioOptions {
            policy: TeardownPolicy::Borrow,
            probe_reference_counts: false,
            ..Default::default()
        },
    )?;

    assert_eq!(report, ScenarioReport::default());
    assert!(!report.handles_survived());
    assert!(sim.findings().is_empty());
    Ok(())
}

#[test]
fn test_no_platform_is_fatal_before_spawning() {
    let sim = SimRuntime::empty();
    let err = run(shared(&sim), &options(TeardownPolicy::Borrow)).unwrap_err();
    assert!(matches!(err, Error::NoPlatform));
    assert_eq!(sim.call_count(SimCall::PlatformInfoProbe), 0);
}

#[test]
fn test_worker_failure_is_propagated_and_cleans_up() {
    let sim = SimRuntime::builder()
        .platform("Simulated Platform", 1)
        .empty_platform_name()
        .build();
    let err = run(shared(&sim), &options(TeardownPolicy::Adopt)).unwrap_err();

    assert!(matches!(err, Error::EmptyPlatformInfo { .. }));
    // No wrapper was created, so the creator's references are the only ones.
    assert!(sim.findings().is_empty());
    assert_eq!(sim.live_objects(), 0);
}

/// Delegates to a simulated runtime but panics when asked for platform info,
/// which only the worker does.
#[derive(Debug)]
struct PanicOnPlatformInfo(SimRuntime);

impl ComputeRuntime for PanicOnPlatformInfo {
    fn platform_ids(&self) -> ocl_handoff::Result<Vec<PlatformId>> {
        self.0.platform_ids()
    }
    fn device_ids(
        &self,
        platform: PlatformId,
        device_type: DeviceType,
    ) -> ocl_handoff::Result<Vec<DeviceId>> {
        self.0.device_ids(platform, device_type)
    }
    fn create_context(
        &self,
        platform: PlatformId,
        devices: &[DeviceId],
    ) -> ocl_handoff::Result<ContextId> {
        self.0.create_context(platform, devices)
    }
    fn platform_info(
        &self,
        _platform: PlatformId,
        _param: PlatformInfo,
        _value: Option<&mut [u8]>,
    ) -> ocl_handoff::Result<usize> {
        panic!("platform info unavailable");
    }
    fn retain_context(&self, context: ContextId) -> ocl_handoff::Result<()> {
        self.0.retain_context(context)
    }
    fn release_context(&self, context: ContextId) -> ocl_handoff::Result<()> {
        self.0.release_context(context)
    }
    fn retain_device(&self, device: DeviceId) -> ocl_handoff::Result<()> {
        self.0.retain_device(device)
    }
    fn release_device(&self, device: DeviceId) -> ocl_handoff::Result<()> {
        self.0.release_device(device)
    }
    fn context_reference_count(&self, context: ContextId) -> ocl_handoff::Result<u32> {
        self.0.context_reference_count(context)
    }
    fn device_reference_count(&self, device: DeviceId) -> ocl_handoff::Result<u32> {
        self.0.device_reference_count(device)
    }
}

#[test]
fn test_worker_panic_is_reported_and_cleans_up() {
    let sim = one_device();
    let err = run(
        Arc::new(PanicOnPlatformInfo(sim.clone())),
        &options(TeardownPolicy::Adopt),
    )
    .unwrap_err();

    assert!(matches!(err, Error::WorkerPanicked));
    // The main thread still gave back its own references.
    assert_eq!(sim.live_objects(), 0);
    assert!(sim.findings().is_empty());
}
