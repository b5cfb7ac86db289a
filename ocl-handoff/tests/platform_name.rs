//! Tests for the two-call platform info query.

use ocl_handoff::sim::{SimCall, SimRuntime};
use ocl_handoff::{platform_info_string, platform_name, ComputeRuntime, Error, PlatformInfo};
use ocl_handoff_sys as sys;

#[test]
fn test_name_round_trip() -> anyhow::Result<()> {
    let sim = SimRuntime::builder().platform("Simulated Platform", 1).build();
    let platform = sim.platform_ids()?[0];

    let probed = sim.platform_info(platform, PlatformInfo::Name, None)?;
    assert!(probed > 0);

    let name = platform_name(&sim, platform)?;
    assert_eq!(name, "Simulated Platform");
    // The probe counts the terminator, the returned name does not.
    assert_eq!(name.len(), probed - 1);
    assert_eq!(sim.call_count(SimCall::PlatformInfoFetch), 1);
    Ok(())
}

#[test]
fn test_other_properties() -> anyhow::Result<()> {
    let sim = SimRuntime::builder().platform("Simulated Platform", 1).build();
    let platform = sim.platform_ids()?[0];

    assert_eq!(
        platform_info_string(&sim, platform, PlatformInfo::Profile)?,
        "FULL_PROFILE"
    );
    assert!(platform_info_string(&sim, platform, PlatformInfo::Version)?.starts_with("OpenCL"));
    // A property that is only the terminator is empty, not an error.
    assert_eq!(
        platform_info_string(&sim, platform, PlatformInfo::Extensions)?,
        ""
    );
    Ok(())
}

#[test]
fn test_zero_length_is_fatal() {
    let sim = SimRuntime::builder()
        .platform("Simulated Platform", 1)
        .empty_platform_name()
        .build();
    let platform = sim.platform_ids().unwrap()[0];

    let err = platform_name(&sim, platform).unwrap_err();
    assert!(matches!(
        err,
        Error::EmptyPlatformInfo {
            param: PlatformInfo::Name
        }
    ));
    assert_eq!(
        err.to_string(),
        "clGetPlatformInfo returned 0 size for CL_PLATFORM_NAME"
    );
    // Not silently skipped: the fetch never happened.
    assert_eq!(sim.call_count(SimCall::PlatformInfoFetch), 0);
}

#[test]
fn test_failing_probe() {
    let sim = SimRuntime::builder()
        .platform("Simulated Platform", 1)
        .fail(SimCall::PlatformInfoProbe, sys::CL_INVALID_PLATFORM)
        .build();
    let platform = sim.platform_ids().unwrap()[0];

    let err = platform_name(&sim, platform).unwrap_err();
    assert_eq!(err.api_code("clGetPlatformInfo"), Some(sys::CL_INVALID_PLATFORM));
    assert_eq!(sim.call_count(SimCall::PlatformInfoFetch), 0);
}

#[test]
fn test_failing_fetch() {
    let sim = SimRuntime::builder()
        .platform("Simulated Platform", 1)
        .fail(SimCall::PlatformInfoFetch, sys::CL_INVALID_VALUE)
        .build();
    let platform = sim.platform_ids().unwrap()[0];

    let err = platform_name(&sim, platform).unwrap_err();
    assert_eq!(err.api_code("clGetPlatformInfo"), Some(sys::CL_INVALID_VALUE));
    assert_eq!(sim.call_count(SimCall::PlatformInfoProbe), 1);
}

#[test]
fn test_invalid_utf8_is_rejected() {
    let sim = SimRuntime::builder()
        .platform_with_raw_name(b"Simulated \xff Platform")
        .build();
    let platform = sim.platform_ids().unwrap()[0];

    let err = platform_name(&sim, platform).unwrap_err();
    assert!(matches!(err, Error::InvalidUtf8(_)));
    assert_eq!(err.to_string(), "Platform info is not valid UTF-8");
}
