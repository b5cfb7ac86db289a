//! Handoff against the system's OpenCL runtime.
//!
//! These need an ICD loader and at least one platform. Machines without a
//! platform pass trivially.

#[cfg(feature = "opencl")]
mod native {
    use ocl_handoff::native::OpenClRuntime;
    use ocl_handoff::{
        acquire_context, platform_name, run, AcquireOptions, ComputeRuntime, Error,
        ScenarioOptions, SharedRuntime, TeardownPolicy,
    };
    use std::sync::Arc;

    fn runtime() -> Option<SharedRuntime> {
        let runtime = OpenClRuntime::new();
        match runtime.platform_ids() {
            Ok(platforms) if !platforms.is_empty() => Some(Arc::new(runtime)),
            _ => {
                println!("OpenCL test skipped: no platform available");
                None
            }
        }
    }

    #[test]
    fn test_opencl_acquire_and_name() -> anyhow::Result<()> {
        let Some(runtime) = runtime() else {
            return Ok(());
        };
        let acquired = match acquire_context(&runtime, &AcquireOptions::default()) {
            Err(Error::NoDevice { .. }) => return Ok(()),
            acquired => acquired?,
        };

        let name = platform_name(&*runtime, acquired.platform)?;
        assert!(!name.is_empty());
        assert!(!name.ends_with('\0'));
        assert_eq!(runtime.context_reference_count(acquired.context.id())?, 1);

        acquired.context.release()?;
        acquired.device.release()?;
        Ok(())
    }

    #[test]
    fn test_opencl_borrowing_handoff() -> anyhow::Result<()> {
        let Some(runtime) = runtime() else {
            return Ok(());
        };
        match run(
            runtime,
            &ScenarioOptions {
                policy: TeardownPolicy::Borrow,
                ..Default::default()
            },
        ) {
            Err(Error::NoDevice { .. }) => Ok(()),
            report => {
                assert_eq!(report?.context_refs_after_join, Some(1));
                Ok(())
            }
        }
    }

    #[test]
    fn test_opencl_retaining_handoff() -> anyhow::Result<()> {
        let Some(runtime) = runtime() else {
            return Ok(());
        };
        match run(
            runtime,
            &ScenarioOptions {
                policy: TeardownPolicy::Retain,
                ..Default::default()
            },
        ) {
            Err(Error::NoDevice { .. }) => Ok(()),
            report => {
                assert_eq!(report?.context_refs_after_join, Some(1));
                Ok(())
            }
        }
    }
}

#[cfg(not(feature = "opencl"))]
#[test]
fn test_opencl_handoff() {
    println!("OpenCL test skipped: feature 'opencl' not enabled");
}
