//! Context acquisition.
//!
//! Selection is "first available": the first platform, then the first device
//! of the requested type on it. There is no scoring and no fallback to other
//! platforms.
use crate::handle::{OwnedContext, OwnedDevice, PlatformId};
use crate::runtime::{DeviceType, SharedRuntime};
use crate::{Error, Result};

/// Options for [`acquire_context()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Device type passed to device enumeration.
    pub device_type: DeviceType,
}

/// A freshly created context together with the device it is bound to.
///
/// `device` and `context` each hold the single reference obtained at
/// enumeration resp. creation.
#[derive(Debug)]
pub struct AcquiredContext {
    pub platform: PlatformId,
    pub device: OwnedDevice,
    pub context: OwnedContext,
}

/// Creates a context on the first device of the first platform.
///
/// # Errors
///
/// * [`Error::NoPlatform`] if no platform is available.
/// * [`Error::NoDevice`] if the first platform has no device of
///   `options.device_type`.
/// * [`Error::Api`] for any failing call.
pub fn acquire_context(runtime: &SharedRuntime, options: &AcquireOptions) -> Result<AcquiredContext> {
    let platform = runtime
        .platform_ids()?
        .into_iter()
        .next()
        .ok_or(Error::NoPlatform)?;

    let mut devices = runtime.device_ids(platform, options.device_type)?.into_iter();
    let device = devices.next().ok_or(Error::NoDevice {
        device_type: options.device_type,
    })?;
    let device = OwnedDevice::adopt(runtime.clone(), device);
    // Only the first device is kept; give the others their reference back.
    devices
        .map(|extra| runtime.release_device(extra))
        .fold(Ok(()), |first: Result<()>, released| first.and(released))?;

    let context = runtime.create_context(platform, &[device.id()])?;
    let context = OwnedContext::adopt(runtime.clone(), context);
    log::debug!(
        "Acquired {:?} on {:?} of {:?}",
        context.id(),
        device.id(),
        platform
    );

    Ok(AcquiredContext {
        platform,
        device,
        context,
    })
}
