//! The compute API seam.
//!
//! [`ComputeRuntime`] is the subset of the OpenCL platform/device/context API
//! this crate drives. Calls mirror the C API closely: each one maps to a
//! single entry point, reports failure as [`Error::Api`](crate::Error::Api)
//! naming that entry point, and never retains or releases behind the
//! caller's back.
use crate::handle::{ContextId, DeviceId, PlatformId};
use crate::Result;
use derive_more::Display;
use num_enum::IntoPrimitive;
use std::fmt::Debug;
use std::sync::Arc;

/// A runtime shared between the main thread and the worker thread.
pub type SharedRuntime = Arc<dyn ComputeRuntime>;

/// Device type selector for device enumeration.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive)]
#[repr(u64)]
pub enum DeviceType {
    /// The platform's default device.
    #[default]
    #[display("default")]
    Default = 1 << 0,
    #[display("cpu")]
    Cpu = 1 << 1,
    #[display("gpu")]
    Gpu = 1 << 2,
    #[display("accelerator")]
    Accelerator = 1 << 3,
    #[display("all")]
    All = 0xFFFF_FFFF,
}

/// Platform properties readable with [`ComputeRuntime::platform_info`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive)]
#[repr(u32)]
pub enum PlatformInfo {
    #[display("CL_PLATFORM_PROFILE")]
    Profile = 0x0900,
    #[display("CL_PLATFORM_VERSION")]
    Version = 0x0901,
    #[display("CL_PLATFORM_NAME")]
    Name = 0x0902,
    #[display("CL_PLATFORM_VENDOR")]
    Vendor = 0x0903,
    #[display("CL_PLATFORM_EXTENSIONS")]
    Extensions = 0x0904,
}

/// Platform, device and context entry points of a compute runtime.
///
/// Implementations must be shareable across threads: the same runtime is
/// used by the acquiring thread and by the worker that binds the context.
pub trait ComputeRuntime: Send + Sync + Debug {
    /// All available platforms. An empty list means none were found.
    fn platform_ids(&self) -> Result<Vec<PlatformId>>;

    /// Devices of `device_type` under `platform`. An empty list means none
    /// were found. Each returned device carries one reference owned by the
    /// caller.
    fn device_ids(&self, platform: PlatformId, device_type: DeviceType) -> Result<Vec<DeviceId>>;

    /// Creates a context over `devices` with `CL_CONTEXT_PLATFORM` set to
    /// `platform`. The returned context carries one reference owned by the
    /// caller.
    fn create_context(&self, platform: PlatformId, devices: &[DeviceId]) -> Result<ContextId>;

    /// Queries a platform property.
    ///
    /// With `value == None` this is the size probe: it returns the number of
    /// bytes the property needs, terminator included. With a buffer, the
    /// buffer must be at least that large; the property is written to it and
    /// the number of bytes written is returned.
    fn platform_info(
        &self,
        platform: PlatformId,
        param: PlatformInfo,
        value: Option<&mut [u8]>,
    ) -> Result<usize>;

    fn retain_context(&self, context: ContextId) -> Result<()>;
    fn release_context(&self, context: ContextId) -> Result<()>;
    fn retain_device(&self, device: DeviceId) -> Result<()>;
    fn release_device(&self, device: DeviceId) -> Result<()>;

    /// Current reference count of `context` as reported by the runtime.
    ///
    /// Only meaningful while the context is alive; on a real runtime a
    /// query against a freed context is undefined behaviour.
    fn context_reference_count(&self, context: ContextId) -> Result<u32>;

    /// Current reference count of `device` as reported by the runtime.
    fn device_reference_count(&self, device: DeviceId) -> Result<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocl_handoff_sys as sys;

    #[test]
    fn selectors_match_the_c_constants() {
        assert_eq!(u64::from(DeviceType::default()), sys::CL_DEVICE_TYPE_DEFAULT);
        assert_eq!(u64::from(DeviceType::Gpu), sys::CL_DEVICE_TYPE_GPU);
        assert_eq!(u64::from(DeviceType::All), sys::CL_DEVICE_TYPE_ALL);
        assert_eq!(u32::from(PlatformInfo::Name), sys::CL_PLATFORM_NAME);
        assert_eq!(u32::from(PlatformInfo::Extensions), sys::CL_PLATFORM_EXTENSIONS);
    }
}
