use crate::cl_int;
use derive_more::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Status codes returned by the calls declared in this crate.
///
/// Only the codes these calls are specified to return are listed. Anything
/// else fails [`TryFrom`] and should be reported by its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum Status {
    #[display("CL_SUCCESS")]
    Success = 0,
    #[display("CL_DEVICE_NOT_FOUND")]
    DeviceNotFound = -1,
    #[display("CL_DEVICE_NOT_AVAILABLE")]
    DeviceNotAvailable = -2,
    #[display("CL_OUT_OF_RESOURCES")]
    OutOfResources = -5,
    #[display("CL_OUT_OF_HOST_MEMORY")]
    OutOfHostMemory = -6,
    #[display("CL_INVALID_VALUE")]
    InvalidValue = -30,
    #[display("CL_INVALID_DEVICE_TYPE")]
    InvalidDeviceType = -31,
    #[display("CL_INVALID_PLATFORM")]
    InvalidPlatform = -32,
    #[display("CL_INVALID_DEVICE")]
    InvalidDevice = -33,
    #[display("CL_INVALID_CONTEXT")]
    InvalidContext = -34,
    #[display("CL_INVALID_PROPERTY")]
    InvalidProperty = -64,
    #[display("CL_PLATFORM_NOT_FOUND_KHR")]
    PlatformNotFoundKhr = -1001,
}

impl Status {
    /// Returns the symbolic name of `code`, or `None` for codes not listed
    /// in [`Status`].
    pub fn name_of(code: cl_int) -> Option<String> {
        Status::try_from(code).ok().map(|status| status.to_string())
    }
}

pub const CL_SUCCESS: cl_int = Status::Success as cl_int;
pub const CL_DEVICE_NOT_FOUND: cl_int = Status::DeviceNotFound as cl_int;
pub const CL_OUT_OF_RESOURCES: cl_int = Status::OutOfResources as cl_int;
pub const CL_INVALID_VALUE: cl_int = Status::InvalidValue as cl_int;
pub const CL_INVALID_PLATFORM: cl_int = Status::InvalidPlatform as cl_int;
pub const CL_INVALID_DEVICE: cl_int = Status::InvalidDevice as cl_int;
pub const CL_INVALID_CONTEXT: cl_int = Status::InvalidContext as cl_int;
pub const CL_PLATFORM_NOT_FOUND_KHR: cl_int = Status::PlatformNotFoundKhr as cl_int;
