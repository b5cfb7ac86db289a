use crate::cl_uint;
#[cfg(feature = "opencl")]
use crate::cl_int;
#[cfg(feature = "opencl")]
use std::os::raw::c_void;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _cl_platform_id {
    _unused: [u8; 0],
}
pub type cl_platform_id = *mut _cl_platform_id;

pub type cl_platform_info = cl_uint;

pub const CL_PLATFORM_PROFILE: cl_platform_info = 0x0900;
pub const CL_PLATFORM_VERSION: cl_platform_info = 0x0901;
pub const CL_PLATFORM_NAME: cl_platform_info = 0x0902;
pub const CL_PLATFORM_VENDOR: cl_platform_info = 0x0903;
pub const CL_PLATFORM_EXTENSIONS: cl_platform_info = 0x0904;

#[cfg(feature = "opencl")]
unsafe extern "C" {
    /// Enumerates platforms. Passing `num_entries == 0` and a null
    /// `platforms` only reports the count through `num_platforms`.
    pub fn clGetPlatformIDs(
        num_entries: cl_uint,
        platforms: *mut cl_platform_id,
        num_platforms: *mut cl_uint,
    ) -> cl_int;
    /// Queries a platform property. With a null `param_value` only the
    /// required size is written to `param_value_size_ret`.
    pub fn clGetPlatformInfo(
        platform: cl_platform_id,
        param_name: cl_platform_info,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> cl_int;
}
