use crate::cl_uint;
#[cfg(feature = "opencl")]
use crate::{cl_device_id, cl_int};
#[cfg(feature = "opencl")]
use std::os::raw::{c_char, c_void};

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _cl_context {
    _unused: [u8; 0],
}
pub type cl_context = *mut _cl_context;

pub type cl_context_properties = isize;
pub type cl_context_info = cl_uint;

pub const CL_CONTEXT_PLATFORM: cl_context_properties = 0x1084;

pub const CL_CONTEXT_REFERENCE_COUNT: cl_context_info = 0x1080;
pub const CL_CONTEXT_DEVICES: cl_context_info = 0x1081;
pub const CL_CONTEXT_NUM_DEVICES: cl_context_info = 0x1083;

/// Error callback passed to [`clCreateContext`].
#[cfg(feature = "opencl")]
pub type cl_context_notify = Option<
    unsafe extern "C" fn(
        errinfo: *const c_char,
        private_info: *const c_void,
        cb: usize,
        user_data: *mut c_void,
    ),
>;

#[cfg(feature = "opencl")]
unsafe extern "C" {
    /// Creator. Returns null and sets `errcode_ret` on error.
    pub fn clCreateContext(
        properties: *const cl_context_properties,
        num_devices: cl_uint,
        devices: *const cl_device_id,
        pfn_notify: cl_context_notify,
        user_data: *mut c_void,
        errcode_ret: *mut cl_int,
    ) -> cl_context;
    pub fn clRetainContext(context: cl_context) -> cl_int;
    /// Decrements the reference count; the context is destroyed once it
    /// reaches zero and all objects attached to it are released.
    pub fn clReleaseContext(context: cl_context) -> cl_int;
    pub fn clGetContextInfo(
        context: cl_context,
        param_name: cl_context_info,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> cl_int;
}
