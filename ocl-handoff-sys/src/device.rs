use crate::cl_bitfield;
use crate::cl_uint;
#[cfg(feature = "opencl")]
use crate::{cl_int, cl_platform_id};
#[cfg(feature = "opencl")]
use std::os::raw::c_void;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct _cl_device_id {
    _unused: [u8; 0],
}
pub type cl_device_id = *mut _cl_device_id;

pub type cl_device_type = cl_bitfield;
pub type cl_device_info = cl_uint;

pub const CL_DEVICE_TYPE_DEFAULT: cl_device_type = 1 << 0;
pub const CL_DEVICE_TYPE_CPU: cl_device_type = 1 << 1;
pub const CL_DEVICE_TYPE_GPU: cl_device_type = 1 << 2;
pub const CL_DEVICE_TYPE_ACCELERATOR: cl_device_type = 1 << 3;
pub const CL_DEVICE_TYPE_ALL: cl_device_type = 0xFFFF_FFFF;

pub const CL_DEVICE_NAME: cl_device_info = 0x102B;
pub const CL_DEVICE_REFERENCE_COUNT: cl_device_info = 0x1047;

#[cfg(feature = "opencl")]
unsafe extern "C" {
    pub fn clGetDeviceIDs(
        platform: cl_platform_id,
        device_type: cl_device_type,
        num_entries: cl_uint,
        devices: *mut cl_device_id,
        num_devices: *mut cl_uint,
    ) -> cl_int;
    pub fn clGetDeviceInfo(
        device: cl_device_id,
        param_name: cl_device_info,
        param_value_size: usize,
        param_value: *mut c_void,
        param_value_size_ret: *mut usize,
    ) -> cl_int;
    /// Increments the reference count of a sub-device. A no-op for root
    /// devices.
    pub fn clRetainDevice(device: cl_device_id) -> cl_int;
    /// Decrements the reference count of a sub-device. A no-op for root
    /// devices.
    pub fn clReleaseDevice(device: cl_device_id) -> cl_int;
}
