//! [`ComputeRuntime`] over the system's OpenCL ICD loader.
use crate::handle::{ContextId, DeviceId, PlatformId};
use crate::runtime::{ComputeRuntime, DeviceType, PlatformInfo};
use crate::{Error, Result};
use ocl_handoff_sys as sys;
use std::ffi::c_void;
use std::mem;
use std::ptr;

/// The OpenCL runtime found at link time.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenClRuntime;

impl OpenClRuntime {
    pub fn new() -> Self {
        Self
    }
}

/// Reads a fixed-size scalar with one of the `clGet*Info` entry points.
fn scalar_info<T: Copy + Default>(
    call: &'static str,
    query: impl FnOnce(usize, *mut c_void, *mut usize) -> sys::cl_int,
) -> Result<T> {
    let mut value = T::default();
    let code = query(
        mem::size_of::<T>(),
        &mut value as *mut T as *mut c_void,
        ptr::null_mut(),
    );
    Error::check(call, code)?;
    Ok(value)
}

impl ComputeRuntime for OpenClRuntime {
    fn platform_ids(&self) -> Result<Vec<PlatformId>> {
        let mut count: sys::cl_uint = 0;
        let code = unsafe { sys::clGetPlatformIDs(0, ptr::null_mut(), &mut count) };
        // The ICD loader reports "no platform" as an error code.
        if code == sys::CL_PLATFORM_NOT_FOUND_KHR {
            return Ok(Vec::new());
        }
        Error::check("clGetPlatformIDs", code)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut raw: Vec<sys::cl_platform_id> = vec![ptr::null_mut(); count as usize];
        let code = unsafe { sys::clGetPlatformIDs(count, raw.as_mut_ptr(), &mut count) };
        Error::check("clGetPlatformIDs", code)?;
        raw.truncate(count as usize);

        raw.into_iter()
            .map(|p| unsafe { PlatformId::from_ptr(p.cast()) }.ok_or(Error::NullHandle("platform")))
            .collect()
    }

    fn device_ids(&self, platform: PlatformId, device_type: DeviceType) -> Result<Vec<DeviceId>> {
        let platform = platform.as_ptr().cast();
        let device_type = u64::from(device_type);

        let mut count: sys::cl_uint = 0;
        let code =
            unsafe { sys::clGetDeviceIDs(platform, device_type, 0, ptr::null_mut(), &mut count) };
        if code == sys::CL_DEVICE_NOT_FOUND {
            return Ok(Vec::new());
        }
        Error::check("clGetDeviceIDs", code)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut raw: Vec<sys::cl_device_id> = vec![ptr::null_mut(); count as usize];
        let code = unsafe {
            sys::clGetDeviceIDs(platform, device_type, count, raw.as_mut_ptr(), &mut count)
        };
        Error::check("clGetDeviceIDs", code)?;
        raw.truncate(count as usize);

        raw.into_iter()
            .map(|d| unsafe { DeviceId::from_ptr(d.cast()) }.ok_or(Error::NullHandle("device")))
            .collect()
    }

    fn create_context(&self, platform: PlatformId, devices: &[DeviceId]) -> Result<ContextId> {
        let properties: [sys::cl_context_properties; 3] = [
            sys::CL_CONTEXT_PLATFORM,
            platform.as_ptr() as sys::cl_context_properties,
            0,
        ];
        let devices: Vec<sys::cl_device_id> = devices.iter().map(|d| d.as_ptr().cast()).collect();

        let mut code = sys::CL_SUCCESS;
        let context = unsafe {
            sys::clCreateContext(
                properties.as_ptr(),
                devices.len() as sys::cl_uint,
                devices.as_ptr(),
                None,
                ptr::null_mut(),
                &mut code,
            )
        };
        Error::check("clCreateContext", code)?;

        unsafe { ContextId::from_ptr(context.cast()) }.ok_or(Error::NullHandle("context"))
    }

    fn platform_info(
        &self,
        platform: PlatformId,
        param: PlatformInfo,
        value: Option<&mut [u8]>,
    ) -> Result<usize> {
        let (size, buffer) = match value {
            Some(buffer) => (buffer.len(), buffer.as_mut_ptr().cast::<c_void>()),
            None => (0, ptr::null_mut()),
        };
        let mut size_ret: usize = 0;
        let code = unsafe {
            sys::clGetPlatformInfo(
                platform.as_ptr().cast(),
                u32::from(param),
                size,
                buffer,
                &mut size_ret,
            )
        };
        Error::check("clGetPlatformInfo", code)?;
        Ok(size_ret)
    }

    fn retain_context(&self, context: ContextId) -> Result<()> {
        Error::check("clRetainContext", unsafe {
            sys::clRetainContext(context.as_ptr().cast())
        })
    }

    fn release_context(&self, context: ContextId) -> Result<()> {
        Error::check("clReleaseContext", unsafe {
            sys::clReleaseContext(context.as_ptr().cast())
        })
    }

    fn retain_device(&self, device: DeviceId) -> Result<()> {
        Error::check("clRetainDevice", unsafe {
            sys::clRetainDevice(device.as_ptr().cast())
        })
    }

    fn release_device(&self, device: DeviceId) -> Result<()> {
        Error::check("clReleaseDevice", unsafe {
            sys::clReleaseDevice(device.as_ptr().cast())
        })
    }

    fn context_reference_count(&self, context: ContextId) -> Result<u32> {
        scalar_info::<sys::cl_uint>("clGetContextInfo", |size, value, size_ret| unsafe {
            sys::clGetContextInfo(
                context.as_ptr().cast(),
                sys::CL_CONTEXT_REFERENCE_COUNT,
                size,
                value,
                size_ret,
            )
        })
    }

    fn device_reference_count(&self, device: DeviceId) -> Result<u32> {
        scalar_info::<sys::cl_uint>("clGetDeviceInfo", |size, value, size_ret| unsafe {
            sys::clGetDeviceInfo(
                device.as_ptr().cast(),
                sys::CL_DEVICE_REFERENCE_COUNT,
                size,
                value,
                size_ret,
            )
        })
    }
}
