//! Error types for the ocl-handoff crate.

use crate::runtime::{DeviceType, PlatformInfo};
use ocl_handoff_sys as sys;
use thiserror::Error;

/// Main error type for ocl-handoff operations.
///
/// Every variant is fatal for the demonstration; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Platform enumeration succeeded but reported no platform.
    #[error("Failed to find any OpenCL platforms")]
    NoPlatform,

    /// Device enumeration on the first platform reported no device.
    #[error("Failed to find any OpenCL devices of type {device_type}")]
    NoDevice { device_type: DeviceType },

    /// A compute API call returned something other than `CL_SUCCESS`.
    #[error("{call} failed with {} ({code})", describe(.code))]
    Api { call: &'static str, code: sys::cl_int },

    /// A platform info size probe reported zero bytes.
    #[error("clGetPlatformInfo returned 0 size for {param}")]
    EmptyPlatformInfo { param: PlatformInfo },

    /// Platform info was not valid UTF-8.
    #[error("Platform info is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The runtime handed out a null handle.
    #[error("Unexpected null {0} handle")]
    NullHandle(&'static str),

    /// The worker thread panicked before it could report back.
    #[error("Execution-context worker thread panicked")]
    WorkerPanicked,

    /// The worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Symbolic name of a status code, e.g. `CL_INVALID_CONTEXT`.
pub fn status_name(code: sys::cl_int) -> String {
    sys::Status::name_of(code).unwrap_or_else(|| "unknown status".to_string())
}

fn describe(code: &sys::cl_int) -> String {
    status_name(*code)
}

impl Error {
    /// Converts a raw status into `Ok(())` or [`Error::Api`] attributed to
    /// `call`.
    pub fn check(call: &'static str, code: sys::cl_int) -> Result<()> {
        if code == sys::CL_SUCCESS {
            Ok(())
        } else {
            Err(Error::Api { call, code })
        }
    }

    /// Returns the raw status if this is an [`Error::Api`] for `call`.
    pub fn api_code(&self, call: &str) -> Option<sys::cl_int> {
        match self {
            Error::Api { call: c, code } if *c == call => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_names_call_and_status() {
        let err = Error::check("clReleaseContext", sys::CL_INVALID_CONTEXT).unwrap_err();
        assert_eq!(
            err.to_string(),
            "clReleaseContext failed with CL_INVALID_CONTEXT (-34)"
        );
        assert_eq!(
            err.api_code("clReleaseContext"),
            Some(sys::CL_INVALID_CONTEXT)
        );
        assert_eq!(err.api_code("clReleaseDevice"), None);
    }

    #[test]
    fn unknown_status_is_reported_numerically() {
        let err = Error::Api {
            call: "clCreateContext",
            code: -9999,
        };
        assert_eq!(
            err.to_string(),
            "clCreateContext failed with unknown status (-9999)"
        );
    }

    #[test]
    fn success_is_not_an_error() {
        assert!(Error::check("clGetPlatformIDs", sys::CL_SUCCESS).is_ok());
    }
}
