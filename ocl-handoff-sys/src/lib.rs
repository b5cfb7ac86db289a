//! Raw declarations of the parts of the OpenCL C API that `ocl-handoff`
//! drives: platform and device enumeration, context creation, info queries
//! and the explicit retain/release calls.
//!
//! Types and constants are always available. The functions are only
//! declared (and `libOpenCL` only linked) with the `opencl` feature.
#![allow(non_camel_case_types)]

pub mod status;
pub use status::*;

pub mod platform;
pub use platform::*;

pub mod device;
pub use device::*;

pub mod context;
pub use context::*;

pub type cl_int = i32;
pub type cl_uint = u32;
pub type cl_ulong = u64;
pub type cl_bool = cl_uint;
pub type cl_bitfield = cl_ulong;

pub const CL_FALSE: cl_bool = 0;
pub const CL_TRUE: cl_bool = 1;
