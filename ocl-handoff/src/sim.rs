//! An in-process compute runtime with checked reference counting.
//!
//! [`SimRuntime`] implements [`ComputeRuntime`] without any driver. Devices
//! and contexts are reference-counted objects; platforms live as long as the
//! runtime. Once an object's count reaches zero it is freed, and every later
//! retain, release or query against it fails the way a real runtime reports
//! an invalid handle *and* is recorded as a [`Finding`]. That record is what
//! a memory sanitizer would report against a real driver.
//!
//! ```
//! use ocl_handoff::sim::SimRuntime;
//! use ocl_handoff::ComputeRuntime;
//!
//! let sim = SimRuntime::builder().platform("Sim Platform", 1).build();
//! let platform = sim.platform_ids().unwrap()[0];
//! let devices = sim.device_ids(platform, Default::default()).unwrap();
//! let context = sim.create_context(platform, &devices).unwrap();
//!
//! sim.release_context(context).unwrap();
//! assert!(sim.release_context(context).is_err());
//! assert_eq!(sim.findings().len(), 1);
//! ```
use crate::handle::{ContextId, DeviceId, PlatformId};
use crate::runtime::{ComputeRuntime, DeviceType, PlatformInfo};
use crate::{Error, Result};
use derive_more::Display;
use ocl_handoff_sys as sys;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const FIRST_HANDLE: usize = 0x1000;
const HANDLE_STRIDE: usize = 0x10;

/// The API entry points of the simulated runtime, for failure injection and
/// call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimCall {
    GetPlatformIds,
    GetDeviceIds,
    CreateContext,
    /// `clGetPlatformInfo` without a value buffer.
    PlatformInfoProbe,
    /// `clGetPlatformInfo` with a value buffer.
    PlatformInfoFetch,
    RetainContext,
    ReleaseContext,
    RetainDevice,
    ReleaseDevice,
    GetContextInfo,
    GetDeviceInfo,
}

impl SimCall {
    /// Name of the C entry point, as used in [`Error::Api`].
    pub fn name(self) -> &'static str {
        match self {
            SimCall::GetPlatformIds => "clGetPlatformIDs",
            SimCall::GetDeviceIds => "clGetDeviceIDs",
            SimCall::CreateContext => "clCreateContext",
            SimCall::PlatformInfoProbe | SimCall::PlatformInfoFetch => "clGetPlatformInfo",
            SimCall::RetainContext => "clRetainContext",
            SimCall::ReleaseContext => "clReleaseContext",
            SimCall::RetainDevice => "clRetainDevice",
            SimCall::ReleaseDevice => "clReleaseDevice",
            SimCall::GetContextInfo => "clGetContextInfo",
            SimCall::GetDeviceInfo => "clGetDeviceInfo",
        }
    }
}

impl fmt::Display for SimCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    #[display("device")]
    Device,
    #[display("context")]
    Context,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    /// A release reached an object whose count had already dropped to zero.
    #[display("release after free")]
    ReleaseAfterFree,
    /// A retain reached an object that was already freed.
    #[display("retain after free")]
    RetainAfterFree,
    /// A query or a context creation used an object that was already freed.
    #[display("query after free")]
    QueryAfterFree,
}

/// One invalid access recorded by the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub object: ObjectKind,
    /// The entry point that performed the access.
    pub call: &'static str,
    /// Raw address of the handle.
    pub handle: usize,
}

#[derive(Debug)]
struct SimDevice {
    device_type: DeviceType,
    /// Handle of the live object for this slot, if enumerated and not freed.
    live: Option<usize>,
}

#[derive(Debug)]
struct SimPlatform {
    handle: usize,
    name: Vec<u8>,
    devices: Vec<SimDevice>,
}

#[derive(Debug)]
struct SimObject {
    kind: ObjectKind,
    refs: u32,
    /// `(platform index, device slot)` for devices.
    slot: Option<(usize, usize)>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: usize,
    platforms: Vec<SimPlatform>,
    live: HashMap<usize, SimObject>,
    freed: HashMap<usize, ObjectKind>,
    findings: Vec<Finding>,
    failures: HashMap<SimCall, sys::cl_int>,
    calls: HashMap<SimCall, usize>,
    empty_platform_name: bool,
}

impl State {
    fn allocate(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += HANDLE_STRIDE;
        handle
    }

    /// Counts the call and applies an injected failure, if any.
    fn enter(&mut self, call: SimCall) -> Result<()> {
        *self.calls.entry(call).or_default() += 1;
        match self.failures.get(&call) {
            Some(&code) => Err(Error::Api {
                call: call.name(),
                code,
            }),
            None => Ok(()),
        }
    }

    fn platform_index(&self, platform: PlatformId) -> Result<usize> {
        let handle = platform.as_ptr() as usize;
        self.platforms
            .iter()
            .position(|p| p.handle == handle)
            .ok_or(Error::Api {
                call: "clGetPlatformInfo",
                code: sys::CL_INVALID_PLATFORM,
            })
    }

    /// Looks up a live object of `kind`, recording a finding if it was freed.
    fn object(
        &mut self,
        handle: usize,
        kind: ObjectKind,
        call: SimCall,
        finding: FindingKind,
    ) -> Result<&mut SimObject> {
        let code = match kind {
            ObjectKind::Device => sys::CL_INVALID_DEVICE,
            ObjectKind::Context => sys::CL_INVALID_CONTEXT,
        };
        if self.freed.get(&handle) == Some(&kind) {
            log::warn!("{call} on freed {kind} {handle:#x}: {finding}");
            self.findings.push(Finding {
                kind: finding,
                object: kind,
                call: call.name(),
                handle,
            });
            return Err(Error::Api {
                call: call.name(),
                code,
            });
        }
        match self.live.get_mut(&handle) {
            Some(object) if object.kind == kind => Ok(object),
            _ => Err(Error::Api {
                call: call.name(),
                code,
            }),
        }
    }

    fn retain(&mut self, handle: usize, kind: ObjectKind, call: SimCall) -> Result<()> {
        self.enter(call)?;
        self.object(handle, kind, call, FindingKind::RetainAfterFree)?.refs += 1;
        Ok(())
    }

    fn release(&mut self, handle: usize, kind: ObjectKind, call: SimCall) -> Result<()> {
        self.enter(call)?;
        let object = self.object(handle, kind, call, FindingKind::ReleaseAfterFree)?;
        object.refs -= 1;
        if object.refs == 0 {
            if let Some(object) = self.live.remove(&handle) {
                if let Some((platform, slot)) = object.slot {
                    self.platforms[platform].devices[slot].live = None;
                }
            }
            self.freed.insert(handle, kind);
            log::debug!("Freed {kind} {handle:#x}");
        }
        Ok(())
    }

    fn reference_count(&mut self, handle: usize, kind: ObjectKind, call: SimCall) -> Result<u32> {
        self.enter(call)?;
        Ok(self.object(handle, kind, call, FindingKind::QueryAfterFree)?.refs)
    }
}

/// Builder for [`SimRuntime`].
#[derive(Debug, Default)]
pub struct SimRuntimeBuilder {
    platforms: Vec<(Vec<u8>, Vec<DeviceType>)>,
    failures: HashMap<SimCall, sys::cl_int>,
    empty_platform_name: bool,
}

impl SimRuntimeBuilder {
    /// Adds a platform with `devices` GPU devices.
    pub fn platform(self, name: impl Into<String>, devices: usize) -> Self {
        self.platform_with_devices(name, &vec![DeviceType::Gpu; devices])
    }

    /// Adds a platform with one device per entry of `device_types`.
    pub fn platform_with_devices(
        mut self,
        name: impl Into<String>,
        device_types: &[DeviceType],
    ) -> Self {
        let name: String = name.into();
        self.platforms.push((name.into_bytes(), device_types.to_vec()));
        self
    }

    /// Adds a platform with one GPU device whose `CL_PLATFORM_NAME` is the
    /// raw `name` bytes, terminator excluded.
    pub fn platform_with_raw_name(mut self, name: &[u8]) -> Self {
        self.platforms.push((name.to_vec(), vec![DeviceType::Gpu]));
        self
    }

    /// Makes every `call` fail with status `code`.
    pub fn fail(mut self, call: SimCall, code: sys::cl_int) -> Self {
        self.failures.insert(call, code);
        self
    }

    /// Makes the `CL_PLATFORM_NAME` size probe report zero bytes.
    pub fn empty_platform_name(mut self) -> Self {
        self.empty_platform_name = true;
        self
    }

    pub fn build(self) -> SimRuntime {
        let mut state = State {
            next_handle: FIRST_HANDLE,
            failures: self.failures,
            empty_platform_name: self.empty_platform_name,
            ..Default::default()
        };
        for (name, device_types) in self.platforms {
            let handle = state.allocate();
            state.platforms.push(SimPlatform {
                handle,
                name,
                devices: device_types
                    .into_iter()
                    .map(|device_type| SimDevice {
                        device_type,
                        live: None,
                    })
                    .collect(),
            });
        }
        SimRuntime {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

/// A simulated compute runtime. Clones share state.
#[derive(Debug, Clone)]
pub struct SimRuntime {
    state: Arc<Mutex<State>>,
}

impl SimRuntime {
    pub fn builder() -> SimRuntimeBuilder {
        SimRuntimeBuilder::default()
    }

    /// A runtime with no platforms at all.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalid accesses recorded so far, in order.
    pub fn findings(&self) -> Vec<Finding> {
        self.state().findings.clone()
    }

    /// Number of devices and contexts with a non-zero reference count.
    pub fn live_objects(&self) -> usize {
        self.state().live.len()
    }

    /// How many times `call` was made, failed calls included.
    pub fn call_count(&self, call: SimCall) -> usize {
        self.state().calls.get(&call).copied().unwrap_or_default()
    }

    /// Reference count of the live device or context at `handle`.
    ///
    /// `None` once the object was freed or if it never existed. Unlike the
    /// runtime queries this is neither counted nor checked.
    pub fn reference_count(&self, handle: usize) -> Option<u32> {
        self.state().live.get(&handle).map(|object| object.refs)
    }

    /// Whether `context` has been freed.
    pub fn is_context_freed(&self, context: ContextId) -> bool {
        self.state().freed.get(&(context.as_ptr() as usize)) == Some(&ObjectKind::Context)
    }

    /// Whether `device` has been freed.
    pub fn is_device_freed(&self, device: DeviceId) -> bool {
        self.state().freed.get(&(device.as_ptr() as usize)) == Some(&ObjectKind::Device)
    }
}

fn handle_ptr(handle: usize) -> *mut c_void {
    handle as *mut c_void
}

impl ComputeRuntime for SimRuntime {
    fn platform_ids(&self) -> Result<Vec<PlatformId>> {
        let mut state = self.state();
        state.enter(SimCall::GetPlatformIds)?;
        state
            .platforms
            .iter()
            .map(|p| {
                unsafe { PlatformId::from_ptr(handle_ptr(p.handle)) }
                    .ok_or(Error::NullHandle("platform"))
            })
            .collect()
    }

    fn device_ids(&self, platform: PlatformId, device_type: DeviceType) -> Result<Vec<DeviceId>> {
        let mut state = self.state();
        state.enter(SimCall::GetDeviceIds)?;
        let index = state.platform_index(platform).map_err(|_| Error::Api {
            call: SimCall::GetDeviceIds.name(),
            code: sys::CL_INVALID_PLATFORM,
        })?;

        let mut handles = Vec::new();
        for slot in 0..state.platforms[index].devices.len() {
            let (slot_type, live) = {
                let device = &state.platforms[index].devices[slot];
                (device.device_type, device.live)
            };
            // The first device of a platform is its default device.
            let matches = match device_type {
                DeviceType::Default => slot == 0,
                DeviceType::All => true,
                _ => slot_type == device_type,
            };
            if !matches {
                continue;
            }
            // Each enumeration hands the caller one reference.
            let handle = match live {
                Some(handle) => {
                    if let Some(object) = state.live.get_mut(&handle) {
                        object.refs += 1;
                    }
                    handle
                }
                None => {
                    let handle = state.allocate();
                    state.live.insert(
                        handle,
                        SimObject {
                            kind: ObjectKind::Device,
                            refs: 1,
                            slot: Some((index, slot)),
                        },
                    );
                    state.platforms[index].devices[slot].live = Some(handle);
                    handle
                }
            };
            handles.push(handle);
        }

        handles
            .into_iter()
            .map(|h| unsafe { DeviceId::from_ptr(handle_ptr(h)) }.ok_or(Error::NullHandle("device")))
            .collect()
    }

    fn create_context(&self, platform: PlatformId, devices: &[DeviceId]) -> Result<ContextId> {
        let mut state = self.state();
        state.enter(SimCall::CreateContext)?;
        state.platform_index(platform).map_err(|_| Error::Api {
            call: SimCall::CreateContext.name(),
            code: sys::CL_INVALID_PLATFORM,
        })?;
        if devices.is_empty() {
            return Err(Error::Api {
                call: SimCall::CreateContext.name(),
                code: sys::CL_INVALID_VALUE,
            });
        }
        for device in devices {
            state.object(
                device.as_ptr() as usize,
                ObjectKind::Device,
                SimCall::CreateContext,
                FindingKind::QueryAfterFree,
            )?;
        }

        let handle = state.allocate();
        state.live.insert(
            handle,
            SimObject {
                kind: ObjectKind::Context,
                refs: 1,
                slot: None,
            },
        );
        log::debug!("Created context {handle:#x}");
        unsafe { ContextId::from_ptr(handle_ptr(handle)) }.ok_or(Error::NullHandle("context"))
    }

    fn platform_info(
        &self,
        platform: PlatformId,
        param: PlatformInfo,
        value: Option<&mut [u8]>,
    ) -> Result<usize> {
        let mut state = self.state();
        let call = match value {
            None => SimCall::PlatformInfoProbe,
            Some(_) => SimCall::PlatformInfoFetch,
        };
        state.enter(call)?;
        let index = state.platform_index(platform)?;

        if param == PlatformInfo::Name && state.empty_platform_name && value.is_none() {
            return Ok(0);
        }
        let mut bytes = match param {
            PlatformInfo::Name => state.platforms[index].name.clone(),
            PlatformInfo::Vendor => b"ocl-handoff".to_vec(),
            PlatformInfo::Version => b"OpenCL 3.0 simulated".to_vec(),
            PlatformInfo::Profile => b"FULL_PROFILE".to_vec(),
            PlatformInfo::Extensions => Vec::new(),
        };
        bytes.push(0);

        match value {
            None => Ok(bytes.len()),
            Some(buffer) if buffer.len() < bytes.len() => Err(Error::Api {
                call: call.name(),
                code: sys::CL_INVALID_VALUE,
            }),
            Some(buffer) => {
                buffer[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
        }
    }

    fn retain_context(&self, context: ContextId) -> Result<()> {
        self.state().retain(
            context.as_ptr() as usize,
            ObjectKind::Context,
            SimCall::RetainContext,
        )
    }

    fn release_context(&self, context: ContextId) -> Result<()> {
        self.state().release(
            context.as_ptr() as usize,
            ObjectKind::Context,
            SimCall::ReleaseContext,
        )
    }

    fn retain_device(&self, device: DeviceId) -> Result<()> {
        self.state().retain(
            device.as_ptr() as usize,
            ObjectKind::Device,
            SimCall::RetainDevice,
        )
    }

    fn release_device(&self, device: DeviceId) -> Result<()> {
        self.state().release(
            device.as_ptr() as usize,
            ObjectKind::Device,
            SimCall::ReleaseDevice,
        )
    }

    fn context_reference_count(&self, context: ContextId) -> Result<u32> {
        self.state().reference_count(
            context.as_ptr() as usize,
            ObjectKind::Context,
            SimCall::GetContextInfo,
        )
    }

    fn device_reference_count(&self, device: DeviceId) -> Result<u32> {
        self.state().reference_count(
            device.as_ptr() as usize,
            ObjectKind::Device,
            SimCall::GetDeviceInfo,
        )
    }
}
