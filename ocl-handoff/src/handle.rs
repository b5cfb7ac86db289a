//! Handle identifiers and owning wrappers.
//!
//! The identifiers ([`PlatformId`], [`DeviceId`], [`ContextId`]) are plain
//! copies of what the runtime hands out. Copying one never changes a
//! reference count; they are what gets passed to another thread.
//!
//! [`OwnedContext`] and [`OwnedDevice`] hold exactly one reference each and
//! give it back exactly once, either through `release()` or on drop.
use crate::runtime::SharedRuntime;
use crate::Result;
use derive_more::Display;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(NonNull<c_void>);

        // The runtime's handles are opaque identifiers, valid on any thread.
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}

        impl $name {
            /// Wraps a raw handle. Returns `None` for null.
            ///
            /// # Safety
            ///
            /// The caller must ensure `ptr` was handed out by the runtime the
            /// identifier will be used with.
            pub unsafe fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                NonNull::new(ptr).map(Self)
            }

            /// Get the raw pointer for FFI calls.
            #[inline]
            pub fn as_ptr(&self) -> *mut c_void {
                self.0.as_ptr()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), self.0)
            }
        }
    };
}

handle_id!(
    /// Identifier of a compute platform. Platforms are never released.
    PlatformId
);
handle_id!(
    /// Identifier of a compute device.
    DeviceId
);
handle_id!(
    /// Identifier of a compute context.
    ContextId
);

/// Whether a holder of a handle is responsible for releasing it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Used without being responsible for its release.
    #[display("borrowed")]
    Borrowed,
    /// Holds one reference that must be matched by exactly one release.
    #[display("owned")]
    Owned,
}

/// A context reference owned by the holder.
pub struct OwnedContext {
    id: Option<ContextId>,
    runtime: SharedRuntime,
}

impl OwnedContext {
    /// Takes over one existing reference to `id`.
    ///
    /// The caller gives up its reference: it must not release `id` itself.
    pub fn adopt(runtime: SharedRuntime, id: ContextId) -> Self {
        Self {
            id: Some(id),
            runtime,
        }
    }

    /// Returns the plain identifier. The reference stays here.
    #[inline]
    pub fn id(&self) -> ContextId {
        self.id.expect("OwnedContext used after release")
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        Ownership::Owned
    }

    /// Retains the context and returns a second owner.
    pub fn try_clone(&self) -> Result<Self> {
        self.runtime.retain_context(self.id())?;
        Ok(Self::adopt(self.runtime.clone(), self.id()))
    }

    /// Gives the reference back to the runtime.
    pub fn release(mut self) -> Result<()> {
        match self.id.take() {
            Some(id) => self.runtime.release_context(id),
            None => Ok(()),
        }
    }

    /// Hands the reference to the caller without releasing it.
    pub fn into_raw(mut self) -> ContextId {
        self.id.take().expect("OwnedContext used after release")
    }
}

impl Drop for OwnedContext {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.runtime.release_context(id) {
                log::error!("Dropping {id:?}: {e}");
            }
        }
    }
}

impl fmt::Debug for OwnedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedContext").field("id", &self.id).finish()
    }
}

/// A device reference owned by the holder.
pub struct OwnedDevice {
    id: Option<DeviceId>,
    runtime: SharedRuntime,
}

impl OwnedDevice {
    /// Takes over one existing reference to `id`.
    pub fn adopt(runtime: SharedRuntime, id: DeviceId) -> Self {
        Self {
            id: Some(id),
            runtime,
        }
    }

    #[inline]
    pub fn id(&self) -> DeviceId {
        self.id.expect("OwnedDevice used after release")
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        Ownership::Owned
    }

    /// Retains the device and returns a second owner.
    pub fn try_clone(&self) -> Result<Self> {
        self.runtime.retain_device(self.id())?;
        Ok(Self::adopt(self.runtime.clone(), self.id()))
    }

    /// Gives the reference back to the runtime.
    pub fn release(mut self) -> Result<()> {
        match self.id.take() {
            Some(id) => self.runtime.release_device(id),
            None => Ok(()),
        }
    }

    /// Hands the reference to the caller without releasing it.
    pub fn into_raw(mut self) -> DeviceId {
        self.id.take().expect("OwnedDevice used after release")
    }
}

impl Drop for OwnedDevice {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.runtime.release_device(id) {
                log::error!("Dropping {id:?}: {e}");
            }
        }
    }
}

impl fmt::Debug for OwnedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedDevice").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn null_handles_are_rejected() {
        assert!(unsafe { PlatformId::from_ptr(ptr::null_mut()) }.is_none());
        assert!(unsafe { DeviceId::from_ptr(ptr::null_mut()) }.is_none());
        assert!(unsafe { ContextId::from_ptr(ptr::null_mut()) }.is_none());
    }

    #[test]
    fn identifiers_round_trip_the_raw_pointer() {
        let raw = 0x1234 as *mut c_void;
        let context = unsafe { ContextId::from_ptr(raw) }.unwrap();
        assert_eq!(context.as_ptr(), raw);
        assert_eq!(format!("{context:?}"), "ContextId(0x1234)");
    }
}
