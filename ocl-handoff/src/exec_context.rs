//! Per-thread execution context.
//!
//! An [`ExecutionContext`] associates a platform/device/context triple with
//! the calling thread so that work dispatched from that thread runs on the
//! given device. Binding moves the wrapper into thread-local storage; it is
//! torn down when it is replaced, unbound and dropped, or when the thread
//! exits and its thread-local storage unwinds.
//!
//! What teardown does to the wrapped handles is the [`TeardownPolicy`]. The
//! wrapper is created from handles that somebody else created, so anything
//! other than [`TeardownPolicy::Borrow`] or a balanced
//! [`TeardownPolicy::Retain`] gives back a reference the wrapper never took.
use crate::handle::{ContextId, DeviceId, Ownership, PlatformId};
use crate::platform::platform_name;
use crate::runtime::SharedRuntime;
use crate::Result;
use derive_more::Display;
use std::cell::RefCell;
use std::fmt;

thread_local! {
    static ACTIVE: RefCell<Option<ExecutionContext>> = RefCell::new(None);
}

/// What an [`ExecutionContext`] does with its handles when it is torn down.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TeardownPolicy {
    /// Releases context and device on teardown without having retained
    /// them, i.e. silently takes over the creator's references. This is the
    /// behaviour observed in the wild: the creator's own release afterwards
    /// is a double release.
    #[default]
    #[display("adopt")]
    Adopt,
    /// Only borrows the handles. Teardown never releases.
    #[display("borrow")]
    Borrow,
    /// Retains context and device when created and releases them on
    /// teardown, 1:1.
    #[display("retain")]
    Retain,
}

impl TeardownPolicy {
    /// The ownership the wrapper holds over its handles under this policy.
    pub fn ownership(self) -> Ownership {
        match self {
            TeardownPolicy::Borrow => Ownership::Borrowed,
            TeardownPolicy::Adopt | TeardownPolicy::Retain => Ownership::Owned,
        }
    }
}

/// A platform/device/context triple bound (or bindable) to a thread.
pub struct ExecutionContext {
    name: String,
    platform: PlatformId,
    context: ContextId,
    device: DeviceId,
    policy: TeardownPolicy,
    runtime: SharedRuntime,
}

impl ExecutionContext {
    /// Wraps externally created handles.
    ///
    /// Under [`TeardownPolicy::Retain`] the context and the device are
    /// retained here; under the other policies no reference count changes.
    pub fn create(
        runtime: SharedRuntime,
        name: impl Into<String>,
        platform: PlatformId,
        context: ContextId,
        device: DeviceId,
        policy: TeardownPolicy,
    ) -> Result<Self> {
        if policy == TeardownPolicy::Retain {
            runtime.retain_context(context)?;
            if let Err(e) = runtime.retain_device(device) {
                if let Err(rollback) = runtime.release_context(context) {
                    log::error!("Rolling back retain of {context:?}: {rollback}");
                }
                return Err(e);
            }
        }

        Ok(Self {
            name: name.into(),
            platform,
            context,
            device,
            policy,
            runtime,
        })
    }

    /// Installs this as the calling thread's active execution context.
    ///
    /// Returns the context that was active before, if any. Dropping it tears
    /// it down.
    pub fn bind(self) -> Option<ExecutionContext> {
        log::debug!(
            "Binding execution context \"{}\" ({}) to the current thread",
            self.name,
            self.policy
        );
        ACTIVE.with(|active| active.borrow_mut().replace(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> PlatformId {
        self.platform
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn policy(&self) -> TeardownPolicy {
        self.policy
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.policy.ownership()
    }

    fn teardown(&mut self) -> Result<()> {
        match self.policy {
            TeardownPolicy::Borrow => Ok(()),
            TeardownPolicy::Adopt | TeardownPolicy::Retain => {
                log::debug!(
                    "Execution context \"{}\" releasing {:?} and {:?}",
                    self.name,
                    self.context,
                    self.device
                );
                let context = self.runtime.release_context(self.context);
                let device = self.runtime.release_device(self.device);
                context.and(device)
            }
        }
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("Tearing down execution context \"{}\": {e}", self.name);
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("context", &self.context)
            .field("device", &self.device)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Removes the calling thread's active execution context.
///
/// Unbinding never releases anything by itself; what happens to the handles
/// is decided when the returned wrapper is dropped.
pub fn unbind() -> Option<ExecutionContext> {
    ACTIVE.with(|active| active.borrow_mut().take())
}

/// Runs `f` with the calling thread's active execution context.
pub fn with_current<R>(f: impl FnOnce(&ExecutionContext) -> R) -> Option<R> {
    ACTIVE.with(|active| active.borrow().as_ref().map(f))
}

/// Whether the calling thread has an active execution context.
pub fn is_bound() -> bool {
    with_current(|_| ()).is_some()
}

/// Worker-thread entry: names the platform, wraps the borrowed handles and
/// binds them to the calling thread.
///
/// The wrapper stays bound until the thread exits.
pub fn bind_on_current_thread(
    runtime: SharedRuntime,
    platform: PlatformId,
    device: DeviceId,
    context: ContextId,
    policy: TeardownPolicy,
) -> Result<()> {
    let name = platform_name(&*runtime, platform)?;
    log::info!("Initialising execution context with platform \"{name}\"");

    let execution_context =
        ExecutionContext::create(runtime, name, platform, context, device, policy)?;
    if let Some(previous) = execution_context.bind() {
        log::debug!("Replacing execution context \"{}\"", previous.name());
    }

    Ok(())
}
