//! Platform info queries.
use crate::handle::PlatformId;
use crate::runtime::{ComputeRuntime, PlatformInfo};
use crate::{Error, Result};

/// Reads a string property of `platform` with the two-call pattern.
///
/// The first call probes the required size; a zero size is an error. The
/// second call fetches into a buffer of exactly that size. The trailing NUL
/// the runtime writes is stripped.
pub fn platform_info_string(
    runtime: &dyn ComputeRuntime,
    platform: PlatformId,
    param: PlatformInfo,
) -> Result<String> {
    let size = runtime.platform_info(platform, param, None)?;
    if size == 0 {
        return Err(Error::EmptyPlatformInfo { param });
    }

    let mut buffer = vec![0u8; size];
    let written = runtime.platform_info(platform, param, Some(&mut buffer))?;
    buffer.truncate(written.min(size));
    if buffer.last() == Some(&0) {
        buffer.pop();
    }

    Ok(String::from_utf8(buffer)?)
}

/// The human readable name of `platform`.
#[inline]
pub fn platform_name(runtime: &dyn ComputeRuntime, platform: PlatformId) -> Result<String> {
    platform_info_string(runtime, platform, PlatformInfo::Name)
}
