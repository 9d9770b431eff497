// src/classify.rs

//! Environment classification for backend selection.
//!
//! Native file events do not propagate reliably through the bind-mounted
//! filesystems used by Docker Desktop (`linuxkit` kernels) and WSL. The
//! classifier inspects the kernel release string once at startup and vetoes
//! the native backend in those environments. The probe itself is a plain
//! function so tests (and embedders on unusual platforms) can inject their
//! own identification string.

use tracing::debug;

/// Kernel release markers for environments where native events are known to
/// be unreliable.
const UNRELIABLE_MARKERS: &[&str] = &["linuxkit", "WSL"];

/// Whether the native event mechanism can be trusted in this environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NativeReliable,
    NativeUnreliable,
}

/// Classify a kernel/host identification string.
///
/// `None` means the probe itself failed; we then distrust native events and
/// let the factory fall back to polling.
pub fn classify_release(release: Option<&str>) -> Verdict {
    let Some(release) = release else {
        debug!("kernel release probe failed, treating native events as unreliable");
        return Verdict::NativeUnreliable;
    };

    debug!(release, "kernel release detected");

    if UNRELIABLE_MARKERS.iter().any(|m| release.contains(m)) {
        Verdict::NativeUnreliable
    } else {
        Verdict::NativeReliable
    }
}

/// Default probe: the kernel release string of the running host.
///
/// Equivalent to `uname -r` on Linux. On other platforms there is no kernel
/// release to inspect (and none of the unreliable markers apply), so the OS
/// name stands in as the identification string.
#[cfg(target_os = "linux")]
pub fn kernel_release() -> Option<String> {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(not(target_os = "linux"))]
pub fn kernel_release() -> Option<String> {
    Some(std::env::consts::OS.to_string())
}
