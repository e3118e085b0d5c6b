//! Versioning for everything Verax exposes to reporting layers.

/// Bumped whenever a serialized field is added, renamed or removed.
pub const CONTRACT_VERSION: u32 = 1;

/// Check a `contractVersion` read from disk.
pub fn is_supported(version: u32) -> bool {
    version == CONTRACT_VERSION
}
