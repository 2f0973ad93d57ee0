//! Shared types and wire format for stagehand.
//!
//! The bootstrap manifest produced by stagehand is consumed by an
//! install-time agent running on the target machine, so the types here are
//! the contract between the two: a mapping from stage name to an ordered
//! list of package descriptors, rendered as deterministic JSON.

pub mod hash;
pub mod manifest;

// Re-exports
pub use hash::Sha256Hash;
pub use manifest::{Manifest, PackageDescriptor};

/// File extension (without the dot) that marks a file as an installer package.
pub const PKG_EXTENSION: &str = "pkg";

/// File name of the serialized manifest.
pub const MANIFEST_FILE_NAME: &str = "bootstrap.json";

/// Install-time staging directory the bootstrap agent downloads packages into.
///
/// Package descriptors record their destination under this prefix regardless
/// of where the source tree lives at build time.
pub const DEFAULT_INSTALL_PATH: &str = "/private/tmp/installapplications/";

/// Stage directory names recognized by default.
pub const DEFAULT_STAGES: [&str; 3] = ["prestage", "stage1", "stage2"];
