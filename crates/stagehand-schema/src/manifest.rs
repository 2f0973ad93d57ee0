//! Bootstrap manifest structures and deterministic JSON rendering.
//!
//! The manifest maps each stage name to the ordered list of packages the
//! bootstrap agent installs during that stage. Rendering is byte-for-byte
//! reproducible: stage keys serialize sorted (`BTreeMap`), descriptor
//! fields serialize in lexicographic declaration order, and the indent is
//! fixed at two spaces.

use crate::hash::Sha256Hash;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One installer package as recorded in the manifest.
///
/// Field declaration order is lexicographic on purpose: serde emits struct
/// fields in declaration order, and consumers diff manifests textually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Absolute path the package occupies at install time (staging
    /// directory prefix + bare file name, independent of the source tree).
    pub file: String,
    /// SHA-256 digest of the package bytes.
    pub hash: Sha256Hash,
    /// Bare file name, included for consumer convenience.
    pub name: String,
    /// Retrieval URL; empty exactly when the package was not published.
    pub url: String,
}

/// Mapping from stage name to discovery-ordered package descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    stages: BTreeMap<String, Vec<PackageDescriptor>>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `stage` with an empty package list if it is not already
    /// present. Idempotent: a stage's list is initialized at most once, so
    /// re-visiting a directory name never resets collected packages.
    pub fn register_stage(&mut self, stage: &str) {
        if !self.stages.contains_key(stage) {
            self.stages.insert(stage.to_string(), Vec::new());
        }
    }

    /// Append a descriptor to `stage`, registering the stage if needed.
    pub fn push(&mut self, stage: &str, descriptor: PackageDescriptor) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .push(descriptor);
    }

    /// Packages recorded for `stage`, or `None` if the stage was never
    /// visited.
    pub fn stage(&self, stage: &str) -> Option<&[PackageDescriptor]> {
        self.stages.get(stage).map(Vec::as_slice)
    }

    /// Iterate over `(stage, packages)` pairs in sorted stage order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PackageDescriptor])> {
        self.stages
            .iter()
            .map(|(stage, pkgs)| (stage.as_str(), pkgs.as_slice()))
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// `true` if no stage has been registered.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total number of package descriptors across all stages.
    pub fn package_count(&self) -> usize {
        self.stages.values().map(Vec::len).sum()
    }

    /// Render the manifest as deterministic, 2-space-indented JSON with a
    /// trailing newline. Two semantically equal manifests produce
    /// byte-identical output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .context("Failed to serialize manifest")?;
        let mut out = String::from_utf8(buf).context("Manifest JSON was not valid UTF-8")?;
        out.push('\n');
        Ok(out)
    }

    /// Parse a manifest from its JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid manifest document.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse manifest JSON")
    }
}
