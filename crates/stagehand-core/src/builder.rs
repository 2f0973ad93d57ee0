//! Manifest building: directory traversal, package qualification, and
//! descriptor assembly.
//!
//! A package qualifies when its name carries the package extension and its
//! immediate parent directory is a recognized stage. Recognition is an
//! explicit allow-list; anything else is skipped with a debug notice.
//! Traversal is sorted by file name so the same tree always produces the
//! same manifest, byte for byte.

use crate::config::object_key;
use crate::hashing::hash_file;
use crate::publish::{Publisher, strip_query};
use anyhow::{Context, Result};
use stagehand_schema::{Manifest, PKG_EXTENSION, PackageDescriptor};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Publishing collaborator plus destination, handed to
/// [`ManifestBuilder::build`] when uploads are enabled.
pub struct PackageUpload<'a> {
    /// Storage backend performing the uploads.
    pub publisher: &'a dyn Publisher,
    /// Bucket receiving package objects.
    pub bucket: &'a str,
    /// Optional key prefix within the bucket.
    pub folder: Option<&'a str>,
}

/// Builds a [`Manifest`] from a root directory of stage subdirectories.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    recognized: BTreeSet<String>,
    install_path: String,
}

impl ManifestBuilder {
    /// Create a builder recognizing the given stage names.
    ///
    /// `install_path` is the install-time staging directory recorded in
    /// each descriptor's `file` attribute; a trailing slash is added if
    /// missing.
    pub fn new(stages: impl IntoIterator<Item = String>, install_path: &str) -> Self {
        let mut install_path = install_path.to_string();
        if !install_path.ends_with('/') {
            install_path.push('/');
        }

        Self {
            recognized: stages.into_iter().collect(),
            install_path,
        }
    }

    /// Walk `root` and assemble the manifest, uploading each package as it
    /// is discovered when `upload` is given.
    ///
    /// Every recognized stage directory appears in the result, empty or
    /// not. Descriptors keep traversal order within their stage.
    ///
    /// # Errors
    ///
    /// Fails if `root` is missing or untraversable, if a qualifying
    /// package cannot be hashed, or if any upload fails. No partial
    /// manifest is returned.
    pub async fn build(&self, root: &Path, upload: Option<&PackageUpload<'_>>) -> Result<Manifest> {
        if !root.is_dir() {
            anyhow::bail!(
                "Root directory {} does not exist or is not a directory",
                root.display()
            );
        }

        let mut manifest = Manifest::new();
        let pkg_suffix = format!(".{PKG_EXTENSION}");

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to traverse {}", root.display()))?;
            let Some(name) = entry.file_name().to_str() else {
                tracing::debug!("Skipping non-UTF-8 file name: {}", entry.path().display());
                continue;
            };

            if entry.file_type().is_dir() {
                if self.recognized.contains(name) {
                    manifest.register_stage(name);
                } else {
                    tracing::debug!("Ignoring unrecognized directory {}", entry.path().display());
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            if !name.ends_with(&pkg_suffix) {
                tracing::debug!("Skipping non-package file {}", entry.path().display());
                continue;
            }

            let Some(stage) = self.containing_stage(root, entry.path()) else {
                tracing::debug!("Skipping {}: not inside a recognized stage", entry.path().display());
                continue;
            };

            let hash = hash_file(entry.path())?;

            let url = match upload {
                Some(upload) => {
                    let key = object_key(upload.folder, name);
                    let raw = upload
                        .publisher
                        .publish(entry.path(), upload.bucket, &key, "application/octet-stream")
                        .await?;
                    strip_query(&raw).to_string()
                }
                None => String::new(),
            };

            manifest.push(
                &stage,
                PackageDescriptor {
                    file: format!("{}{name}", self.install_path),
                    hash,
                    name: name.to_string(),
                    url,
                },
            );
        }

        Ok(manifest)
    }

    /// The stage a file belongs to: the name of its immediate parent
    /// directory, provided that parent is not the root itself and is
    /// recognized.
    fn containing_stage(&self, root: &Path, file: &Path) -> Option<String> {
        let parent = file.parent()?;
        if parent == root {
            return None;
        }
        let name = parent.file_name()?.to_str()?;
        self.recognized
            .contains(name)
            .then(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // SHA-256 of the literal bytes "hello world".
    const HELLO_DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn builder() -> ManifestBuilder {
        let stages = ["prestage", "stage1", "stage2"].map(String::from);
        ManifestBuilder::new(stages, "/private/tmp/installapplications/")
    }

    /// Records publish calls and returns a fixed-form URL with a signed
    /// query string attached.
    struct StubPublisher {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl StubPublisher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Publisher for StubPublisher {
        async fn publish(
            &self,
            _local: &Path,
            bucket: &str,
            key: &str,
            content_type: &str,
        ) -> Result<String> {
            self.calls.lock().unwrap().push((
                bucket.to_string(),
                key.to_string(),
                content_type.to_string(),
            ));
            Ok(format!("https://example/{key}?X-Amz-Signature=abc"))
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _: &Path, _: &str, _: &str, _: &str) -> Result<String> {
            anyhow::bail!("upload rejected")
        }
    }

    #[tokio::test]
    async fn builds_descriptors_for_qualifying_packages() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/a.pkg", b"hello world");

        let manifest = builder().build(root.path(), None).await.unwrap();
        let packages = manifest.stage("stage1").unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].file, "/private/tmp/installapplications/a.pkg");
        assert_eq!(packages[0].hash.as_str(), HELLO_DIGEST);
        assert_eq!(packages[0].name, "a.pkg");
        assert_eq!(packages[0].url, "");
    }

    #[tokio::test]
    async fn empty_recognized_stage_still_appears() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("stage2")).unwrap();
        write(root.path(), "stage1/a.pkg", b"bytes");

        let manifest = builder().build(root.path(), None).await.unwrap();
        assert_eq!(manifest.stage("stage2"), Some(&[][..]));
    }

    #[tokio::test]
    async fn non_package_files_are_skipped() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/notes.txt", b"readme");
        write(root.path(), "stage1/a.pkg", b"bytes");

        let manifest = builder().build(root.path(), None).await.unwrap();
        let packages = manifest.stage("stage1").unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "a.pkg");
    }

    #[tokio::test]
    async fn unrecognized_directories_contribute_nothing() {
        let root = TempDir::new().unwrap();
        write(root.path(), "random/b.pkg", b"bytes");
        write(root.path(), "stage1/a.pkg", b"bytes");

        let manifest = builder().build(root.path(), None).await.unwrap();
        assert!(manifest.stage("random").is_none());
        assert_eq!(manifest.len(), 1);
        let all: Vec<_> = manifest
            .iter()
            .flat_map(|(_, pkgs)| pkgs)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(all, ["a.pkg"]);
    }

    #[tokio::test]
    async fn attribution_follows_immediate_parent() {
        let root = TempDir::new().unwrap();
        // Nested under an unrecognized subdirectory of a stage: excluded.
        write(root.path(), "stage1/sub/deep.pkg", b"bytes");
        // A recognized stage name nested deeper still attributes normally.
        write(root.path(), "extras/stage2/c.pkg", b"bytes");

        let manifest = builder().build(root.path(), None).await.unwrap();
        assert_eq!(manifest.stage("stage1"), Some(&[][..]));
        assert!(manifest.stage("sub").is_none());

        let stage2 = manifest.stage("stage2").unwrap();
        assert_eq!(stage2.len(), 1);
        assert_eq!(stage2[0].name, "c.pkg");
    }

    #[tokio::test]
    async fn descriptors_keep_traversal_order() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/c.pkg", b"c");
        write(root.path(), "stage1/a.pkg", b"a");
        write(root.path(), "stage1/b.pkg", b"b");

        let manifest = builder().build(root.path(), None).await.unwrap();
        let names: Vec<_> = manifest
            .stage("stage1")
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["a.pkg", "b.pkg", "c.pkg"]);
    }

    #[tokio::test]
    async fn missing_root_fails() {
        let err = builder()
            .build(Path::new("/nonexistent/rootdir"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Root directory"));
    }

    #[tokio::test]
    async fn same_tree_builds_identical_output() {
        let root = TempDir::new().unwrap();
        write(root.path(), "prestage/p.pkg", b"p");
        write(root.path(), "stage1/a.pkg", b"a");
        write(root.path(), "stage1/b.pkg", b"b");
        fs::create_dir(root.path().join("stage2")).unwrap();

        let b = builder();
        let first = b.build(root.path(), None).await.unwrap();
        let second = b.build(root.path(), None).await.unwrap();
        assert_eq!(
            first.to_json().unwrap(),
            second.to_json().unwrap()
        );
    }

    #[tokio::test]
    async fn published_urls_are_query_stripped() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/a.pkg", b"hello world");

        let publisher = StubPublisher::new();
        let upload = PackageUpload {
            publisher: &publisher,
            bucket: "pkgs",
            folder: Some("bootstrap"),
        };

        let manifest = builder()
            .build(root.path(), Some(&upload))
            .await
            .unwrap();
        let packages = manifest.stage("stage1").unwrap();
        assert_eq!(packages[0].url, "https://example/bootstrap/a.pkg");

        let calls = publisher.calls.lock().unwrap();
        assert_eq!(
            *calls,
            [(
                "pkgs".to_string(),
                "bootstrap/a.pkg".to_string(),
                "application/octet-stream".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn publish_failure_aborts_the_build() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/a.pkg", b"bytes");

        let upload = PackageUpload {
            publisher: &FailingPublisher,
            bucket: "pkgs",
            folder: None,
        };

        let err = builder()
            .build(root.path(), Some(&upload))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("upload rejected"));
    }

    #[tokio::test]
    async fn install_path_gains_trailing_slash() {
        let root = TempDir::new().unwrap();
        write(root.path(), "stage1/a.pkg", b"bytes");

        let stages = ["stage1".to_string()];
        let b = ManifestBuilder::new(stages, "/private/tmp/installapplications");
        let manifest = b.build(root.path(), None).await.unwrap();
        assert_eq!(
            manifest.stage("stage1").unwrap()[0].file,
            "/private/tmp/installapplications/a.pkg"
        );
    }
}
