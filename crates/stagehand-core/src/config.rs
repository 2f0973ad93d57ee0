//! Layered configuration resolution.
//!
//! Publishing settings come from two layers: a JSON credentials file
//! supplies defaults, and explicit command-line flags override them. One
//! resolution step validates the result into an immutable [`PublishConfig`];
//! nothing downstream re-checks option combinations.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Keys recognized in an S3 credentials file.
///
/// All keys are optional at the file level; requiredness is enforced by
/// [`PublishConfig::resolve`] once flag overrides have been layered on top.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsFile {
    /// AWS access key ID.
    pub awsaccesskey: Option<String>,
    /// AWS secret access key.
    pub awssecretkey: Option<String>,
    /// S3 region, e.g. `us-east-2`.
    pub s3region: Option<String>,
    /// Bucket receiving package uploads.
    pub s3bucket: Option<String>,
    /// Key prefix for package uploads within the bucket.
    pub s3bucketfolder: Option<String>,
    /// Bucket receiving the manifest upload; defaults to `s3bucket`.
    pub json_s3bucket: Option<String>,
    /// Key prefix for the manifest upload; defaults to `s3bucketfolder`.
    pub json_s3bucketfolder: Option<String>,
}

impl CredentialsFile {
    /// Load and parse a credentials file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or is not a
    /// valid JSON object.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::ParseCredentials {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Flag-level publishing overrides, layered over a [`CredentialsFile`].
#[derive(Debug, Clone, Default)]
pub struct PublishOverrides {
    /// Overrides `awsaccesskey`.
    pub access_key: Option<String>,
    /// Overrides `awssecretkey`.
    pub secret_key: Option<String>,
    /// Overrides `s3region`.
    pub region: Option<String>,
    /// Overrides `s3bucket`.
    pub bucket: Option<String>,
    /// Overrides `s3bucketfolder`.
    pub bucket_folder: Option<String>,
    /// Overrides `json_s3bucket`.
    pub manifest_bucket: Option<String>,
    /// Overrides `json_s3bucketfolder`.
    pub manifest_folder: Option<String>,
}

/// Immutable, fully-resolved publishing settings.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// AWS access key ID.
    pub access_key: String,
    /// AWS secret access key.
    pub secret_key: String,
    /// S3 region.
    pub region: String,
    /// Bucket receiving package uploads.
    pub bucket: String,
    /// Key prefix for package uploads.
    pub bucket_folder: Option<String>,
    /// Bucket receiving the manifest upload.
    pub manifest_bucket: String,
    /// Key prefix for the manifest upload.
    pub manifest_folder: Option<String>,
}

impl PublishConfig {
    /// Resolve publishing settings from file defaults and flag overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming the first required
    /// key that neither layer supplies.
    pub fn resolve(
        file: CredentialsFile,
        overrides: PublishOverrides,
    ) -> Result<Self, ConfigError> {
        let access_key = overrides
            .access_key
            .or(file.awsaccesskey)
            .ok_or(ConfigError::MissingCredential("awsaccesskey"))?;
        let secret_key = overrides
            .secret_key
            .or(file.awssecretkey)
            .ok_or(ConfigError::MissingCredential("awssecretkey"))?;
        let region = overrides
            .region
            .or(file.s3region)
            .ok_or(ConfigError::MissingCredential("s3region"))?;
        let bucket = overrides
            .bucket
            .or(file.s3bucket)
            .ok_or(ConfigError::MissingCredential("s3bucket"))?;

        let bucket_folder = overrides.bucket_folder.or(file.s3bucketfolder);
        let manifest_bucket = overrides
            .manifest_bucket
            .or(file.json_s3bucket)
            .unwrap_or_else(|| bucket.clone());
        let manifest_folder = overrides
            .manifest_folder
            .or(file.json_s3bucketfolder)
            .or_else(|| bucket_folder.clone());

        Ok(Self {
            access_key,
            secret_key,
            region,
            bucket,
            bucket_folder,
            manifest_bucket,
            manifest_folder,
        })
    }
}

/// Top-level immutable configuration for one run.
///
/// Built once from the command line (and optionally a credentials file),
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory containing the stage subdirectories.
    pub root_dir: PathBuf,
    /// Directory the manifest is written to.
    pub output_dir: PathBuf,
    /// Stage directory names to recognize.
    pub stages: Vec<String>,
    /// Install-time staging directory recorded in package paths.
    pub install_path: String,
    /// Publishing settings; `None` disables uploads entirely.
    pub publish: Option<PublishConfig>,
}

/// Join an optional key prefix with an object name.
pub fn object_key(folder: Option<&str>, name: &str) -> String {
    match folder {
        Some(folder) => format!("{}/{name}", folder.trim_end_matches('/')),
        None => name.to_string(),
    }
}
