//! stagehand - deployment bootstrap manifest generator
//!
//! Walks a root directory of stage subdirectories, fingerprints every
//! installer package with SHA-256, optionally uploads packages (and the
//! manifest itself) to S3, and writes `bootstrap.json` describing each
//! stage's ordered package list.

pub mod cmd;

use anyhow::Result;
use clap::Parser;
use stagehand_core::config::{Config, CredentialsFile, PublishConfig, PublishOverrides};
use stagehand_schema::{DEFAULT_INSTALL_PATH, DEFAULT_STAGES};
use std::path::PathBuf;

/// Command-line surface of the `stagehand` binary.
#[derive(Debug, Parser)]
#[command(name = "stagehand")]
#[command(author, version, about = "Build a bootstrap manifest for staged package installs")]
pub struct Cli {
    /// Root directory containing the stage subdirectories
    #[arg(long, value_name = "PATH")]
    pub root_dir: PathBuf,

    /// Directory the manifest is written to (defaults to the root directory)
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Stage directory name to recognize (repeatable)
    #[arg(long = "stage", value_name = "NAME", default_values_t = DEFAULT_STAGES.map(String::from))]
    pub stages: Vec<String>,

    /// Install-time staging directory recorded in package paths
    #[arg(long, value_name = "PATH", default_value = DEFAULT_INSTALL_PATH)]
    pub install_path: String,

    /// Upload packages and the manifest to S3
    #[arg(long)]
    pub s3: bool,

    /// Path to an S3 credentials JSON file
    #[arg(long, value_name = "PATH")]
    pub s3_config_file: Option<PathBuf>,

    /// AWS access key (overrides the config file)
    #[arg(long, value_name = "KEY")]
    pub aws_access_key: Option<String>,

    /// AWS secret access key (overrides the config file)
    #[arg(long, value_name = "KEY")]
    pub aws_secret_key: Option<String>,

    /// S3 region, e.g. us-east-2 (overrides the config file)
    #[arg(long, value_name = "REGION")]
    pub s3_region: Option<String>,

    /// S3 bucket for package uploads (overrides the config file)
    #[arg(long, value_name = "BUCKET")]
    pub s3_bucket: Option<String>,

    /// Key prefix for package uploads (overrides the config file)
    #[arg(long, value_name = "FOLDER")]
    pub s3_bucket_folder: Option<String>,

    /// S3 bucket for the manifest upload (defaults to the package bucket)
    #[arg(long, value_name = "BUCKET")]
    pub manifest_s3_bucket: Option<String>,

    /// Key prefix for the manifest upload (defaults to the package prefix)
    #[arg(long, value_name = "FOLDER")]
    pub manifest_s3_bucket_folder: Option<String>,
}

impl Cli {
    /// Resolve the parsed arguments into one immutable [`Config`].
    ///
    /// Publishing settings are only resolved (and validated) when `--s3`
    /// is given; without it the credential flags and file are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials file cannot be loaded or a
    /// required credential is missing.
    pub fn into_config(self) -> Result<Config> {
        let publish = if self.s3 {
            let file = match &self.s3_config_file {
                Some(path) => CredentialsFile::load(path)?,
                None => CredentialsFile::default(),
            };

            let overrides = PublishOverrides {
                access_key: self.aws_access_key,
                secret_key: self.aws_secret_key,
                region: self.s3_region,
                bucket: self.s3_bucket,
                bucket_folder: self.s3_bucket_folder,
                manifest_bucket: self.manifest_s3_bucket,
                manifest_folder: self.manifest_s3_bucket_folder,
            };

            Some(PublishConfig::resolve(file, overrides)?)
        } else {
            None
        };

        let output_dir = self.output_dir.unwrap_or_else(|| self.root_dir.clone());

        Ok(Config {
            root_dir: self.root_dir,
            output_dir,
            stages: self.stages,
            install_path: self.install_path,
            publish,
        })
    }
}
