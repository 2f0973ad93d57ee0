pub mod builder;
pub mod config;
pub mod error;
pub mod hashing;
pub mod publish;

pub use builder::{ManifestBuilder, PackageUpload};
pub use config::{Config, CredentialsFile, PublishConfig, PublishOverrides};
pub use error::ConfigError;
pub use hashing::hash_file;
pub use publish::{Publisher, S3Publisher, strip_query};
