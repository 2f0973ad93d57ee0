//! Generate the bootstrap manifest.

use anyhow::{Context, Result};
use stagehand_core::builder::{ManifestBuilder, PackageUpload};
use stagehand_core::config::{Config, object_key};
use stagehand_core::publish::{Publisher, S3Publisher, strip_query};
use stagehand_schema::MANIFEST_FILE_NAME;
use std::fs;

/// Build the manifest, write `bootstrap.json`, and publish it when
/// uploads are enabled.
///
/// # Errors
///
/// Returns an error on any traversal, hashing, write, or upload failure;
/// nothing is written unless the full manifest was built.
pub async fn generate(config: &Config) -> Result<()> {
    let builder = ManifestBuilder::new(config.stages.iter().cloned(), &config.install_path);

    let publisher = match &config.publish {
        Some(publish) => Some(S3Publisher::new(publish).await),
        None => None,
    };

    let manifest = match (&publisher, &config.publish) {
        (Some(publisher), Some(publish)) => {
            let upload = PackageUpload {
                publisher,
                bucket: &publish.bucket,
                folder: publish.bucket_folder.as_deref(),
            };
            builder.build(&config.root_dir, Some(&upload)).await?
        }
        _ => builder.build(&config.root_dir, None).await?,
    };

    tracing::debug!(
        "Built manifest with {} packages across {} stages",
        manifest.package_count(),
        manifest.len()
    );

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let manifest_path = config.output_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, manifest.to_json()?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    println!("Manifest saved to {}", manifest_path.display());

    if let (Some(publisher), Some(publish)) = (&publisher, &config.publish) {
        let key = object_key(publish.manifest_folder.as_deref(), MANIFEST_FILE_NAME);
        let url = publisher
            .publish(
                &manifest_path,
                &publish.manifest_bucket,
                &key,
                "application/json",
            )
            .await?;
        println!("Manifest URL: {}", strip_query(&url));
    }

    Ok(())
}
