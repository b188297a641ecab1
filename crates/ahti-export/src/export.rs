//! Export driver: build the collection, then commit it to disk
//!
//! Phase one runs the whole pipeline in memory. Only when it succeeds does phase two touch the
//! file system, and it replaces the destination atomically, so a failed run never leaves a
//! partial or empty-by-accident file behind.

use ahti_export_lib::{ExportConfig, ExportedCollection, Exporter, FeatureSource, PgSource};
use anyhow::Context;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Run a full export against the configured database
pub fn run(config: &ExportConfig) -> anyhow::Result<ExportedCollection> {
    let mut source = PgSource::connect(&config.database)
        .with_context(|| format!("Failed to connect to {}", config.database))?;

    let result = run_with(&mut source, config);

    if let Err(e) = source.close() {
        tracing::warn!("Failed to close database connection cleanly: {e}");
    }
    result
}

/// Build from `source` and, if that succeeds, commit to `config.output`
pub fn run_with<S: FeatureSource>(
    source: S,
    config: &ExportConfig,
) -> anyhow::Result<ExportedCollection> {
    let exported = Exporter::new(source, config.schema)
        .build()
        .with_context(|| format!("Failed to export schema {}", config.schema))?;
    commit(&exported, &config.output)?;
    Ok(exported)
}

/// Write the collection to `output`, creating parent directories as needed
pub fn commit(exported: &ExportedCollection, output: &Path) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    let staging = staging_path(output);
    write_json(exported, &staging)
        .with_context(|| format!("Failed to write {}", staging.display()))?;
    fs::rename(&staging, output)
        .with_context(|| format!("Failed to move export into place at {}", output.display()))?;

    tracing::info!("Data exported to: {}", output.display());
    tracing::info!("Total features: {}", exported.len());
    for layer in &exported.info.layers {
        tracing::info!(
            "  {}: {} features ({} skipped)",
            layer.class,
            layer.features,
            layer.skipped
        );
    }
    if let Some((min_lon, min_lat, max_lon, max_lat)) = exported.info.bounds {
        tracing::debug!("Extent: [{min_lon}, {min_lat}, {max_lon}, {max_lat}]");
    }
    Ok(())
}

/// Hidden sibling file the collection is written to before the rename
fn staging_path(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.json".to_string());
    output.with_file_name(format!(".{file_name}.tmp"))
}

fn write_json(exported: &ExportedCollection, path: &Path) -> anyhow::Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &exported.collection)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
