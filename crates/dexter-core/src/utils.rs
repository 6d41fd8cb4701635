//! Utility functions for dexter-core.

use std::fs;

use dexter_config::paths::{
    history_dir, logs_dir, permissions_dir, update_downloads_dir, updates_dir, user_data_dir,
};
use tracing::info;

use crate::error::{DexterError, ErrorContext};

type Result<T> = std::result::Result<T, DexterError>;

/// Creates the directory layout dexter's user-data dir is expected to have
/// (`permissions/`, `updates/`, `updates/downloads/`, `logs/`, `history/`).
pub fn ensure_user_data_layout() -> Result<()> {
    for dir in [
        user_data_dir(),
        permissions_dir(),
        updates_dir(),
        update_downloads_dir(),
        logs_dir(),
        history_dir(),
    ] {
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
            info!("created {}", dir.display());
        }
    }
    Ok(())
}

/// Substitutes `{arch}`, `{os}`, and `{version}` placeholders in an artifact
/// URL template with the current system's values.
///
/// A leading `v` on `version` is stripped before substitution, matching how
/// release tags are usually written but artifact filenames usually aren't.
pub fn substitute_placeholders(template: &str, version: Option<&str>) -> String {
    let result = template
        .replace("{arch}", std::env::consts::ARCH)
        .replace("{os}", std::env::consts::OS);

    match version {
        Some(v) => {
            let normalized_version = v.strip_prefix('v').unwrap_or(v);
            result.replace("{version}", normalized_version)
        }
        None => result,
    }
}
