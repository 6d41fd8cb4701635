//! The compatibility gate guarding `available -> staged` transitions.

use dexter_dl::UpdateManifest;

use crate::error::UpdateError;

/// Compatibility strategies this gate knows how to evaluate. A manifest
/// declaring anything else describes a negotiation scheme this host build
/// was never taught, not merely a release it happens to be incompatible
/// with.
const KNOWN_COMPATIBILITY_STRATEGIES: &[&str] = &["standard"];

/// Describes what this host build can bridge: its own user-data schema
/// version and the `(from, to)` pairs a registered migration covers.
#[derive(Debug, Clone)]
pub struct CompatibilityGate {
    pub current_schema_version: u32,
    pub registered_migrations: Vec<(u32, u32)>,
}

impl CompatibilityGate {
    pub fn new(current_schema_version: u32) -> Self {
        Self {
            current_schema_version,
            registered_migrations: Vec::new(),
        }
    }

    pub fn with_migration(mut self, from: u32, to: u32) -> Self {
        self.registered_migrations.push((from, to));
        self
    }

    /// Evaluates the four-rule gate: compatibility-strategy recognition, IPC
    /// compatibility, schema compatibility-or-migration, and a blanket
    /// refusal of schema downgrades.
    pub fn evaluate(&self, manifest: &UpdateManifest) -> Result<(), UpdateError> {
        if !KNOWN_COMPATIBILITY_STRATEGIES.contains(&manifest.compatibility.strategy.as_str()) {
            return Err(UpdateError::RemoteSchemaIncompatible);
        }

        if !manifest.compatibility.ipc_contract_compatible {
            return Err(UpdateError::IpcIncompatible);
        }

        let target = manifest.components.user_data_schema_version;
        let current = self.current_schema_version;

        if target < current {
            return Err(UpdateError::SchemaMigrationUnavailable {
                from: current,
                to: target,
            });
        }

        if manifest.compatibility.user_data_schema_compatible {
            return Ok(());
        }

        if self.registered_migrations.contains(&(current, target)) {
            return Ok(());
        }

        Err(UpdateError::SchemaMigrationUnavailable {
            from: current,
            to: target,
        })
    }
}
