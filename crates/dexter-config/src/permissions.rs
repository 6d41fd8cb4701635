use std::{collections::HashMap, sync::{LazyLock, RwLock}};

use serde::{Deserialize, Serialize};

use crate::{
    atomic::{read_json_or_heal, write_json_atomic},
    error::{ConfigError, Result},
    paths::permissions_policy_path,
};

/// Current schema version for the persisted permission policy document.
pub const PERMISSION_SCHEMA_VERSION: u32 = 1;

/// The fixed set of scopes dexter's privileged surfaces are gated by.
/// No other scope names are recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    #[serde(rename = "runtime.install")]
    RuntimeInstall,
    #[serde(rename = "tools.filesystem.read")]
    ToolsFilesystemRead,
    #[serde(rename = "tools.filesystem.write")]
    ToolsFilesystemWrite,
    #[serde(rename = "tools.system.exec")]
    ToolsSystemExec,
}

impl PermissionScope {
    pub const ALL: [PermissionScope; 4] = [
        PermissionScope::RuntimeInstall,
        PermissionScope::ToolsFilesystemRead,
        PermissionScope::ToolsFilesystemWrite,
        PermissionScope::ToolsSystemExec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionScope::RuntimeInstall => "runtime.install",
            PermissionScope::ToolsFilesystemRead => "tools.filesystem.read",
            PermissionScope::ToolsFilesystemWrite => "tools.filesystem.write",
            PermissionScope::ToolsSystemExec => "tools.system.exec",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == value)
            .ok_or_else(|| ConfigError::UnknownScope(value.to_string()))
    }
}

/// Decision mode for a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    Allow,
    Ask,
    Deny,
}

/// Outcome of `PermissionPolicy::check`: whether an action may proceed
/// without prompting, and if not, whether a prompt would allow it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub requires_prompt: bool,
    pub message: String,
}

/// Persisted permission policy: a mode for every scope in the fixed set.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PermissionPolicy {
    pub schema_version: u32,
    pub scopes: HashMap<String, PermissionMode>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        let scopes = PermissionScope::ALL
            .into_iter()
            .map(|scope| (scope.as_str().to_string(), PermissionMode::Ask))
            .collect();

        Self {
            schema_version: PERMISSION_SCHEMA_VERSION,
            scopes,
        }
    }
}

impl PermissionPolicy {
    /// Loads the persisted policy, restoring and re-persisting a safe
    /// all-`ask` default if the file is missing or cannot be parsed.
    pub fn load() -> Result<Self> {
        read_json_or_heal(&permissions_policy_path())
    }

    pub fn save(&self) -> Result<()> {
        write_json_atomic(&permissions_policy_path(), self)
    }

    pub fn mode(&self, scope: PermissionScope) -> PermissionMode {
        self.scopes
            .get(scope.as_str())
            .copied()
            .unwrap_or(PermissionMode::Ask)
    }

    /// Sets a scope's mode. Idempotent: setting the same mode twice is a no-op write.
    pub fn set(&mut self, scope: PermissionScope, mode: PermissionMode) {
        self.scopes.insert(scope.as_str().to_string(), mode);
    }

    /// Checks whether `action` under `scope` may proceed. An unrecognized
    /// scope string is treated as `deny` without a prompt, never `ask`.
    pub fn check(&self, scope: &str, action: &str) -> PermissionDecision {
        let Ok(scope) = PermissionScope::parse(scope) else {
            return PermissionDecision {
                allowed: false,
                requires_prompt: false,
                message: format!("unknown permission scope '{scope}'"),
            };
        };

        match self.mode(scope) {
            PermissionMode::Allow => PermissionDecision {
                allowed: true,
                requires_prompt: false,
                message: format!("{action} is allowed for {}", scope.as_str()),
            },
            PermissionMode::Ask => PermissionDecision {
                allowed: false,
                requires_prompt: true,
                message: format!("{action} requires confirmation for {}", scope.as_str()),
            },
            PermissionMode::Deny => PermissionDecision {
                allowed: false,
                requires_prompt: false,
                message: format!("{action} is denied for {}", scope.as_str()),
            },
        }
    }
}

pub static PERMISSION_POLICY: LazyLock<RwLock<Option<PermissionPolicy>>> =
    LazyLock::new(|| RwLock::new(None));

fn ensure_initialized() {
    let mut guard = PERMISSION_POLICY.write().unwrap();
    if guard.is_none() {
        *guard = Some(PermissionPolicy::load().unwrap_or_default());
    }
}

pub fn get_policy() -> PermissionPolicy {
    ensure_initialized();
    PERMISSION_POLICY.read().unwrap().as_ref().unwrap().clone()
}

pub fn set_scope(scope: PermissionScope, mode: PermissionMode) -> Result<()> {
    ensure_initialized();
    let mut guard = PERMISSION_POLICY.write().unwrap();
    let policy = guard.as_mut().unwrap();
    policy.set(scope, mode);
    policy.save()
}

pub fn check_scope(scope: &str, action: &str) -> PermissionDecision {
    get_policy().check(scope, action)
}
