//! Resolves the on-disk layout under dexter's user-data directory.

use std::path::PathBuf;

use dexter_utils::path::xdg_data_home;

/// Root of dexter's per-user data directory.
///
/// Honors `DEXTER_DATA_HOME` for tests and overrides; falls back to
/// `$XDG_DATA_HOME/dexter`.
pub fn user_data_dir() -> PathBuf {
    match std::env::var("DEXTER_DATA_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_data_home().join("dexter"),
    }
}

pub fn config_path() -> PathBuf {
    user_data_dir().join("config.json")
}

pub fn permissions_dir() -> PathBuf {
    user_data_dir().join("permissions")
}

pub fn permissions_policy_path() -> PathBuf {
    permissions_dir().join("policy.json")
}

pub fn updates_dir() -> PathBuf {
    user_data_dir().join("updates")
}

pub fn update_policy_path() -> PathBuf {
    updates_dir().join("policy.json")
}

pub fn update_state_path() -> PathBuf {
    updates_dir().join("state.json")
}

pub fn update_apply_attempt_path() -> PathBuf {
    updates_dir().join("apply-attempt.json")
}

pub fn update_downloads_dir() -> PathBuf {
    updates_dir().join("downloads")
}

pub fn logs_dir() -> PathBuf {
    user_data_dir().join("logs")
}

pub fn history_dir() -> PathBuf {
    user_data_dir().join("history")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::with_env;

    #[test]
    fn test_user_data_dir_env_override() {
        with_env(vec![("DEXTER_DATA_HOME", "/tmp/dexter-test-data")], || {
            assert_eq!(user_data_dir(), PathBuf::from("/tmp/dexter-test-data"));
        });
    }

    #[test]
    fn test_derived_paths_are_nested_under_user_data_dir() {
        with_env(vec![("DEXTER_DATA_HOME", "/tmp/dexter-test-data")], || {
            assert_eq!(
                config_path(),
                PathBuf::from("/tmp/dexter-test-data/config.json")
            );
            assert_eq!(
                permissions_policy_path(),
                PathBuf::from("/tmp/dexter-test-data/permissions/policy.json")
            );
            assert_eq!(
                update_state_path(),
                PathBuf::from("/tmp/dexter-test-data/updates/state.json")
            );
            assert_eq!(
                update_downloads_dir(),
                PathBuf::from("/tmp/dexter-test-data/updates/downloads")
            );
        });
    }
}
