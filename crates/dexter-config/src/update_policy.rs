use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    atomic::{read_json_or_default, write_json_atomic},
    error::Result,
    paths::update_policy_path,
};

/// User-facing release channel preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Stable,
    Rc,
}

/// Persisted update policy (`updates/policy.json`).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct UpdatePolicy {
    pub channel: Channel,
    pub auto_check: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            channel: Channel::Stable,
            auto_check: true,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl UpdatePolicy {
    pub fn load() -> Result<Self> {
        read_json_or_default(&update_policy_path())
    }

    pub fn save(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.updated_at = now;
        write_json_atomic(&update_policy_path(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::with_env;

    #[test]
    fn test_default_policy_is_stable_with_auto_check() {
        let policy = UpdatePolicy::default();
        assert_eq!(policy.channel, Channel::Stable);
        assert!(policy.auto_check);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        with_env(
            vec![("DEXTER_DATA_HOME", dir.path().to_str().unwrap())],
            || {
                let mut policy = UpdatePolicy {
                    channel: Channel::Rc,
                    auto_check: false,
                    updated_at: DateTime::UNIX_EPOCH,
                };
                let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
                policy.save(now).unwrap();

                let loaded = UpdatePolicy::load().unwrap();
                assert_eq!(loaded.channel, Channel::Rc);
                assert!(!loaded.auto_check);
                assert_eq!(loaded.updated_at, now);
            },
        );
    }
}
