// src/permissions/overwrite.rs
use std::collections::BTreeMap;
use std::fmt;

use poise::serenity_prelude::Permissions;
use serde::{Deserialize, Serialize};

use super::catalog::PermissionFlag;

/// State of a single flag inside a role's channel overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagState {
    Allow,
    Deny,
    #[default]
    Inherit,
}

impl FlagState {
    pub fn from_bool(value: bool) -> Self {
        if value {
            FlagState::Allow
        } else {
            FlagState::Deny
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            FlagState::Allow => Some(true),
            FlagState::Deny => Some(false),
            FlagState::Inherit => None,
        }
    }
}

/// Tri-state value for every catalog flag of one role on one channel.
///
/// Stored on disk as `{ "flag_key": bool }`; flags left out are `Inherit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct OverwriteSettings {
    states: [FlagState; 14],
}

impl OverwriteSettings {
    pub fn get(&self, flag: PermissionFlag) -> FlagState {
        self.states[flag.index()]
    }

    pub fn set(&mut self, flag: PermissionFlag, state: FlagState) {
        self.states[flag.index()] = state;
    }

    pub fn with(mut self, flag: PermissionFlag, state: FlagState) -> Self {
        self.set(flag, state);
        self
    }

    /// True when no flag is explicitly allowed or denied
    pub fn is_empty(&self) -> bool {
        self.states.iter().all(|s| *s == FlagState::Inherit)
    }

    /// Flags that carry an explicit value, in catalog order
    pub fn explicit(&self) -> impl Iterator<Item = (PermissionFlag, bool)> + '_ {
        PermissionFlag::ALL
            .into_iter()
            .filter_map(|flag| self.get(flag).as_bool().map(|value| (flag, value)))
    }

    /// Read the catalog flags out of a raw Discord allow/deny pair.
    /// Bits outside the catalog are ignored.
    pub fn from_bits(allow: Permissions, deny: Permissions) -> Self {
        let mut settings = Self::default();
        for flag in PermissionFlag::ALL {
            let bit = flag.permission();
            if allow.contains(bit) {
                settings.set(flag, FlagState::Allow);
            } else if deny.contains(bit) {
                settings.set(flag, FlagState::Deny);
            }
        }
        settings
    }

    /// Split into the (allow, deny) pair Discord expects
    pub fn to_bits(&self) -> (Permissions, Permissions) {
        let mut allow = Permissions::empty();
        let mut deny = Permissions::empty();
        for (flag, value) in self.explicit() {
            if value {
                allow |= flag.permission();
            } else {
                deny |= flag.permission();
            }
        }
        (allow, deny)
    }
}

impl From<BTreeMap<String, bool>> for OverwriteSettings {
    fn from(map: BTreeMap<String, bool>) -> Self {
        let mut settings = Self::default();
        for (key, value) in map {
            // Keys from an older catalog are dropped rather than failing the whole document.
            if let Some(flag) = PermissionFlag::from_key(&key) {
                settings.set(flag, FlagState::from_bool(value));
            }
        }
        settings
    }
}

impl From<OverwriteSettings> for BTreeMap<String, bool> {
    fn from(settings: OverwriteSettings) -> Self {
        settings
            .explicit()
            .map(|(flag, value)| (flag.key().to_string(), value))
            .collect()
    }
}

impl fmt::Display for OverwriteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        let parts: Vec<String> = self
            .explicit()
            .map(|(flag, value)| format!("{}: {}", flag.key(), value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
