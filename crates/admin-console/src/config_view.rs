//! Read-only platform configuration: feature flags and default permissions.

use serde::Serialize;

use crate::view_state::Snapshot;

pub const UNAVAILABLE_MESSAGE: &str = "No configuration data available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRow {
    pub name: String,
    pub enabled: bool,
}

impl FlagRow {
    pub fn label(&self) -> &'static str {
        if self.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRow {
    pub feature: String,
    pub enabled: bool,
    pub allowed_roles: Vec<String>,
}

impl PermissionRow {
    pub fn enabled_label(&self) -> &'static str {
        if self.enabled {
            "Yes"
        } else {
            "No"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfigView {
    Unavailable,
    Loaded {
        flags: Vec<FlagRow>,
        permissions: Vec<PermissionRow>,
    },
}

/// Flags and permissions in the order the config document lists them.
pub fn config_view(snapshot: &Snapshot) -> ConfigView {
    let Some(config) = &snapshot.platform_config else {
        return ConfigView::Unavailable;
    };

    let flags = config
        .feature_flags
        .iter()
        .map(|(name, enabled)| FlagRow {
            name: name.clone(),
            enabled: *enabled,
        })
        .collect();
    let permissions = config
        .default_permissions
        .iter()
        .map(|(feature, perm)| PermissionRow {
            feature: feature.clone(),
            enabled: perm.enabled,
            allowed_roles: perm.allowed_roles.clone(),
        })
        .collect();

    ConfigView::Loaded { flags, permissions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unavailable_without_config() {
        assert_eq!(config_view(&Snapshot::default()), ConfigView::Unavailable);
    }

    #[test]
    fn test_flags_and_permissions() {
        let snap = Snapshot {
            platform_config: Some(
                serde_json::from_value(json!({
                    "featureFlags": {"zeta": false, "alpha": true},
                    "defaultPermissions": {
                        "exports": {"enabled": false, "allowedRoles": []},
                        "billing": {"enabled": true, "allowedRoles": ["owner"]}
                    }
                }))
                .unwrap(),
            ),
            ..Default::default()
        };

        match config_view(&snap) {
            ConfigView::Loaded { flags, permissions } => {
                assert_eq!(flags[0].name, "zeta");
                assert_eq!(flags[0].label(), "Disabled");
                assert_eq!(flags[1].name, "alpha");
                assert_eq!(flags[1].label(), "Enabled");
                assert_eq!(permissions[0].feature, "exports");
                assert_eq!(permissions[0].enabled_label(), "No");
                assert_eq!(permissions[1].feature, "billing");
                assert_eq!(permissions[1].enabled_label(), "Yes");
                assert_eq!(permissions[1].allowed_roles, vec!["owner".to_string()]);
            }
            ConfigView::Unavailable => panic!("expected loaded config"),
        }
    }
}
