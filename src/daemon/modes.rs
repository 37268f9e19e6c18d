//! Named mode presets and active-config resolution.

use crate::types::{ModeConfig, ModeKey};

/// Returns the built-in preset for `key`.
///
/// `Custom` has no preset of its own and yields the normal preset with the
/// "Custom" label; callers supply the real custom config through [`resolve`].
pub fn preset(key: ModeKey) -> ModeConfig {
    match key {
        ModeKey::Soft => ModeConfig::new("Soft", 20 * 60, 5 * 60, 10 * 60, 4),
        ModeKey::Normal => ModeConfig::new("Normal", 25 * 60, 5 * 60, 15 * 60, 4),
        ModeKey::Hard => ModeConfig::new("Hard", 50 * 60, 10 * 60, 15 * 60, 4),
        ModeKey::Custom => ModeConfig {
            label: "Custom".to_string(),
            ..preset(ModeKey::Normal)
        },
    }
}

/// Resolves the active configuration.
///
/// For `Custom`, the loaded custom config is used when present and valid;
/// otherwise the normal preset applies.
pub fn resolve(key: ModeKey, custom: Option<&ModeConfig>) -> ModeConfig {
    match (key, custom) {
        (ModeKey::Custom, Some(config)) if config.validate().is_ok() => config.clone(),
        (ModeKey::Custom, _) => preset(ModeKey::Normal),
        (key, _) => preset(key),
    }
}

/// All selectable mode keys in display order.
pub const ALL_MODES: [ModeKey; 4] = [ModeKey::Soft, ModeKey::Normal, ModeKey::Hard, ModeKey::Custom];
