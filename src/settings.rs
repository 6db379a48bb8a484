//! Game settings and preferences
//!
//! Persisted in LocalStorage on the web build; native builds run with
//! defaults.

use serde::{Deserialize, Serialize};

/// Run ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Gaps, falls and the full difficulty ramp
    #[default]
    Classic,
    /// Continuous ribbon, no gaps; for relaxed play
    Chill,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "Classic",
            GameMode::Chill => "Chill",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(GameMode::Classic),
            "chill" | "zen" => Some(GameMode::Chill),
            _ => None,
        }
    }
}

/// Input-to-motion mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlScheme {
    /// The marble rolls by itself; the player only steers and jumps
    #[default]
    AutoForward,
    /// The player also drives the throttle
    Direct,
}

impl ControlScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::AutoForward => "Auto-forward",
            ControlScheme::Direct => "Direct",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "auto-forward" | "autoforward" => Some(ControlScheme::AutoForward),
            "direct" | "manual" => Some(ControlScheme::Direct),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mode: GameMode,
    pub control: ControlScheme,
    /// Landscape theme name (see `sim::theme::by_name`)
    pub theme: String,
    /// Fixed seed for practicing a specific path; None rolls a fresh one
    pub seed_override: Option<u64>,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (minimize camera banking and shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Classic,
            control: ControlScheme::AutoForward,
            theme: "mountain".to_string(),
            seed_override: None,
            show_fps: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "marble_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        assert_eq!(GameMode::from_str("chill"), Some(GameMode::Chill));
        assert_eq!(GameMode::from_str("Classic"), Some(GameMode::Classic));
        assert_eq!(GameMode::from_str("speedrun"), None);
    }

    #[test]
    fn test_control_aliases() {
        assert_eq!(
            ControlScheme::from_str("auto"),
            Some(ControlScheme::AutoForward)
        );
        assert_eq!(ControlScheme::from_str("manual"), Some(ControlScheme::Direct));
    }

    #[test]
    fn test_settings_serde_round_trip() {
        let mut settings = Settings::default();
        settings.mode = GameMode::Chill;
        settings.seed_override = Some(1234);
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, GameMode::Chill);
        assert_eq!(back.seed_override, Some(1234));
        assert_eq!(back.theme, "mountain");
    }
}
