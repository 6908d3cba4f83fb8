//! Widget configuration.
//!
//! Hosts hand the widget a [`WidgetConfig`]. Everything has a default, so an
//! empty TOML table (or no file at all) is a valid configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::synth::DEFAULT_VOLUME;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Dense layout hint from the container.
    pub compact: bool,
    /// Initial volume, `[0, 1]`.
    pub volume: f32,
    pub muted: bool,
    /// Period of the cycle/parameter refresh.
    pub refresh_interval_ms: u64,
    /// Period of the scope redraw.
    pub frame_interval_ms: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            compact: false,
            volume: DEFAULT_VOLUME,
            muted: false,
            refresh_interval_ms: 2000,
            frame_interval_ms: 16,
        }
    }
}

impl WidgetConfig {
    /// Volume clamped to `[0, 1]` (non-finite becomes the default); intervals at least 1 ms.
    pub fn validated(mut self) -> Self {
        self.volume = if self.volume.is_finite() { self.volume.clamp(0.0, 1.0) } else { DEFAULT_VOLUME };
        self.refresh_interval_ms = self.refresh_interval_ms.max(1);
        self.frame_interval_ms = self.frame_interval_ms.max(1);
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_all_defaults() {
        let cfg: WidgetConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, WidgetConfig::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(2));
    }

    #[test]
    fn partial_table_overrides_only_named_fields() {
        let cfg: WidgetConfig = toml::from_str("compact = true\nvolume = 0.8\n").unwrap();
        assert!(cfg.compact);
        assert_eq!(cfg.volume, 0.8);
        assert_eq!(cfg.frame_interval_ms, 16);
    }

    #[test]
    fn validation_clamps() {
        let cfg = WidgetConfig { volume: 3.0, refresh_interval_ms: 0, frame_interval_ms: 0, ..WidgetConfig::default() }
            .validated();
        assert_eq!(cfg.volume, 1.0);
        assert_eq!(cfg.refresh_interval_ms, 1);
        assert_eq!(cfg.frame_interval_ms, 1);
        assert_eq!(WidgetConfig { volume: f32::NAN, ..WidgetConfig::default() }.validated().volume, DEFAULT_VOLUME);
    }
}
