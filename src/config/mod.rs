// ── Settings ──────────────────────────────────────────────────────────────────
//
// A small JSON settings file.  Loading never fails: a missing or malformed
// file yields the defaults, so the status item keeps working with no
// configuration at all.
//
// Key names from earlier releases of the settings file (`deflate`, `typing_delay`,
// `estimate_file_size`) are accepted as aliases.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::format::Units;

/// Environment variable naming a settings file for the CLI host.
pub const SETTINGS_ENV: &str = "STATUSBAR_FILESIZE_SETTINGS";

/// User-tunable behaviour of the size status item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Estimate buffers that are untitled or have unsaved changes.
    #[serde(alias = "estimate_file_size")]
    pub estimate_unsaved_buffers: bool,
    /// Also show the zlib-compressed size.
    #[serde(alias = "deflate")]
    pub compute_compressed_size: bool,
    pub units: Units,
    /// Quiet period after the last event before a size is computed.
    #[serde(alias = "typing_delay")]
    pub debounce_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            estimate_unsaved_buffers: true,
            compute_compressed_size: false,
            units: Units::Binary,
            debounce_delay_ms: 200,
        }
    }
}

impl Settings {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Parse settings JSON.  Unknown keys are ignored; missing keys default.
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Read `path`, falling back to the defaults on any error.
    pub fn load(path: &Path) -> Self {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no settings file, using defaults");
                return Self::default();
            }
        };
        match Self::from_json(&data) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `$STATUSBAR_FILESIZE_SETTINGS` if set, else the defaults.
    pub fn from_env() -> Self {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Self::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
