//! Zentrale Konfiguration der Session-Engine.
//!
//! `SessionOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Playback ────────────────────────────────────────────────────────

/// Looping-Voreinstellung neuer Sessions.
pub const DEFAULT_LOOPING: bool = false;
/// Maximale Zeilenzahl der Playback-Spur (während einer Aufnahme unbeschränkt).
pub const PLAYBACK_TRACE_CAPACITY: usize = 1_000;

// ── Editing ─────────────────────────────────────────────────────────

/// Editierte Werte live an den Aktuator weiterreichen.
pub const LIVE_PREVIEW_ENABLED: bool = true;
/// Abtastpunkte pro Kurvendimension beim Neuzeichnen.
pub const CURVE_RENDER_SAMPLES: usize = 200;

// ── Motoren ─────────────────────────────────────────────────────────

/// Motoren beim Start der Session aktivieren.
pub const ENABLE_MOTORS_ON_STARTUP: bool = true;

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Session-Optionen.
/// Wird als `motion_spline_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Editierte Werte live an den Aktuator weiterreichen
    pub live_preview: bool,
    /// Looping-Voreinstellung für das Playback
    pub default_looping: bool,
    /// Kapazität der Playback-Spur in Messzeilen
    pub playback_trace_capacity: usize,
    /// Motoren beim Start der Session aktivieren
    #[serde(default = "default_enable_motors_on_startup")]
    pub enable_motors_on_startup: bool,
    /// Abtastpunkte pro Kurvendimension beim Neuzeichnen
    #[serde(default = "default_curve_render_samples")]
    pub curve_render_samples: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            live_preview: LIVE_PREVIEW_ENABLED,
            default_looping: DEFAULT_LOOPING,
            playback_trace_capacity: PLAYBACK_TRACE_CAPACITY,
            enable_motors_on_startup: ENABLE_MOTORS_ON_STARTUP,
            curve_render_samples: CURVE_RENDER_SAMPLES,
        }
    }
}

/// Serde-Default für `enable_motors_on_startup` (Abwärtskompatibilität
/// bestehender TOML-Dateien).
fn default_enable_motors_on_startup() -> bool {
    ENABLE_MOTORS_ON_STARTUP
}

/// Serde-Default für `curve_render_samples` (Abwärtskompatibilität).
fn default_curve_render_samples() -> usize {
    CURVE_RENDER_SAMPLES
}

impl SessionOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("motion_spline_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("motion_spline_editor.toml")
    }
}
