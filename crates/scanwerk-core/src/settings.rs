// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Saved settings shared with the GUI — scan profiles, saved PDF metadata,
// saved encryption config, and the SMTP account. The pipeline receives this
// as explicit read-only context so the core stays testable without a GUI
// environment present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::options::PdfMetadata;

/// One scan profile, keyed by display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProfile {
    pub display_name: String,
    /// Driver identifier resolved through the driver factory.
    pub driver_name: String,
    /// Device selector; its meaning is driver-specific (the folder driver
    /// reads it as the hot-folder path).
    pub device_id: Option<String>,
    /// Brightness offset applied to every scanned page (-255..=255, 0 = off).
    #[serde(default)]
    pub brightness: i32,
    /// Contrast factor applied to every scanned page (1.0 = off).
    #[serde(default = "default_contrast")]
    pub contrast: f32,
    /// Auto-save settings used when the run passes `--autosave`.
    #[serde(default)]
    pub auto_save: Option<AutoSaveSettings>,
}

fn default_contrast() -> f32 {
    1.0
}

impl Default for ScanProfile {
    fn default() -> Self {
        Self {
            display_name: "default".into(),
            driver_name: "stub".into(),
            device_id: None,
            brightness: 0,
            contrast: 1.0,
            auto_save: None,
        }
    }
}

/// Profile-level auto-save destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSaveSettings {
    /// Output path template; supports the same placeholders as `--output`.
    pub path_template: String,
}

/// SMTP account used for email delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// The From mailbox, e.g. `"Scanwerk <scans@example.org>"`.
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Passphrase configuration for output encryption. Loaded from the file
/// named by `--encrypt-config`, or stored here as the GUI-saved config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptConfig {
    pub passphrase: String,
}

impl EncryptConfig {
    /// Load an encrypt-config JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Persistent settings shared between the GUI and unattended runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSettings {
    /// Profiles in most-recently-used order; the first entry is the default.
    #[serde(default)]
    pub profiles: Vec<ScanProfile>,
    /// Metadata configured in the GUI, applied with `--use-saved-metadata`.
    #[serde(default)]
    pub pdf_metadata: Option<PdfMetadata>,
    /// Encryption configured in the GUI, applied with `--use-saved-encrypt-config`.
    #[serde(default)]
    pub encrypt_config: Option<EncryptConfig>,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl Default for SavedSettings {
    fn default() -> Self {
        Self {
            profiles: vec![ScanProfile::default()],
            pdf_metadata: None,
            encrypt_config: None,
            smtp: None,
        }
    }
}

impl SavedSettings {
    /// Load settings from `path`. A missing file yields the defaults — a
    /// fresh install has nothing saved yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Default settings location: `$XDG_CONFIG_HOME/scanwerk/settings.json`,
    /// falling back to `~/.config/scanwerk/settings.json`.
    pub fn default_path() -> PathBuf {
        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config")
        } else {
            PathBuf::from(".")
        };
        base.join("scanwerk").join("settings.json")
    }

    pub fn find_profile(&self, name: &str) -> Option<&ScanProfile> {
        self.profiles.iter().find(|p| p.display_name == name)
    }

    /// The most-recently-used profile.
    pub fn default_profile(&self) -> Option<&ScanProfile> {
        self.profiles.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let settings = SavedSettings::load("/nonexistent/scanwerk-settings.json").unwrap();
        assert_eq!(settings.profiles.len(), 1);
        assert_eq!(settings.profiles[0].driver_name, "stub");
    }

    #[test]
    fn profile_lookup_by_name() {
        let mut settings = SavedSettings::default();
        settings.profiles.push(ScanProfile {
            display_name: "duplex".into(),
            driver_name: "folder".into(),
            ..Default::default()
        });
        assert_eq!(
            settings.find_profile("duplex").map(|p| p.driver_name.as_str()),
            Some("folder")
        );
        assert!(settings.find_profile("missing").is_none());
        assert_eq!(
            settings.default_profile().map(|p| p.display_name.as_str()),
            Some("default")
        );
    }

    #[test]
    fn settings_round_trip() {
        let settings = SavedSettings {
            smtp: Some(SmtpConfig {
                host: "smtp.example.org".into(),
                port: 465,
                username: Some("scans".into()),
                password: None,
                from: "Scanwerk <scans@example.org>".into(),
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: SavedSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.smtp.unwrap().port, 465);
    }

    #[test]
    fn profile_defaults_fill_missing_fields() {
        let json = r#"{"profiles":[{"display_name":"flatbed","driver_name":"stub","device_id":null}]}"#;
        let settings: SavedSettings = serde_json::from_str(json).unwrap();
        let profile = &settings.profiles[0];
        assert_eq!(profile.brightness, 0);
        assert_eq!(profile.contrast, 1.0);
        assert!(profile.auto_save.is_none());
    }
}
