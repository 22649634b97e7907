//! Display preferences (language, theme, dark mode).
//!
//! Held as an explicit value: read from disk once at startup, written back on
//! every change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
    Es,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Caribbean,
    Tropical,
    Sunset,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub dark_mode: bool,
}

/// Request body for changing preferences. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub dark_mode: Option<bool>,
}

impl Preferences {
    pub fn merged(&self, request: &UpdatePreferencesRequest) -> Self {
        Self {
            language: request.language.unwrap_or(self.language),
            theme: request.theme.unwrap_or(self.theme),
            dark_mode: request.dark_mode.unwrap_or(self.dark_mode),
        }
    }
}

/// Preferences backed by a JSON file.
pub struct PreferencesStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl PreferencesStore {
    /// Load from `path`. A missing or unreadable file yields the defaults.
    pub async fn load(path: &Path) -> Self {
        let current = match tokio::fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed preferences file {:?}: {}", path, e);
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                tracing::warn!("Could not read preferences file {:?}: {}", path, e);
                Preferences::default()
            }
        };

        Self {
            path: path.to_path_buf(),
            current: RwLock::new(current),
        }
    }

    pub async fn get(&self) -> Preferences {
        self.current.read().await.clone()
    }

    /// Apply a change and persist it before returning.
    pub async fn update(&self, request: &UpdatePreferencesRequest) -> Result<Preferences, AppError> {
        let mut current = self.current.write().await;
        let next = current.merged(request);
        save(&self.path, &next).await?;
        *current = next.clone();
        Ok(next)
    }
}

async fn save(path: &Path, preferences: &Preferences) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(preferences)
        .map_err(|e| AppError::Internal(format!("Failed to encode preferences: {}", e)))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
