//! Mocked clinician sign-in, persisted as a small JSON file in the platform
//! config directory. This is demo session state, not authentication: any
//! non-empty name signs in, signing out deletes the record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::analysis::Modality;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStore {
    pub clinician: String,
    pub signed_in_at: Option<DateTime<Local>>,
    pub last_modality: Modality,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            clinician: String::new(),
            signed_in_at: None,
            last_modality: Modality::Ecg,
        }
    }
}

impl SessionStore {
    pub fn is_signed_in(&self) -> bool {
        !self.clinician.trim().is_empty()
    }

    pub fn sign_in(&mut self, clinician: impl Into<String>) {
        self.clinician = clinician.into().trim().to_string();
        self.signed_in_at = Some(Local::now());
    }

    pub fn sign_out(&mut self) {
        self.clinician.clear();
        self.signed_in_at = None;
    }

    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "medimark", "medimark")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("session.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve session path")?;
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve session path")?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;

    #[test]
    fn blank_names_do_not_sign_in() {
        let mut store = SessionStore::default();
        assert!(!store.is_signed_in());

        store.sign_in("   ");
        assert!(!store.is_signed_in());

        store.sign_in("  Dr. Ribas ");
        assert!(store.is_signed_in());
        assert_eq!(store.clinician, "Dr. Ribas");
        assert!(store.signed_in_at.is_some());
    }

    #[test]
    fn sign_out_clears_the_record() {
        let mut store = SessionStore::default();
        store.sign_in("Dr. Ribas");
        store.sign_out();
        assert!(!store.is_signed_in());
        assert!(store.signed_in_at.is_none());
    }

    #[test]
    fn session_round_trips_through_json() {
        let mut store = SessionStore::default();
        store.sign_in("Dr. Ribas");

        let json = serde_json::to_string(&store).expect("serialize");
        let restored: SessionStore = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.clinician, "Dr. Ribas");
        assert!(restored.is_signed_in());
    }
}
