//! Candidate profiles kept in a JSON file next to the database.
//!
//! Interviews point at a profile by id only; nothing here checks that the
//! referenced interviews exist, and the store never checks the reverse.
//! The active profile id sits in a plain-text `active_profile` file beside
//! the profiles file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::jsonfile;

const ACTIVE_FILE_NAME: &str = "active_profile";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PersonalInfo {
    pub fn is_empty(&self) -> bool {
        *self == PersonalInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "PersonalInfo::is_empty")]
    pub personal_info: PersonalInfo,
}

/// Everything but the id, for creating or replacing a profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub resume_url: Option<String>,
    pub personal_info: PersonalInfo,
}

pub struct ProfileStore {
    path: PathBuf,
    active_path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let active_path = path.with_file_name(ACTIVE_FILE_NAME);
        Self { path, active_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty list.
    pub fn list(&self) -> Result<Vec<Profile>> {
        jsonfile::read_list(&self.path)
    }

    pub fn get(&self, id: &str) -> Result<Option<Profile>> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    pub fn add(&self, draft: ProfileDraft) -> Result<Profile> {
        validate(&draft)?;
        let mut profiles = self.list()?;
        let profile = Profile {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            title: draft.title,
            resume_url: draft.resume_url,
            personal_info: draft.personal_info,
        };
        profiles.push(profile.clone());
        self.save(&profiles)?;
        tracing::info!(id = %profile.id, name = %profile.name, "added profile");
        Ok(profile)
    }

    pub fn update(&self, id: &str, draft: ProfileDraft) -> Result<Profile> {
        validate(&draft)?;
        let mut profiles = self.list()?;
        let slot = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("profile", id))?;
        slot.name = draft.name.trim().to_string();
        slot.email = draft.email.trim().to_string();
        slot.title = draft.title;
        slot.resume_url = draft.resume_url;
        slot.personal_info = draft.personal_info;
        let updated = slot.clone();
        self.save(&profiles)?;
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> Result<Profile> {
        let mut profiles = self.list()?;
        let index = profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("profile", id))?;
        let removed = profiles.remove(index);
        self.save(&profiles)?;
        if self.active_id()?.as_deref() == Some(id) {
            self.clear_active()?;
        }
        tracing::info!(id, "removed profile");
        Ok(removed)
    }

    /// The selected profile, if one is set and still exists.
    pub fn active(&self) -> Result<Option<Profile>> {
        let Some(id) = self.active_id()? else {
            return Ok(None);
        };
        let profile = self.get(&id)?;
        if profile.is_none() {
            tracing::debug!(id = %id, "active profile no longer exists");
        }
        Ok(profile)
    }

    pub fn set_active(&self, id: &str) -> Result<Profile> {
        let profile = self
            .get(id)?
            .ok_or_else(|| Error::not_found("profile", id))?;
        if let Some(parent) = self.active_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&self.active_path, &profile.id)
            .map_err(|e| Error::io(&self.active_path, e))?;
        tracing::info!(id, "set active profile");
        Ok(profile)
    }

    pub fn clear_active(&self) -> Result<()> {
        match std::fs::remove_file(&self.active_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.active_path, e)),
        }
    }

    fn active_id(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.active_path) {
            Ok(raw) => {
                let id = raw.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&self.active_path, e)),
        }
    }

    fn save(&self, profiles: &[Profile]) -> Result<()> {
        jsonfile::write_list(&self.path, profiles)
    }
}

fn validate(draft: &ProfileDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(Error::validation("profile name is required"));
    }
    if !draft.email.contains('@') {
        return Err(Error::validation(format!(
            "'{}' does not look like an email address",
            draft.email
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn add_update_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested/profiles.json"));

        let sam = store.add(draft("Sam Park", "sam@example.com")).unwrap();
        store.add(draft("Alex Kim", "alex@example.com")).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);

        let mut edit = draft("Sam Park", "sam@park.dev");
        edit.title = Some("Staff Engineer".into());
        edit.personal_info.github = Some("sampark".into());
        let updated = store.update(&sam.id, edit).unwrap();
        assert_eq!(updated.email, "sam@park.dev");
        assert_eq!(store.get(&sam.id).unwrap().unwrap().title.as_deref(), Some("Staff Engineer"));

        store.remove(&sam.id).unwrap();
        assert!(store.get(&sam.id).unwrap().is_none());
        assert!(matches!(store.remove(&sam.id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn rejects_bad_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        assert!(store.add(draft("", "a@b.c")).is_err());
        assert!(store.add(draft("Sam", "not-an-email")).is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn active_profile_follows_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles.json"));
        assert!(store.active().unwrap().is_none());

        let sam = store.add(draft("Sam Park", "sam@example.com")).unwrap();
        let alex = store.add(draft("Alex Kim", "alex@example.com")).unwrap();
        assert!(matches!(store.set_active("nope"), Err(Error::NotFound { .. })));

        store.set_active(&sam.id).unwrap();
        assert_eq!(store.active().unwrap().map(|p| p.id), Some(sam.id.clone()));

        store.remove(&alex.id).unwrap();
        assert_eq!(store.active().unwrap().map(|p| p.id), Some(sam.id.clone()));

        store.remove(&sam.id).unwrap();
        assert!(store.active().unwrap().is_none());
        assert!(!dir.path().join("active_profile").exists());

        store.clear_active().unwrap();
    }

    #[test]
    fn reads_camel_case_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"[{"id":"p1","name":"Sam","email":"sam@example.com",
                "resumeUrl":"https://example.com/cv.pdf",
                "personalInfo":{"location":"Lisbon"}}]"#,
        )
        .unwrap();

        let store = ProfileStore::new(&path);
        let sam = store.get("p1").unwrap().unwrap();
        assert_eq!(sam.resume_url.as_deref(), Some("https://example.com/cv.pdf"));
        assert_eq!(sam.personal_info.location.as_deref(), Some("Lisbon"));
    }
}
