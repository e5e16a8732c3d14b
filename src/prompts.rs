//! Reusable text snippets (interview questions, follow-up templates) kept in
//! `prompts.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::jsonfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub content: String,
}

pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Prompt>> {
        jsonfile::read_list(&self.path)
    }

    pub fn get(&self, id: &str) -> Result<Option<Prompt>> {
        Ok(self.list()?.into_iter().find(|p| p.id == id))
    }

    pub fn add(&self, title: &str, content: &str) -> Result<Prompt> {
        validate(title, content)?;
        let mut prompts = self.list()?;
        let prompt = Prompt {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            content: content.to_string(),
        };
        prompts.push(prompt.clone());
        jsonfile::write_list(&self.path, &prompts)?;
        tracing::info!(id = %prompt.id, title = %prompt.title, "added prompt");
        Ok(prompt)
    }

    /// Replaces whichever of title and content is given.
    pub fn update(&self, id: &str, title: Option<&str>, content: Option<&str>) -> Result<Prompt> {
        let mut prompts = self.list()?;
        let slot = prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("prompt", id))?;
        let title = title.unwrap_or(&slot.title).trim().to_string();
        let content = content.unwrap_or(&slot.content).to_string();
        validate(&title, &content)?;
        slot.title = title;
        slot.content = content;
        let updated = slot.clone();
        jsonfile::write_list(&self.path, &prompts)?;
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> Result<Prompt> {
        let mut prompts = self.list()?;
        let index = prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::not_found("prompt", id))?;
        let removed = prompts.remove(index);
        jsonfile::write_list(&self.path, &prompts)?;
        tracing::info!(id, "removed prompt");
        Ok(removed)
    }
}

fn validate(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("prompt title is required"));
    }
    if content.trim().is_empty() {
        return Err(Error::validation("prompt content is required"));
    }
    Ok(())
}
