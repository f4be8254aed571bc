//! Substituting backup models when the requested one cannot serve a request.
//!
//! A [`FallbackPolicy`] maps a primary model to the backups that may stand in
//! for it. [`OllamaClient::with_fallback`](crate::OllamaClient::with_fallback)
//! walks the resulting [`FallbackChain`] until a candidate succeeds.

use std::collections::HashMap;

use crate::config::{
    BACKUP_CHAT_MODEL, BACKUP_EMBEDDING_MODEL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
};

/// Which backups stand in for which primary model.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    enabled: bool,
    backups: HashMap<String, Vec<String>>,
}

impl Default for FallbackPolicy {
    /// The stock chat and embedding models fall back to their smaller siblings.
    fn default() -> Self {
        Self::empty()
            .with_backup(DEFAULT_CHAT_MODEL, BACKUP_CHAT_MODEL)
            .with_backup(DEFAULT_EMBEDDING_MODEL, BACKUP_EMBEDDING_MODEL)
    }
}

impl FallbackPolicy {
    /// Fallback enabled, but no backups registered yet.
    pub fn empty() -> Self {
        Self {
            enabled: true,
            backups: HashMap::new(),
        }
    }

    /// Every chain contains only the requested model.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            backups: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Appends `backup` to the candidates tried after `primary`.
    pub fn with_backup(mut self, primary: impl Into<String>, backup: impl Into<String>) -> Self {
        self.add_backup(primary, backup);
        self
    }

    pub fn add_backup(&mut self, primary: impl Into<String>, backup: impl Into<String>) {
        self.backups
            .entry(primary.into())
            .or_default()
            .push(backup.into());
    }

    /// The backups registered for `primary`, in the order they are tried.
    pub fn backups_for(&self, primary: &str) -> &[String] {
        self.backups
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The ordered candidates for a request naming `model`.
    pub fn chain_for(&self, model: &str) -> FallbackChain {
        let mut chain = FallbackChain::new(model);
        if self.enabled {
            for backup in self.backups_for(model) {
                chain.push(backup.clone());
            }
        }
        chain
    }
}

/// The primary model followed by its backups, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    models: Vec<String>,
}

impl FallbackChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            models: vec![primary.into()],
        }
    }

    /// Adds a candidate unless it is already in the chain.
    pub fn push(&mut self, model: impl Into<String>) {
        let model = model.into();
        if !self.models.contains(&model) {
            self.models.push(model);
        }
    }

    pub fn primary(&self) -> &str {
        &self.models[0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

impl IntoIterator for FallbackChain {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.into_iter()
    }
}
