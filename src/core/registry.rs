//! Category → configuration map
//!
//! Readers take a cheap `Arc` snapshot under a read lock and never observe a
//! half-updated entry. Replacing a config drops the old snapshot only after
//! the lock is released, so shutting down its async sinks never stalls other
//! readers.

use super::config::LoggerConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-category logger configurations plus a default
///
/// # Example
///
/// ```
/// use rust_sink_logger::{LoggerConfig, LoggerRegistry, Level};
///
/// let registry = LoggerRegistry::new(LoggerConfig::builder().build().unwrap());
/// registry.set_config(
///     "db",
///     LoggerConfig::builder().level(Level::Debug).build().unwrap(),
/// );
///
/// assert!(registry.has_config("db"));
/// assert_eq!(registry.get_config("db").level(), Level::Debug);
/// assert_eq!(registry.get_config("http").level(), Level::Info);
/// ```
pub struct LoggerRegistry {
    default: RwLock<Arc<LoggerConfig>>,
    categories: RwLock<HashMap<String, Arc<LoggerConfig>>>,
}

impl LoggerRegistry {
    pub fn new(default: LoggerConfig) -> Self {
        Self {
            default: RwLock::new(Arc::new(default)),
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Install `config` for `category`, replacing any previous one
    pub fn set_config(&self, category: impl Into<String>, config: LoggerConfig) {
        let previous = self
            .categories
            .write()
            .insert(category.into(), Arc::new(config));
        drop(previous);
    }

    /// Config for `category`, or the default if none is set
    pub fn get_config(&self, category: &str) -> Arc<LoggerConfig> {
        if let Some(config) = self.categories.read().get(category) {
            return Arc::clone(config);
        }
        self.default_config()
    }

    pub fn has_config(&self, category: &str) -> bool {
        self.categories.read().contains_key(category)
    }

    /// Remove a category's config; it falls back to the default afterwards
    pub fn remove_config(&self, category: &str) -> Option<Arc<LoggerConfig>> {
        self.categories.write().remove(category)
    }

    /// Names of all categories with their own config, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove every category config
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.categories.write());
        drop(removed);
    }

    pub fn set_default(&self, config: LoggerConfig) {
        self.replace_default(Arc::new(config));
    }

    pub(crate) fn replace_default(&self, config: Arc<LoggerConfig>) {
        let previous = std::mem::replace(&mut *self.default.write(), config);
        drop(previous);
    }

    pub fn default_config(&self) -> Arc<LoggerConfig> {
        Arc::clone(&self.default.read())
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("default", &*self.default.read())
            .field("categories", &self.categories())
            .finish()
    }
}
