//! Components shipped with the framework and available on every platform.

use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::RwLock;
use thiserror::Error;

use crate::bootstrap::ActivationContext;
use crate::components::ComponentCatalog;
use crate::foundation::{Component, ComponentError};
use crate::scanner::{ComponentManifest, ManifestEntry};

pub const LOGGING_FACTORY: &str = "fairy.logging";
pub const METADATA_FACTORY: &str = "fairy.metadata";
pub const MEMORY_STORAGE_FACTORY: &str = "fairy.storage.memory";

/// Register the built-in factories with `catalog`
pub fn register_builtins(catalog: &mut ComponentCatalog) {
    catalog
        .register(LOGGING_FACTORY, |context: &ActivationContext| {
            Ok(TracingLogger::new(context.platform().to_string()))
        })
        .register_default::<MetadataStore>(METADATA_FACTORY)
        .register_default::<MemoryStorage>(MEMORY_STORAGE_FACTORY);
}

/// Manifest declaring the built-in components with their default capabilities
///
/// Hosts that want the built-ins add it as an embedded classpath root.
pub fn builtin_manifest() -> ComponentManifest {
    ComponentManifest::new()
        .with_entry(
            ManifestEntry::new("fairy.Logging")
                .with_factory(LOGGING_FACTORY)
                .with_capability("logging")
                .with_order(-1000),
        )
        .with_entry(
            ManifestEntry::new("fairy.Metadata")
                .with_factory(METADATA_FACTORY)
                .with_capability("metadata")
                .with_order(-900),
        )
        .with_entry(
            ManifestEntry::new("fairy.MemoryStorage")
                .with_factory(MEMORY_STORAGE_FACTORY)
                .with_capability("storage:memory")
                .with_order(-900),
        )
}

/// `logging` capability backed by `tracing`
#[derive(Debug)]
pub struct TracingLogger {
    platform: String,
}

impl TracingLogger {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: "fairy", platform = %self.platform, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(target: "fairy", platform = %self.platform, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: "fairy", platform = %self.platform, "{}", message);
    }
}

#[async_trait]
impl Component for TracingLogger {
    async fn activate(&self, context: &ActivationContext) -> Result<(), ComponentError> {
        tracing::debug!(target: "fairy", component = %context.component(), "Logger ready");
        Ok(())
    }
}

/// Metadata store errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Cannot store key '{id}' as {requested}: existing value is {existing}")]
    TypeMismatch {
        id: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("Metadata store lock poisoned")]
    Poisoned,
}

/// Memory storage errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Memory storage lock poisoned")]
    Poisoned,
}

/// Typed key into a [`MetadataStore`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey<T> {
    id: String,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> MetadataKey<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().to_lowercase(),
            _type: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

struct MetadataEntry {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// `metadata` capability: a typed key/value map shared by components
///
/// Key ids are case-insensitive. Storing a key whose id already holds a value
/// of another type is rejected unless `force_put` is used.
#[derive(Default)]
pub struct MetadataStore {
    entries: RwLock<HashMap<String, MetadataEntry>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Send + Sync + 'static>(
        &self,
        key: &MetadataKey<T>,
        value: T,
    ) -> Result<(), MetadataError> {
        let mut entries = self.entries.write().map_err(|_| MetadataError::Poisoned)?;

        if let Some(existing) = entries.get(key.id()) {
            if existing.type_id != TypeId::of::<T>() {
                return Err(MetadataError::TypeMismatch {
                    id: key.id().to_string(),
                    existing: existing.type_name,
                    requested: std::any::type_name::<T>(),
                });
            }
        }

        entries.insert(key.id().to_string(), MetadataEntry::new(value));
        Ok(())
    }

    /// Store `value`, replacing any existing value regardless of its type
    pub fn force_put<T: Send + Sync + 'static>(
        &self,
        key: &MetadataKey<T>,
        value: T,
    ) -> Result<(), MetadataError> {
        let mut entries = self.entries.write().map_err(|_| MetadataError::Poisoned)?;
        entries.insert(key.id().to_string(), MetadataEntry::new(value));
        Ok(())
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> Option<T> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key.id())
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key.id()))
            .unwrap_or(false)
    }

    pub fn remove<T: Send + Sync + 'static>(&self, key: &MetadataKey<T>) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key.id()).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataEntry {
    fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("entries", &self.len())
            .finish()
    }
}

#[async_trait]
impl Component for MetadataStore {
    async fn teardown(&self) -> Result<(), ComponentError> {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
        Ok(())
    }
}

/// `storage` capability kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStorage {
    pub fn put(&self, key: impl Into<String>, value: serde_json::Value) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.into(), value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.values.write().ok()?.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Component for MemoryStorage {
    async fn teardown(&self) -> Result<(), ComponentError> {
        let released = self.len();
        if let Ok(mut values) = self.values.write() {
            values.clear();
        }
        tracing::debug!(released, "Memory storage cleared");
        Ok(())
    }
}
