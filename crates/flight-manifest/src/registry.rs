//! Cross-runtime module id registry.
//!
//! Server bundling passes record, per [`ModuleKey`], the id their runtime
//! assigned to a client module. The manifest pass reads those ids through a
//! [`RegistrySnapshot`] taken when the pass starts; ids recorded later show up
//! on the next rebuild.
//!
//! The registry is an explicit object with a session lifecycle: create it when
//! the build session starts, hand clones to every compilation that needs it,
//! and [`clear`](ModuleIdRegistry::clear) it when the session ends.

use std::sync::Arc;

use dashmap::DashMap;
use flight_graph::ModuleId;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::key::ModuleKey;

/// Server runtime that assigns its own module ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRuntime {
    /// The default server runtime.
    Nodejs,
    /// The restricted edge runtime.
    Edge,
}

impl ServerRuntime {
    pub const ALL: [ServerRuntime; 2] = [ServerRuntime::Nodejs, ServerRuntime::Edge];
}

/// Thread-safe, cheaply clonable registry shared across compilations.
#[derive(Debug, Clone, Default)]
pub struct ModuleIdRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    server_module_ids: DashMap<ModuleKey, ModuleId>,
    edge_server_module_ids: DashMap<ModuleKey, ModuleId>,
    /// Resource paths of client modules only reached through `import()`.
    async_client_modules: RwLock<FxHashSet<String>>,
}

impl RegistryInner {
    fn table(&self, runtime: ServerRuntime) -> &DashMap<ModuleKey, ModuleId> {
        match runtime {
            ServerRuntime::Nodejs => &self.server_module_ids,
            ServerRuntime::Edge => &self.edge_server_module_ids,
        }
    }
}

impl ModuleIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the id `runtime` assigned to the module at `key`.
    ///
    /// Returns the previously recorded id, if any.
    pub fn record_server_module(
        &self,
        runtime: ServerRuntime,
        key: ModuleKey,
        id: impl Into<ModuleId>,
    ) -> Option<ModuleId> {
        self.inner.table(runtime).insert(key, id.into())
    }

    pub fn lookup(&self, runtime: ServerRuntime, key: &ModuleKey) -> Option<ModuleId> {
        self.inner
            .table(runtime)
            .get(key)
            .map(|entry| entry.value().clone())
    }

    pub fn lookup_default_server_id(&self, key: &ModuleKey) -> Option<ModuleId> {
        self.lookup(ServerRuntime::Nodejs, key)
    }

    pub fn lookup_edge_server_id(&self, key: &ModuleKey) -> Option<ModuleId> {
        self.lookup(ServerRuntime::Edge, key)
    }

    pub fn mark_async_client_module(&self, resource: impl Into<String>) {
        self.inner.async_client_modules.write().insert(resource.into());
    }

    pub fn is_async_client_module(&self, resource: &str) -> bool {
        self.inner.async_client_modules.read().contains(resource)
    }

    /// Forget every async client module.
    pub fn reset_async_client_modules(&self) {
        self.inner.async_client_modules.write().clear();
    }

    /// Forget the async client modules `snapshot` saw. Marks recorded after
    /// the snapshot was taken survive for the next compilation.
    pub fn release_async_client_modules(&self, snapshot: &RegistrySnapshot) {
        self.inner
            .async_client_modules
            .write()
            .retain(|resource| !snapshot.is_async_client_module(resource));
    }

    /// Number of ids recorded for `runtime`.
    pub fn len(&self, runtime: ServerRuntime) -> usize {
        self.inner.table(runtime).len()
    }

    pub fn is_empty(&self) -> bool {
        ServerRuntime::ALL
            .iter()
            .all(|runtime| self.inner.table(*runtime).is_empty())
            && self.inner.async_client_modules.read().is_empty()
    }

    /// Copy the current contents for one manifest pass.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let copy = |table: &DashMap<ModuleKey, ModuleId>| {
            table
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect::<FxHashMap<_, _>>()
        };

        RegistrySnapshot {
            server_module_ids: copy(&self.inner.server_module_ids),
            edge_server_module_ids: copy(&self.inner.edge_server_module_ids),
            async_client_modules: self.inner.async_client_modules.read().clone(),
        }
    }

    /// Drop everything. Called when the build session ends.
    pub fn clear(&self) {
        self.inner.server_module_ids.clear();
        self.inner.edge_server_module_ids.clear();
        self.reset_async_client_modules();
    }
}

/// Point-in-time copy of a [`ModuleIdRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    server_module_ids: FxHashMap<ModuleKey, ModuleId>,
    edge_server_module_ids: FxHashMap<ModuleKey, ModuleId>,
    async_client_modules: FxHashSet<String>,
}

impl RegistrySnapshot {
    pub fn lookup(&self, runtime: ServerRuntime, key: &ModuleKey) -> Option<&ModuleId> {
        match runtime {
            ServerRuntime::Nodejs => self.server_module_ids.get(key),
            ServerRuntime::Edge => self.edge_server_module_ids.get(key),
        }
    }

    pub fn is_async_client_module(&self, resource: &str) -> bool {
        self.async_client_modules.contains(resource)
    }
}
