//! Group Registry
//!
//! Name to group mapping shared by every request handler. Created once at
//! startup; groups are never removed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::DEFAULT_CAPACITY_BYTES;
use crate::error::{CacheError, Result};
use crate::group::{Group, GroupStats, Loader};

// == Group Registry ==
#[derive(Debug)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
    /// Capacity for groups created on demand
    default_capacity: usize,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES)
    }
}

impl GroupRegistry {
    /// Creates an empty registry; on-demand groups get `default_capacity` bytes.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            default_capacity,
        }
    }

    // == Register ==
    /// Adds a fully built group.
    ///
    /// Names are unique: registering a name twice is a configuration error
    /// and leaves the existing group in place.
    pub fn register(&self, group: Group) -> Result<Arc<Group>> {
        let mut groups = self.groups.write();
        if groups.contains_key(group.name()) {
            return Err(CacheError::Configuration(format!(
                "group {} is already registered",
                group.name()
            )));
        }
        let group = Arc::new(group);
        groups.insert(group.name().to_string(), Arc::clone(&group));
        Ok(group)
    }

    // == Create ==
    /// Builds and registers a standalone group.
    pub fn create(
        &self,
        name: &str,
        capacity: usize,
        loader: Option<Arc<dyn Loader>>,
    ) -> Result<Arc<Group>> {
        let group = Group::builder(name)
            .capacity(capacity)
            .shared_loader(loader)
            .build()?;
        self.register(group)
    }

    // == Get ==
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    // == Lookup ==
    /// Returns the group called `name`.
    ///
    /// When it does not exist and `create_if_absent` is set, a standalone
    /// group with the default capacity and `loader` is created; otherwise
    /// the lookup fails with `GroupNotFound`. Returns whether the group
    /// already existed.
    pub fn lookup(
        &self,
        name: &str,
        create_if_absent: bool,
        loader: Option<Arc<dyn Loader>>,
    ) -> Result<(Arc<Group>, bool)> {
        if let Some(group) = self.get(name) {
            return Ok((group, true));
        }
        if !create_if_absent {
            return Err(CacheError::GroupNotFound(name.to_string()));
        }

        let mut groups = self.groups.write();
        // Another caller may have created it between the two locks.
        if let Some(group) = groups.get(name) {
            return Ok((Arc::clone(group), true));
        }
        let group = Arc::new(
            Group::builder(name)
                .capacity(self.default_capacity)
                .shared_loader(loader)
                .build()?,
        );
        groups.insert(name.to_string(), Arc::clone(&group));
        Ok((group, false))
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Stats for every group, sorted by name.
    pub fn stats(&self) -> Vec<GroupStats> {
        let groups: Vec<Arc<Group>> = self.groups.read().values().cloned().collect();
        let mut stats: Vec<GroupStats> = groups.iter().map(|g| g.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}
