//! ResourceRegistry for mapping `{role}/{resource}` paths to scoped table models.

use super::catalog;
use super::table::TableModel;
use crate::domain::role::Role;
use std::collections::HashMap;

/// Which write operations a role may perform on a resource.
#[derive(Debug, Clone, Copy)]
pub struct Permissions {
    pub create: bool,
    pub delete: bool,
    /// `None` allows every column; `Some` restricts updates to the listed fields.
    pub updatable: Option<&'static [&'static str]>,
}

impl Permissions {
    pub const FULL: Permissions = Permissions {
        create: true,
        delete: true,
        updatable: None,
    };

    pub fn can_update(&self, field: &str) -> bool {
        self.updatable.map(|fields| fields.contains(&field)).unwrap_or(true)
    }
}

/// Row-scoping rule: rows belong to the caller when `owner_field` equals its id.
#[derive(Debug, Clone, Copy)]
pub struct Scope {
    pub role: Role,
    pub owner_field: &'static str,
    pub permissions: Permissions,
}

#[derive(Debug)]
pub struct ResourceSpec {
    pub path: &'static str,
    pub model: &'static TableModel,
    pub scope: Scope,
}

impl ResourceSpec {
    pub fn key(&self) -> String {
        format!("{}/{}", self.scope.role, self.path)
    }
}

/// A registry that maps resource keys to their specs.
pub struct ResourceRegistry {
    resources: HashMap<(Role, String), &'static ResourceSpec>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Registry holding every resource of the marketplace catalog.
    pub fn marketplace() -> Self {
        let mut reg = Self::new();
        for spec in catalog::RESOURCES {
            reg.register(spec);
        }
        reg
    }

    pub fn register(&mut self, spec: &'static ResourceSpec) {
        self.resources
            .insert((spec.scope.role, spec.path.to_string()), spec);
    }

    pub fn get(&self, role: Role, path: &str) -> Option<&'static ResourceSpec> {
        self.resources.get(&(role, path.to_string())).copied()
    }

    /// Returns all registered resource keys, sorted.
    pub fn list_resources(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resources.values().map(|spec| spec.key()).collect();
        keys.sort();
        keys
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
