//! Registry of virtual declaration units.
//!
//! Declaration units are synthetic files produced as a byproduct of
//! expansion. They are answered from memory before the real source host is
//! consulted, so the file system never sees them.
//!
//! # Thread Safety
//!
//! Units are stored in a `DashMap` keyed by virtual name. A unit is replaced
//! as a whole on re-registration; readers get cloned `Arc`s of its content.

use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use super::name::virtual_name_of;
use crate::expansion::ContentVersion;

/// A synthetic declaration file attributed to an owning real file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDeclarationUnit {
    pub name: Url,
    pub owner: Url,
    pub content: Arc<str>,
    /// Version of the owning file this unit was generated from.
    pub version: ContentVersion,
}

#[derive(Debug, Default)]
pub struct VirtualDeclarationRegistry {
    units: DashMap<Url, VirtualDeclarationUnit>,
}

impl VirtualDeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the declaration unit owned by `owner`.
    pub fn register(&self, owner: &Url, content: &str, version: &ContentVersion) -> Url {
        let name = virtual_name_of(owner);
        let unit = VirtualDeclarationUnit {
            name: name.clone(),
            owner: owner.clone(),
            content: Arc::from(content),
            version: version.clone(),
        };
        if self.units.insert(name.clone(), unit).is_none() {
            log::debug!(
                target: "utsushi::registry",
                "Registered declaration unit {} for {}",
                name,
                owner
            );
        }
        name
    }

    /// Remove the declaration unit owned by `owner`, if any.
    pub fn unregister(&self, owner: &Url) -> Option<VirtualDeclarationUnit> {
        let name = virtual_name_of(owner);
        let removed = self.units.remove(&name).map(|(_, unit)| unit);
        if removed.is_some() {
            log::debug!(
                target: "utsushi::registry",
                "Unregistered declaration unit {} for {}",
                name,
                owner
            );
        }
        removed
    }

    pub fn has(&self, name: &Url) -> bool {
        self.units.contains_key(name)
    }

    pub fn content_of(&self, name: &Url) -> Option<Arc<str>> {
        self.units.get(name).map(|unit| Arc::clone(&unit.content))
    }

    /// Version of the owning file, so the host's staleness tracking of the
    /// unit follows the owner.
    pub fn version_of(&self, name: &Url) -> Option<ContentVersion> {
        self.units.get(name).map(|unit| unit.version.clone())
    }

    pub fn owner_of(&self, name: &Url) -> Option<Url> {
        self.units.get(name).map(|unit| unit.owner.clone())
    }

    pub fn get(&self, name: &Url) -> Option<VirtualDeclarationUnit> {
        self.units.get(name).map(|unit| unit.value().clone())
    }

    /// Names of all live units, sorted for stable listings.
    pub fn names(&self) -> Vec<Url> {
        let mut names: Vec<Url> = self.units.iter().map(|unit| unit.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn clear(&self) {
        self.units.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Url {
        Url::parse("file:///project/src/user.ts").unwrap()
    }

    #[test]
    fn register_exposes_unit_under_virtual_name() {
        let registry = VirtualDeclarationRegistry::new();
        let version = ContentVersion::from(3);

        let name = registry.register(&owner(), "export declare class User {}", &version);

        assert_eq!(name, virtual_name_of(&owner()));
        assert!(registry.has(&name));
        assert_eq!(
            registry.content_of(&name).as_deref(),
            Some("export declare class User {}")
        );
        assert_eq!(registry.version_of(&name), Some(version));
        assert_eq!(registry.owner_of(&name), Some(owner()));
    }

    #[test]
    fn register_replaces_previous_content() {
        let registry = VirtualDeclarationRegistry::new();
        registry.register(&owner(), "v1", &ContentVersion::from(1));
        let name = registry.register(&owner(), "v2", &ContentVersion::from(2));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.content_of(&name).as_deref(), Some("v2"));
        assert_eq!(registry.version_of(&name), Some(ContentVersion::from(2)));
    }

    #[test]
    fn unregister_removes_unit() {
        let registry = VirtualDeclarationRegistry::new();
        let name = registry.register(&owner(), "decl", &ContentVersion::from(1));

        let removed = registry.unregister(&owner());

        assert_eq!(removed.map(|u| u.name), Some(name.clone()));
        assert!(!registry.has(&name));
        assert!(registry.is_empty());
        assert!(registry.unregister(&owner()).is_none());
    }

    #[test]
    fn names_are_sorted() {
        let registry = VirtualDeclarationRegistry::new();
        let b = Url::parse("file:///project/b.ts").unwrap();
        let a = Url::parse("file:///project/a.ts").unwrap();
        registry.register(&b, "b", &ContentVersion::from(1));
        registry.register(&a, "a", &ContentVersion::from(1));

        let names: Vec<String> = registry.names().iter().map(|u| u.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "file:///project/a.expanded.d.ts".to_string(),
                "file:///project/b.expanded.d.ts".to_string()
            ]
        );
    }
}
