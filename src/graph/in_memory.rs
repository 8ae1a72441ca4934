//! In-memory identity graph for testing, development and examples.
//!
//! A HashMap-backed implementation of [`IdentityGraph`]: entities are
//! registered up front and the graph is read-only afterwards, which keeps
//! concurrent resolution trivially safe. Name indexes are maintained
//! alongside the key maps so by-name lookups stay O(1).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use super::{IdentityGraph, VirAttrCache};
use crate::model::{AnyObject, Application, Group, Realm, Role, User};

/// HashMap-backed identity graph.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    users: HashMap<String, User>,
    users_by_name: HashMap<String, String>,
    groups: HashMap<String, Group>,
    groups_by_name: HashMap<String, String>,
    any_objects: HashMap<String, AnyObject>,
    any_objects_by_name: HashMap<String, String>,
    relationship_types: HashSet<String>,
    any_types: HashSet<String>,
    applications: HashMap<String, Application>,
    roles: HashMap<String, Role>,
    realms: HashMap<String, Realm>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, user: User) {
        self.users_by_name
            .insert(user.username.clone(), user.key.clone());
        self.users.insert(user.key.clone(), user);
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups_by_name
            .insert(group.name.clone(), group.key.clone());
        self.groups.insert(group.key.clone(), group);
    }

    pub fn add_any_object(&mut self, any_object: AnyObject) {
        self.any_types.insert(any_object.any_type.clone());
        self.any_objects_by_name
            .insert(any_object.name.clone(), any_object.key.clone());
        self.any_objects.insert(any_object.key.clone(), any_object);
    }

    pub fn add_relationship_type(&mut self, key: impl Into<String>) {
        self.relationship_types.insert(key.into());
    }

    pub fn add_any_type(&mut self, key: impl Into<String>) {
        self.any_types.insert(key.into());
    }

    pub fn add_application(&mut self, application: Application) {
        self.applications
            .insert(application.key.clone(), application);
    }

    pub fn add_role(&mut self, role: Role) {
        self.roles.insert(role.key.clone(), role);
    }

    pub fn add_realm(&mut self, realm: Realm) {
        self.realms.insert(realm.full_path.clone(), realm);
    }

    /// Register a user under a freshly generated key, returning the key.
    pub fn register_user(&mut self, username: &str) -> String {
        let key = Uuid::new_v4().to_string();
        self.add_user(User::new(key.clone(), username));
        key
    }

    /// Register a group under a freshly generated key, returning the key.
    pub fn register_group(&mut self, name: &str) -> String {
        let key = Uuid::new_v4().to_string();
        self.add_group(Group::new(key.clone(), name));
        key
    }
}

impl IdentityGraph for InMemoryGraph {
    fn find_user_by_key(&self, key: &str) -> Option<User> {
        self.users.get(key).cloned()
    }

    fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users_by_name
            .get(username)
            .and_then(|key| self.users.get(key))
            .cloned()
    }

    fn find_group_by_key(&self, key: &str) -> Option<Group> {
        self.groups.get(key).cloned()
    }

    fn find_group_by_name(&self, name: &str) -> Option<Group> {
        self.groups_by_name
            .get(name)
            .and_then(|key| self.groups.get(key))
            .cloned()
    }

    fn find_any_object_by_key(&self, key: &str) -> Option<AnyObject> {
        self.any_objects.get(key).cloned()
    }

    fn find_any_object_by_name(&self, name: &str) -> Option<AnyObject> {
        self.any_objects_by_name
            .get(name)
            .and_then(|key| self.any_objects.get(key))
            .cloned()
    }

    fn relationship_type_exists(&self, key: &str) -> bool {
        self.relationship_types.contains(key)
    }

    fn any_type_exists(&self, key: &str) -> bool {
        key == "USER" || key == "GROUP" || self.any_types.contains(key)
    }

    fn find_application(&self, key: &str) -> Option<Application> {
        self.applications.get(key).cloned()
    }

    fn roles_of(&self, user: &User) -> Vec<Role> {
        user.roles
            .iter()
            .filter_map(|key| self.roles.get(key))
            .cloned()
            .collect()
    }

    fn find_realm_by_full_path(&self, full_path: &str) -> Option<Realm> {
        self.realms.get(full_path).cloned()
    }
}

/// Cache stub that records every invalidation, for asserting the
/// invalidate-before-read policy in tests.
#[derive(Debug, Default)]
pub struct RecordingVirAttrCache {
    invalidated: Mutex<Vec<(String, String, String)>>,
}

impl RecordingVirAttrCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the (entity type, entity key, schema key) triples
    /// invalidated so far.
    pub fn invalidations(&self) -> Vec<(String, String, String)> {
        self.invalidated.lock().expect("cache poisoned").clone()
    }
}

impl VirAttrCache for RecordingVirAttrCache {
    fn invalidate(&self, entity_type: &str, entity_key: &str, schema_key: &str) {
        self.invalidated.lock().expect("cache poisoned").push((
            entity_type.to_owned(),
            entity_key.to_owned(),
            schema_key.to_owned(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Privilege, Role};

    #[test]
    fn test_lookup_by_name_and_key() {
        let mut graph = InMemoryGraph::new();
        graph.add_user(User::new("u1", "jdoe"));
        graph.add_group(Group::new("g1", "staff"));

        assert_eq!(graph.find_user_by_username("jdoe").unwrap().key, "u1");
        assert_eq!(graph.find_group_by_name("staff").unwrap().key, "g1");
        assert!(graph.find_user_by_username("nobody").is_none());
    }

    #[test]
    fn test_register_generates_distinct_keys() {
        let mut graph = InMemoryGraph::new();
        let user_key = graph.register_user("jdoe");
        let group_key = graph.register_group("staff");
        assert_ne!(user_key, group_key);
        assert_eq!(graph.find_user_by_username("jdoe").unwrap().key, user_key);
        assert_eq!(graph.find_group_by_name("staff").unwrap().key, group_key);
    }

    #[test]
    fn test_builtin_any_types() {
        let graph = InMemoryGraph::new();
        assert!(graph.any_type_exists("USER"));
        assert!(graph.any_type_exists("GROUP"));
        assert!(!graph.any_type_exists("PRINTER"));
    }

    #[test]
    fn test_roles_of_resolves_assignments() {
        let mut graph = InMemoryGraph::new();
        let mut role = Role::new("auditor");
        role.privileges.push(Privilege::new("read", "ledger"));
        graph.add_role(role);

        let mut user = User::new("u1", "jdoe");
        user.roles.push("auditor".to_owned());
        user.roles.push("ghost".to_owned());
        graph.add_user(user.clone());

        let roles = graph.roles_of(&user);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].key, "auditor");
    }
}
