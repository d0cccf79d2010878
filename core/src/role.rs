//! Role registry: immutable definitions of the actors that execute tasks.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RoleError;

/// Sandboxing mode requested for roles that may execute code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Safe,
    Unsafe,
}

/// A configured actor capable of executing tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: String,
    /// Short title, e.g. "Senior Frontend Developer".
    pub title: String,
    pub goal: String,
    pub backstory: String,
    pub allow_code_execution: bool,
    pub code_execution_mode: ExecutionMode,
    pub allow_delegation: bool,
    pub max_execution_time: Duration,
    pub max_retries: u32,
    /// Advisory only; never consulted by the scheduler.
    pub tags: BTreeSet<String>,
    pub seed: i64,
}

impl Role {
    pub const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_secs(300);
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    pub const DEFAULT_SEED: i64 = 7;

    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            goal: String::new(),
            backstory: String::new(),
            allow_code_execution: false,
            code_execution_mode: ExecutionMode::Safe,
            allow_delegation: false,
            max_execution_time: Self::DEFAULT_MAX_EXECUTION_TIME,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            tags: BTreeSet::new(),
            seed: Self::DEFAULT_SEED,
        }
    }

    pub fn with_limits(mut self, max_execution_time: Duration, max_retries: u32) -> Self {
        self.max_execution_time = max_execution_time;
        self.max_retries = max_retries;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Holds every role known to a run. Frozen once a run starts: the scheduler only
/// ever sees it through a shared reference.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, Role>,
    /// Registration order, for stable listing.
    order: Vec<String>,
    coordinator: Option<String>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, role: Role) -> Result<(), RoleError> {
        if self.roles.contains_key(&role.id) {
            return Err(RoleError::Duplicate(role.id));
        }
        self.order.push(role.id.clone());
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Role, RoleError> {
        self.roles
            .get(id)
            .ok_or_else(|| RoleError::Unknown(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Marks `id` as the supervisory role allowed to reorder or skip tasks.
    pub fn set_coordinator(&mut self, id: &str) -> Result<(), RoleError> {
        if !self.contains(id) {
            return Err(RoleError::Unknown(id.to_string()));
        }
        self.coordinator = Some(id.to_string());
        Ok(())
    }

    pub fn coordinator(&self) -> Option<&Role> {
        self.coordinator.as_deref().and_then(|id| self.roles.get(id))
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.order.iter().filter_map(|id| self.roles.get(id))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_duplicate_ids() {
        let mut registry = RoleRegistry::new();
        registry.register(Role::new("planner")).unwrap();
        let err = registry.register(Role::new("planner")).unwrap_err();
        assert_eq!(err, RoleError::Duplicate("planner".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_unknown_role_fails() {
        let registry = RoleRegistry::new();
        assert_eq!(
            registry.get("tester").unwrap_err(),
            RoleError::Unknown("tester".to_string())
        );
    }

    #[test]
    fn coordinator_must_be_registered() {
        let mut registry = RoleRegistry::new();
        assert!(registry.set_coordinator("team_leader").is_err());
        assert!(registry.coordinator().is_none());

        registry.register(Role::new("team_leader")).unwrap();
        registry.set_coordinator("team_leader").unwrap();
        assert_eq!(registry.coordinator().unwrap().id, "team_leader");
    }

    #[test]
    fn roles_listed_in_registration_order() {
        let mut registry = RoleRegistry::new();
        for id in ["planner", "team_leader", "tester"] {
            registry.register(Role::new(id)).unwrap();
        }
        let ids: Vec<_> = registry.roles().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["planner", "team_leader", "tester"]);
    }
}
