//! In-memory registries
//!
//! Uses RwLock for thread-safe access. No lock is ever held across an await.

use super::{IdempotencyStore, PlanStore};
use crate::core::error::{GatewayError, GatewayResult, PlanError};
use crate::core::request::Plan;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Reserved,
    Processed,
}

/// In-memory idempotency registry
///
/// Unbounded, with no expiry. Clones share the same registry.
#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    keys: Arc<RwLock<HashMap<String, KeyState>>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently reserved or processed
    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::system(format!("idempotency registry unavailable: {}", e))
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn has_processed(&self, key: &str) -> GatewayResult<bool> {
        let keys = self.keys.read().map_err(lock_error)?;

        Ok(keys.get(key) == Some(&KeyState::Processed))
    }

    fn try_reserve(&self, key: &str) -> GatewayResult<bool> {
        let mut keys = self.keys.write().map_err(lock_error)?;

        if keys.contains_key(key) {
            return Ok(false);
        }
        keys.insert(key.to_string(), KeyState::Reserved);

        Ok(true)
    }

    fn mark_processed(&self, key: &str) -> GatewayResult<()> {
        let mut keys = self.keys.write().map_err(lock_error)?;

        keys.insert(key.to_string(), KeyState::Processed);

        Ok(())
    }

    fn release(&self, key: &str) -> GatewayResult<()> {
        let mut keys = self.keys.write().map_err(lock_error)?;

        if keys.get(key) == Some(&KeyState::Reserved) {
            keys.remove(key);
        }

        Ok(())
    }
}

/// In-memory plan registry
#[derive(Clone, Default)]
pub struct InMemoryPlanStore {
    plans: Arc<RwLock<HashMap<String, Plan>>>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with `plans`; later duplicates replace earlier ones
    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let plans = plans.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            plans: Arc::new(RwLock::new(plans)),
        }
    }
}

fn plan_lock_error(e: impl std::fmt::Display) -> PlanError {
    PlanError::Unavailable {
        message: e.to_string(),
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn add(&self, plan: Plan) -> Result<Plan, PlanError> {
        let mut plans = self.plans.write().map_err(plan_lock_error)?;

        if plans.contains_key(&plan.id) {
            return Err(PlanError::AlreadyExists { id: plan.id });
        }
        plans.insert(plan.id.clone(), plan.clone());

        Ok(plan)
    }

    async fn get(&self, id: &str) -> Result<Option<Plan>, PlanError> {
        let plans = self.plans.read().map_err(plan_lock_error)?;

        Ok(plans.get(id).cloned())
    }

    async fn update(&self, changes: Plan) -> Result<Plan, PlanError> {
        let mut plans = self.plans.write().map_err(plan_lock_error)?;

        let plan = plans
            .get_mut(&changes.id)
            .ok_or_else(|| PlanError::NotFound {
                id: changes.id.clone(),
            })?;
        plan.merge(&changes);

        Ok(plan.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), PlanError> {
        let mut plans = self.plans.write().map_err(plan_lock_error)?;

        plans
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PlanError::NotFound { id: id.to_string() })
    }

    async fn list(&self) -> Result<Vec<Plan>, PlanError> {
        let plans = self.plans.read().map_err(plan_lock_error)?;

        let mut all: Vec<Plan> = plans.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(all)
    }
}
