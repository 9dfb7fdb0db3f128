//! Registries shared by all request handlers
//!
//! Both registries are traits so the orchestrator can be handed any backing
//! store. The in-memory implementations are process-wide and forget
//! everything on restart.

pub mod in_memory;

pub use in_memory::{InMemoryIdempotencyStore, InMemoryPlanStore};

use crate::core::error::{GatewayResult, PlanError};
use crate::core::request::Plan;
use async_trait::async_trait;

/// Registry of idempotency keys
///
/// A key moves from absent to reserved while its submission is in flight,
/// then either to processed (kept forever) or back to absent when the
/// reservation is released.
///
/// Methods are synchronous so a reservation can be released from `Drop`.
pub trait IdempotencyStore: Send + Sync {
    /// The key has completed a submission
    fn has_processed(&self, key: &str) -> GatewayResult<bool>;

    /// Atomically claim `key`; `false` when it is reserved or processed
    fn try_reserve(&self, key: &str) -> GatewayResult<bool>;

    /// Record `key` as processed, whether or not it was reserved
    fn mark_processed(&self, key: &str) -> GatewayResult<()>;

    /// Drop a reservation that never completed; processed keys are kept
    fn release(&self, key: &str) -> GatewayResult<()>;
}

/// Registry of recurring plans, keyed by plan id
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert a new plan; fails if the id is taken
    async fn add(&self, plan: Plan) -> Result<Plan, PlanError>;

    async fn get(&self, id: &str) -> Result<Option<Plan>, PlanError>;

    /// Merge the non-empty fields of `changes` into the stored plan
    async fn update(&self, changes: Plan) -> Result<Plan, PlanError>;

    async fn delete(&self, id: &str) -> Result<(), PlanError>;

    /// All plans, ordered by id
    async fn list(&self) -> Result<Vec<Plan>, PlanError>;
}
