//! Persistence seams for accounts, the roster and payroll runs.
//!
//! Services receive these as trait objects; `mysql` backs the server,
//! `memory` backs the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::payroll::{
    NewPayrollRun, PayrollEntry, PayrollRun, PayrollRunSummary, PayrollTotals,
};
use crate::model::personnel::{PersonnelChanges, PersonnelDetails, PersonnelRecord};
use crate::model::user::{NewUser, User};
use crate::utils::login_index::Handle;

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn find_by_period(&self, period: &str) -> StoreResult<Option<PayrollRun>>;

    /// Unconditional insert. A second run for the same period fails with
    /// [`StoreError::Duplicate`].
    async fn create_run(&self, run: NewPayrollRun) -> StoreResult<PayrollRun>;

    /// Discard the run identified by `existing_id` and store `run` in its place, atomically.
    async fn overwrite_run(&self, existing_id: u64, run: NewPayrollRun)
    -> StoreResult<PayrollRun>;

    /// Replace entries and totals of run `id` if it is still at `expected_version`.
    /// Returns `false` when the run moved on (or vanished) since it was read.
    async fn update_entries(
        &self,
        id: u64,
        expected_version: u64,
        entries: &[PayrollEntry],
        totals: &PayrollTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Newest approvals first.
    async fn list_history(&self, limit: u32) -> StoreResult<Vec<PayrollRunSummary>>;
}

#[async_trait]
pub trait PersonnelStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<PersonnelRecord>>;

    async fn list_active(&self) -> StoreResult<Vec<PersonnelRecord>>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<PersonnelRecord>>;

    /// Case-insensitive lookup.
    async fn find_by_army_number(&self, army_number: &str)
    -> StoreResult<Option<PersonnelRecord>>;

    async fn insert(&self, details: PersonnelDetails) -> StoreResult<PersonnelRecord>;

    async fn update(
        &self,
        id: u64,
        changes: &PersonnelChanges,
    ) -> StoreResult<Option<PersonnelRecord>>;

    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<User>>;

    async fn handle_exists(&self, handle: Handle<'_>) -> StoreResult<bool>;

    /// Fails with [`StoreError::Duplicate`] when the email or username is taken.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> StoreResult<()>;
}
