use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{PayrollStore, PersonnelStore, StoreResult, UserStore};
use crate::error::StoreError;
use crate::model::payroll::{
    NewPayrollRun, PayrollEntry, PayrollRun, PayrollRunSummary, PayrollTotals,
};
use crate::model::personnel::{PersonnelChanges, PersonnelDetails, PersonnelRecord};
use crate::model::user::{NewUser, User};
use crate::utils::login_index::Handle;

#[derive(Default)]
pub struct MemoryPayrollStore {
    runs: Mutex<Vec<PayrollRun>>,
    next_id: AtomicU64,
    /// Number of upcoming `update_entries` calls that see a concurrent writer
    /// bump the version between read and write.
    pub contended_updates: AtomicU32,
    pub update_calls: AtomicU32,
}

impl MemoryPayrollStore {
    pub fn runs(&self) -> Vec<PayrollRun> {
        self.runs.lock().unwrap().clone()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl PayrollStore for MemoryPayrollStore {
    async fn find_by_period(&self, period: &str) -> StoreResult<Option<PayrollRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.period == period)
            .cloned())
    }

    async fn create_run(&self, run: NewPayrollRun) -> StoreResult<PayrollRun> {
        let mut runs = self.runs.lock().unwrap();
        if runs.iter().any(|r| r.period == run.period) {
            return Err(StoreError::Duplicate);
        }
        let stored = run.into_run(self.allocate_id());
        runs.push(stored.clone());
        Ok(stored)
    }

    async fn overwrite_run(
        &self,
        existing_id: u64,
        run: NewPayrollRun,
    ) -> StoreResult<PayrollRun> {
        let mut runs = self.runs.lock().unwrap();
        runs.retain(|r| r.id != existing_id);
        if runs.iter().any(|r| r.period == run.period) {
            return Err(StoreError::Duplicate);
        }
        let stored = run.into_run(self.allocate_id());
        runs.push(stored.clone());
        Ok(stored)
    }

    async fn update_entries(
        &self,
        id: u64,
        expected_version: u64,
        entries: &[PayrollEntry],
        totals: &PayrollTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        let mut runs = self.runs.lock().unwrap();
        let Some(run) = runs.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };

        let contended = self
            .contended_updates
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if contended {
            run.version += 1;
        }

        if run.version != expected_version {
            return Ok(false);
        }
        run.entries = entries.to_vec();
        run.totals = *totals;
        run.updated_at = Some(updated_at);
        run.version += 1;
        Ok(true)
    }

    async fn list_history(&self, limit: u32) -> StoreResult<Vec<PayrollRunSummary>> {
        let mut runs = self.runs.lock().unwrap().clone();
        runs.sort_by(|a, b| b.approved_at.cmp(&a.approved_at).then(b.id.cmp(&a.id)));
        Ok(runs
            .iter()
            .take(limit as usize)
            .map(PayrollRunSummary::from)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryPersonnelStore {
    people: Mutex<Vec<PersonnelRecord>>,
    next_id: AtomicU64,
}

impl MemoryPersonnelStore {
    pub fn with(details: impl IntoIterator<Item = PersonnelDetails>) -> Self {
        let store = Self::default();
        {
            let mut people = store.people.lock().unwrap();
            for d in details {
                let now = Utc::now();
                people.push(PersonnelRecord {
                    id: store.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    details: d,
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        store
    }
}

#[async_trait]
impl PersonnelStore for MemoryPersonnelStore {
    async fn list_all(&self) -> StoreResult<Vec<PersonnelRecord>> {
        let mut people = self.people.lock().unwrap().clone();
        people.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(people)
    }

    async fn list_active(&self) -> StoreResult<Vec<PersonnelRecord>> {
        Ok(self
            .people
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.details.active)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<PersonnelRecord>> {
        Ok(self
            .people
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_by_army_number(
        &self,
        army_number: &str,
    ) -> StoreResult<Option<PersonnelRecord>> {
        Ok(self
            .people
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.details.army_number.eq_ignore_ascii_case(army_number))
            .cloned())
    }

    async fn insert(&self, details: PersonnelDetails) -> StoreResult<PersonnelRecord> {
        let now = Utc::now();
        let record = PersonnelRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            details,
            created_at: now,
            updated_at: now,
        };
        self.people.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: u64,
        changes: &PersonnelChanges,
    ) -> StoreResult<Option<PersonnelRecord>> {
        let mut people = self.people.lock().unwrap();
        let Some(record) = people.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if !changes.is_empty() {
            changes.apply(&mut record.details);
            record.updated_at = Utc::now();
        }
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut people = self.people.lock().unwrap();
        let before = people.len();
        people.retain(|p| p.id != id);
        Ok(people.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    next_id: AtomicU64,
    last_logins: Mutex<Vec<(u64, DateTime<Utc>)>>,
    /// When set, every call fails as if the database were unreachable.
    pub offline: AtomicBool,
}

impl MemoryUserStore {
    pub fn remove(&self, id: u64) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }

    pub fn last_login(&self, id: u64) -> Option<DateTime<Utc>> {
        self.last_logins
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(user_id, _)| *user_id == id)
            .map(|(_, at)| *at)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn handle_exists(&self, handle: Handle<'_>) -> StoreResult<bool> {
        self.check_online()?;
        let users = self.users.lock().unwrap();
        Ok(match handle {
            Handle::Email(v) => users.iter().any(|u| u.email == v),
            Handle::Username(v) => users.iter().any(|u| u.username == v),
        })
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        self.check_online()?;
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Duplicate);
        }
        let stored = user.into_user(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        users.push(stored.clone());
        Ok(stored)
    }

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> StoreResult<()> {
        self.check_online()?;
        self.last_logins.lock().unwrap().push((id, at));
        Ok(())
    }
}
