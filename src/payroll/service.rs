use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::db::MAX_PERIOD_LEN;
use crate::error::{AppError, StoreError};
use crate::model::payroll::{
    NewPayrollRun, PayrollEntry, PayrollRun, PayrollRunSummary, PayrollTotals,
};
use crate::model::personnel::{PersonnelDetails, PersonnelRecord};
use crate::payroll::entry::build_entry;
use crate::payroll::totals::compute_totals;
use crate::store::{PayrollStore, PersonnelStore};

/// Read-modify-write attempts for a single-person upsert before giving up.
pub const MAX_UPSERT_ATTEMPTS: usize = 3;

/// Entries and totals computed from a roster snapshot without persisting anything.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub entries: Vec<PayrollEntry>,
    pub totals: PayrollTotals,
}

pub fn compute_preview(people: &[PersonnelRecord]) -> Preview {
    let entries: Vec<PayrollEntry> = people.iter().map(|p| build_entry(&p.details)).collect();
    let totals = compute_totals(&entries);
    Preview { entries, totals }
}

/// Replace the entry with the same army number in place, or append.
pub fn merge_entry(entries: &mut Vec<PayrollEntry>, entry: PayrollEntry) {
    match entries.iter().position(|e| e.armynumber == entry.armynumber) {
        Some(i) => entries[i] = entry,
        None => entries.push(entry),
    }
}

fn require_period(period: &str) -> Result<&str, AppError> {
    let period = period.trim();
    if period.is_empty() {
        return Err(AppError::validation("Missing period"));
    }
    if period.chars().count() > MAX_PERIOD_LEN {
        return Err(AppError::validation(format!(
            "Period must be at most {MAX_PERIOD_LEN} characters"
        )));
    }
    Ok(period)
}

pub struct PayrollService {
    runs: Arc<dyn PayrollStore>,
    personnel: Arc<dyn PersonnelStore>,
}

impl PayrollService {
    pub fn new(runs: Arc<dyn PayrollStore>, personnel: Arc<dyn PersonnelStore>) -> Self {
        Self { runs, personnel }
    }

    #[instrument(name = "payroll_preview", skip(self))]
    pub async fn preview(&self, period: &str) -> Result<Preview, AppError> {
        require_period(period)?;
        let people = self.personnel.list_active().await?;
        debug!(active = people.len(), "Computing payroll preview");
        Ok(compute_preview(&people))
    }

    /// Approve the whole active roster for `period`.
    #[instrument(name = "payroll_approve", skip(self))]
    pub async fn approve(
        &self,
        period: &str,
        overwrite: bool,
        approved_by: &str,
    ) -> Result<PayrollRun, AppError> {
        let period = require_period(period)?;

        let existing = self.runs.find_by_period(period).await?;
        if existing.is_some() && !overwrite {
            info!("Payroll already exists, overwrite not requested");
            return Err(AppError::conflict("Payroll already exists"));
        }

        let people = self.personnel.list_active().await?;
        if people.is_empty() {
            return Err(AppError::validation("No active personnel found"));
        }

        let Preview { entries, totals } = compute_preview(&people);
        let run = NewPayrollRun {
            period: period.to_string(),
            entries,
            totals,
            approved_by: approved_by.to_string(),
            approved_at: Utc::now(),
        };

        let stored = match existing {
            Some(previous) => {
                info!(replaced = previous.id, "Overwriting payroll run");
                self.runs.overwrite_run(previous.id, run).await
            }
            None => self.runs.create_run(run).await,
        }
        .map_err(|e| match e {
            StoreError::Duplicate => AppError::conflict("Payroll already exists"),
            other => AppError::from(other),
        })?;

        info!(id = stored.id, entries = stored.entries.len(), "Payroll approved");
        Ok(stored)
    }

    /// Approve one roster member into `period`. Returns the person's entry and the updated run.
    #[instrument(name = "payroll_approve_person", skip(self))]
    pub async fn approve_person(
        &self,
        period: &str,
        person_id: u64,
        approved_by: &str,
    ) -> Result<(PayrollEntry, PayrollRun), AppError> {
        let period = require_period(period)?;

        let person = self
            .personnel
            .find_by_id(person_id)
            .await?
            .ok_or_else(|| AppError::not_found("Personnel not found"))?;
        if !person.details.active {
            return Err(AppError::validation("Personnel is inactive"));
        }

        let run = self
            .upsert_person_entry(period, &person.details, approved_by)
            .await?;
        Ok((build_entry(&person.details), run))
    }

    /// Insert or replace one person's entry in the run for `period`, creating the run if needed.
    ///
    /// Totals are recomputed from the merged entry set. The write is guarded by the
    /// run's version, so a concurrent writer forces a fresh read instead of being
    /// silently overwritten.
    pub async fn upsert_person_entry(
        &self,
        period: &str,
        person: &PersonnelDetails,
        approved_by: &str,
    ) -> Result<PayrollRun, AppError> {
        let period = require_period(period)?;
        let entry = build_entry(person);

        for attempt in 1..=MAX_UPSERT_ATTEMPTS {
            let now = Utc::now();

            match self.runs.find_by_period(period).await? {
                None => {
                    let entries = vec![entry.clone()];
                    let totals = compute_totals(&entries);
                    let run = NewPayrollRun {
                        period: period.to_string(),
                        entries,
                        totals,
                        approved_by: approved_by.to_string(),
                        approved_at: now,
                    };

                    match self.runs.create_run(run).await {
                        Ok(run) => return Ok(run),
                        Err(StoreError::Duplicate) => {
                            debug!(attempt, "Run created concurrently, re-reading");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                Some(mut run) => {
                    merge_entry(&mut run.entries, entry.clone());
                    run.totals = compute_totals(&run.entries);

                    let written = self
                        .runs
                        .update_entries(run.id, run.version, &run.entries, &run.totals, now)
                        .await?;
                    if written {
                        run.updated_at = Some(now);
                        run.version += 1;
                        return Ok(run);
                    }
                    debug!(attempt, id = run.id, "Run changed underneath, re-reading");
                }
            }
        }

        warn!(period, army_number = %entry.armynumber, "Upsert gave up after contention");
        Err(AppError::conflict(format!(
            "Payroll for {period} is being modified concurrently, try again"
        )))
    }

    pub async fn get_run(&self, period: &str) -> Result<Option<PayrollRun>, AppError> {
        let period = require_period(period)?;
        Ok(self.runs.find_by_period(period).await?)
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<PayrollRunSummary>, AppError> {
        Ok(self.runs.list_history(limit).await?)
    }
}
