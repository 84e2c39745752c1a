use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Approved,
}

/// One person's computed payroll line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollEntry {
    #[schema(example = "NA1")]
    pub armynumber: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub rank: String,
    pub corps: String,
    pub fmnunit: String,
    pub region: String,
    #[schema(example = 1000.0)]
    pub basic: f64,
    #[schema(example = 200.0)]
    pub allowance: f64,
    #[schema(example = 50.0)]
    pub deductions: f64,
    #[schema(example = 1150.0)]
    pub net: f64,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollTotals {
    #[schema(example = 1200.0)]
    pub gross: f64,
    #[schema(example = 200.0)]
    pub allowances: f64,
    #[schema(example = 50.0)]
    pub deductions: f64,
}

/// A persisted payroll run. `totals` always aggregates exactly `entries`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollRun {
    pub id: u64,
    #[schema(example = "2024-01")]
    pub period: String,
    pub entries: Vec<PayrollEntry>,
    pub totals: PayrollTotals,
    pub approved_by: String,
    #[schema(value_type = String, format = DateTime)]
    pub approved_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub version: u64,
}

/// History view of a run: everything but the entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollRunSummary {
    pub id: u64,
    #[schema(example = "2024-01")]
    pub period: String,
    pub totals: PayrollTotals,
    pub approved_by: String,
    #[schema(value_type = String, format = DateTime)]
    pub approved_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A run that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayrollRun {
    pub period: String,
    pub entries: Vec<PayrollEntry>,
    pub totals: PayrollTotals,
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
}

impl NewPayrollRun {
    pub fn into_run(self, id: u64) -> PayrollRun {
        PayrollRun {
            id,
            period: self.period,
            entries: self.entries,
            totals: self.totals,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            updated_at: None,
            version: 0,
        }
    }
}

impl From<&PayrollRun> for PayrollRunSummary {
    fn from(run: &PayrollRun) -> Self {
        Self {
            id: run.id,
            period: run.period.clone(),
            totals: run.totals,
            approved_by: run.approved_by.clone(),
            approved_at: run.approved_at,
            updated_at: run.updated_at,
        }
    }
}
