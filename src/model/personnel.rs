use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::payroll::coerce::coerce_amount;

/// Legacy key variants accepted on inbound roster payloads, highest priority first.
///
/// Every era of roster import is resolved here and nowhere else; downstream
/// code only ever sees [`PersonnelDetails`].
pub mod aliases {
    pub const ARMY_NUMBER: &[&str] = &["armyNumber", "Army_Number", "armynumber"];
    pub const FULL_NAME: &[&str] = &["fullName", "Name", "name"];
    pub const RANK: &[&str] = &["rank", "Rank"];
    pub const CORPS: &[&str] = &["corps", "Corps"];
    pub const FMN_UNIT: &[&str] = &["fmn_unit", "Fmn/Unit", "fmnUnit", "Fmn_Unit"];
    pub const REGION: &[&str] = &["region", "Region"];
    pub const BASIC_SALARY: &[&str] = &["basicSalary", "BasicSalary", "Basic_Pay"];
    pub const ALLOWANCE: &[&str] = &["allowance", "Allowance"];
    pub const DEDUCTIONS: &[&str] = &["deductions", "Deductions"];
    pub const BANK_NAME: &[&str] = &["bankName"];
    pub const ACCOUNT_NUMBER: &[&str] = &["accountNumber"];
    pub const STATUS: &[&str] = &["status"];
}

pub const DEFAULT_STATUS: &str = "Active";

/// Canonical roster fields, independent of storage identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelDetails {
    #[schema(example = "NA1")]
    pub army_number: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "Capt", nullable = true)]
    pub rank: Option<String>,
    #[schema(example = "Signals", nullable = true)]
    pub corps: Option<String>,
    #[serde(rename = "fmn_unit")]
    #[schema(example = "1 Div", nullable = true)]
    pub fmn_unit: Option<String>,
    #[schema(example = "North", nullable = true)]
    pub region: Option<String>,
    #[schema(example = 1000.0)]
    pub basic_salary: f64,
    #[schema(example = 200.0)]
    pub allowance: f64,
    #[schema(example = 50.0)]
    pub deductions: f64,
    #[schema(nullable = true)]
    pub bank_name: Option<String>,
    #[schema(nullable = true)]
    pub account_number: Option<String>,
    #[schema(example = "Active")]
    pub status: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PersonnelRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub details: PersonnelDetails,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

/// Partial roster update. `Some(None)` clears an optional field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersonnelChanges {
    pub army_number: Option<String>,
    pub full_name: Option<String>,
    pub rank: Option<Option<String>>,
    pub corps: Option<Option<String>>,
    pub fmn_unit: Option<Option<String>>,
    pub region: Option<Option<String>>,
    pub basic_salary: Option<f64>,
    pub allowance: Option<f64>,
    pub deductions: Option<f64>,
    pub bank_name: Option<Option<String>>,
    pub account_number: Option<Option<String>>,
    pub status: Option<String>,
    pub active: Option<bool>,
}

impl PersonnelChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, details: &mut PersonnelDetails) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut details.army_number, &self.army_number);
        set(&mut details.full_name, &self.full_name);
        set(&mut details.rank, &self.rank);
        set(&mut details.corps, &self.corps);
        set(&mut details.fmn_unit, &self.fmn_unit);
        set(&mut details.region, &self.region);
        set(&mut details.basic_salary, &self.basic_salary);
        set(&mut details.allowance, &self.allowance);
        set(&mut details.deductions, &self.deductions);
        set(&mut details.bank_name, &self.bank_name);
        set(&mut details.account_number, &self.account_number);
        set(&mut details.status, &self.status);
        set(&mut details.active, &self.active);
    }
}

/// Borrowed view over an untyped roster payload.
pub struct RawPersonnel<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> RawPersonnel<'a> {
    pub fn new(payload: &'a Value) -> Self {
        Self {
            fields: payload.as_object(),
        }
    }

    /// First alias present with a non-null value.
    pub fn lookup(&self, keys: &[&str]) -> Option<&'a Value> {
        let fields = self.fields?;
        keys.iter()
            .filter_map(|k| fields.get(*k))
            .find(|v| !v.is_null())
    }

    /// First alias that renders to non-blank text.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let fields = self.fields?;
        keys.iter()
            .filter_map(|k| fields.get(*k))
            .filter_map(render_text)
            .find(|s| !s.is_empty())
    }

    pub fn amount(&self, keys: &[&str]) -> f64 {
        coerce_amount(self.lookup(keys), 0.0)
    }

    fn explicit_active(&self) -> Option<bool> {
        self.fields?.get("active").and_then(Value::as_bool)
    }

    /// Resolve a full record, as used for creation and payroll previews.
    pub fn resolve(&self) -> PersonnelDetails {
        let status = self
            .text(aliases::STATUS)
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let active = self
            .explicit_active()
            .unwrap_or_else(|| is_active_status(&status));

        PersonnelDetails {
            army_number: self.text(aliases::ARMY_NUMBER).unwrap_or_default(),
            full_name: self.text(aliases::FULL_NAME).unwrap_or_default(),
            rank: self.text(aliases::RANK),
            corps: self.text(aliases::CORPS),
            fmn_unit: self.text(aliases::FMN_UNIT),
            region: self.text(aliases::REGION),
            basic_salary: self.amount(aliases::BASIC_SALARY),
            allowance: self.amount(aliases::ALLOWANCE),
            deductions: self.amount(aliases::DEDUCTIONS),
            bank_name: self.text(aliases::BANK_NAME),
            account_number: self.text(aliases::ACCOUNT_NUMBER),
            status,
            active,
        }
    }

    /// Resolve only the fields the payload actually carries.
    pub fn changes(&self) -> PersonnelChanges {
        let optional_text = |keys: &[&str]| {
            self.lookup(keys)
                .map(|v| render_text(v).filter(|s| !s.is_empty()))
        };
        let required_text = |keys: &[&str]| {
            self.lookup(keys)
                .and_then(render_text)
                .filter(|s| !s.is_empty())
        };
        let amount = |keys: &[&str]| self.lookup(keys).map(|v| coerce_amount(Some(v), 0.0));

        let status = self.lookup(aliases::STATUS).map(|v| {
            render_text(v)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string())
        });
        let active = self
            .explicit_active()
            .or_else(|| status.as_deref().map(is_active_status));

        PersonnelChanges {
            army_number: required_text(aliases::ARMY_NUMBER),
            full_name: required_text(aliases::FULL_NAME),
            rank: optional_text(aliases::RANK),
            corps: optional_text(aliases::CORPS),
            fmn_unit: optional_text(aliases::FMN_UNIT),
            region: optional_text(aliases::REGION),
            basic_salary: amount(aliases::BASIC_SALARY),
            allowance: amount(aliases::ALLOWANCE),
            deductions: amount(aliases::DEDUCTIONS),
            bank_name: optional_text(aliases::BANK_NAME),
            account_number: optional_text(aliases::ACCOUNT_NUMBER),
            status,
            active,
        }
    }
}

pub fn is_active_status(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("active")
}

// Spreadsheet imports store army numbers as numbers now and then.
fn render_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
