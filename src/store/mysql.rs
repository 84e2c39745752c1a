use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::debug;

use super::{PayrollStore, PersonnelStore, StoreResult, UserStore};
use crate::error::{StoreError, classify};
use crate::model::payroll::{
    NewPayrollRun, PayrollEntry, PayrollRun, PayrollRunSummary, PayrollTotals,
};
use crate::model::personnel::{PersonnelChanges, PersonnelDetails, PersonnelRecord};
use crate::model::user::{NewUser, User};
use crate::utils::login_index::Handle;

// -------------------- payroll runs --------------------

#[derive(sqlx::FromRow)]
struct PayrollRunRow {
    id: u64,
    period: String,
    entries: String,
    gross: f64,
    allowances: f64,
    deductions: f64,
    approved_by: String,
    approved_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
}

impl TryFrom<PayrollRunRow> for PayrollRun {
    type Error = StoreError;

    fn try_from(row: PayrollRunRow) -> Result<Self, Self::Error> {
        let entries: Vec<PayrollEntry> = serde_json::from_str(&row.entries)?;
        Ok(PayrollRun {
            id: row.id,
            period: row.period,
            entries,
            totals: PayrollTotals {
                gross: row.gross,
                allowances: row.allowances,
                deductions: row.deductions,
            },
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PayrollSummaryRow {
    id: u64,
    period: String,
    gross: f64,
    allowances: f64,
    deductions: f64,
    approved_by: String,
    approved_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<PayrollSummaryRow> for PayrollRunSummary {
    fn from(row: PayrollSummaryRow) -> Self {
        PayrollRunSummary {
            id: row.id,
            period: row.period,
            totals: PayrollTotals {
                gross: row.gross,
                allowances: row.allowances,
                deductions: row.deductions,
            },
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            updated_at: row.updated_at,
        }
    }
}

const INSERT_RUN_SQL: &str = r#"
    INSERT INTO payroll_runs
        (period, entries, gross, allowances, deductions, approved_by, approved_at, version)
    VALUES (?, ?, ?, ?, ?, ?, ?, 0)
"#;

pub struct MySqlPayrollStore {
    pool: MySqlPool,
}

impl MySqlPayrollStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayrollStore for MySqlPayrollStore {
    async fn find_by_period(&self, period: &str) -> StoreResult<Option<PayrollRun>> {
        let row = sqlx::query_as::<_, PayrollRunRow>(
            r#"
            SELECT id, period, entries, gross, allowances, deductions,
                   approved_by, approved_at, updated_at, version
            FROM payroll_runs
            WHERE period = ?
            "#,
        )
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PayrollRun::try_from).transpose()
    }

    async fn create_run(&self, run: NewPayrollRun) -> StoreResult<PayrollRun> {
        let entries = serde_json::to_string(&run.entries)?;

        let result = sqlx::query(INSERT_RUN_SQL)
            .bind(&run.period)
            .bind(&entries)
            .bind(run.totals.gross)
            .bind(run.totals.allowances)
            .bind(run.totals.deductions)
            .bind(&run.approved_by)
            .bind(run.approved_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        debug!(period = %run.period, id = result.last_insert_id(), "Payroll run inserted");
        Ok(run.into_run(result.last_insert_id()))
    }

    async fn overwrite_run(
        &self,
        existing_id: u64,
        run: NewPayrollRun,
    ) -> StoreResult<PayrollRun> {
        let entries = serde_json::to_string(&run.entries)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM payroll_runs WHERE id = ?")
            .bind(existing_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(INSERT_RUN_SQL)
            .bind(&run.period)
            .bind(&entries)
            .bind(run.totals.gross)
            .bind(run.totals.allowances)
            .bind(run.totals.deductions)
            .bind(&run.approved_by)
            .bind(run.approved_at)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await?;

        debug!(period = %run.period, replaced = existing_id, id = result.last_insert_id(), "Payroll run overwritten");
        Ok(run.into_run(result.last_insert_id()))
    }

    async fn update_entries(
        &self,
        id: u64,
        expected_version: u64,
        entries: &[PayrollEntry],
        totals: &PayrollTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let encoded = serde_json::to_string(entries)?;

        let result = sqlx::query(
            r#"
            UPDATE payroll_runs
            SET entries = ?, gross = ?, allowances = ?, deductions = ?,
                updated_at = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&encoded)
        .bind(totals.gross)
        .bind(totals.allowances)
        .bind(totals.deductions)
        .bind(updated_at)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_history(&self, limit: u32) -> StoreResult<Vec<PayrollRunSummary>> {
        let rows = sqlx::query_as::<_, PayrollSummaryRow>(
            r#"
            SELECT id, period, gross, allowances, deductions,
                   approved_by, approved_at, updated_at
            FROM payroll_runs
            ORDER BY approved_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PayrollRunSummary::from).collect())
    }
}

// -------------------- personnel --------------------

const PERSONNEL_COLUMNS: &str = "id, army_number, full_name, `rank`, corps, fmn_unit, region, \
     basic_salary, allowance, deductions, bank_name, account_number, status, active, \
     created_at, updated_at";

pub struct MySqlPersonnelStore {
    pool: MySqlPool,
}

impl MySqlPersonnelStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, bind: Option<&str>) -> StoreResult<Vec<PersonnelRecord>> {
        let sql = format!("SELECT {PERSONNEL_COLUMNS} FROM personnel {clause}");
        let mut query = sqlx::query_as::<_, PersonnelRecord>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl PersonnelStore for MySqlPersonnelStore {
    async fn list_all(&self) -> StoreResult<Vec<PersonnelRecord>> {
        self.fetch_where("ORDER BY created_at DESC, id DESC", None).await
    }

    async fn list_active(&self) -> StoreResult<Vec<PersonnelRecord>> {
        self.fetch_where("WHERE active = TRUE ORDER BY id", None).await
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<PersonnelRecord>> {
        let sql = format!("SELECT {PERSONNEL_COLUMNS} FROM personnel WHERE id = ?");
        Ok(sqlx::query_as::<_, PersonnelRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_army_number(
        &self,
        army_number: &str,
    ) -> StoreResult<Option<PersonnelRecord>> {
        let mut found = self
            .fetch_where(
                "WHERE LOWER(army_number) = LOWER(?) ORDER BY id LIMIT 1",
                Some(army_number),
            )
            .await?;
        Ok(found.pop())
    }

    async fn insert(&self, details: PersonnelDetails) -> StoreResult<PersonnelRecord> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO personnel
                (army_number, full_name, `rank`, corps, fmn_unit, region,
                 basic_salary, allowance, deductions, bank_name, account_number,
                 status, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&details.army_number)
        .bind(&details.full_name)
        .bind(&details.rank)
        .bind(&details.corps)
        .bind(&details.fmn_unit)
        .bind(&details.region)
        .bind(details.basic_salary)
        .bind(details.allowance)
        .bind(details.deductions)
        .bind(&details.bank_name)
        .bind(&details.account_number)
        .bind(&details.status)
        .bind(details.active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(PersonnelRecord {
            id: result.last_insert_id(),
            details,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: u64,
        changes: &PersonnelChanges,
    ) -> StoreResult<Option<PersonnelRecord>> {
        let Some(mut record) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(record));
        }

        changes.apply(&mut record.details);
        record.updated_at = Utc::now();
        let d = &record.details;

        sqlx::query(
            r#"
            UPDATE personnel
            SET army_number = ?, full_name = ?, `rank` = ?, corps = ?, fmn_unit = ?,
                region = ?, basic_salary = ?, allowance = ?, deductions = ?,
                bank_name = ?, account_number = ?, status = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&d.army_number)
        .bind(&d.full_name)
        .bind(&d.rank)
        .bind(&d.corps)
        .bind(&d.fmn_unit)
        .bind(&d.region)
        .bind(d.basic_salary)
        .bind(d.allowance)
        .bind(d.deductions)
        .bind(&d.bank_name)
        .bind(&d.account_number)
        .bind(&d.status)
        .bind(d.active)
        .bind(record.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(Some(record))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM personnel WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -------------------- users --------------------

const USER_COLUMNS: &str = "id, full_name, email, username, password, role, created_at";

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn handle_exists(&self, handle: Handle<'_>) -> StoreResult<bool> {
        let (column, value) = match handle {
            Handle::Email(v) => ("email", v),
            Handle::Username(v) => ("username", v),
        };
        let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {column} = ? LIMIT 1)");

        // EXISTS comes back as BIGINT
        let exists = sqlx::query_scalar::<_, i64>(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (full_name, email, username, password, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(user.into_user(result.last_insert_id()))
    }

    async fn record_login(&self, id: u64, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
