use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Longest period label `payroll_runs.period` can hold.
pub const MAX_PERIOD_LEN: usize = 50;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        full_name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        username VARCHAR(100) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(50) NOT NULL DEFAULT 'Finance Officer',
        created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
        last_login_at TIMESTAMP(6) NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS personnel (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        army_number VARCHAR(100) NOT NULL,
        full_name VARCHAR(255) NOT NULL,
        `rank` VARCHAR(100) NULL,
        corps VARCHAR(100) NULL,
        fmn_unit VARCHAR(255) NULL,
        region VARCHAR(100) NULL,
        basic_salary DOUBLE NOT NULL DEFAULT 0,
        allowance DOUBLE NOT NULL DEFAULT 0,
        deductions DOUBLE NOT NULL DEFAULT 0,
        bank_name VARCHAR(255) NULL,
        account_number VARCHAR(100) NULL,
        status VARCHAR(50) NOT NULL DEFAULT 'Active',
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
        updated_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
        INDEX idx_personnel_army_number (army_number),
        INDEX idx_personnel_active (active)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payroll_runs (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        period VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL UNIQUE,
        entries LONGTEXT NOT NULL,
        gross DOUBLE NOT NULL DEFAULT 0,
        allowances DOUBLE NOT NULL DEFAULT 0,
        deductions DOUBLE NOT NULL DEFAULT 0,
        approved_by VARCHAR(255) NOT NULL,
        approved_at TIMESTAMP(6) NOT NULL,
        updated_at TIMESTAMP(6) NULL,
        version BIGINT UNSIGNED NOT NULL DEFAULT 0,
        INDEX idx_payroll_runs_approved_at (approved_at)
    )
    "#,
];

/// Create the tables the server needs if they are missing.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    info!("Schema ready");
    Ok(())
}
