use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::io;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod payroll;
mod routes;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use config::Config;
use db::{ensure_schema, init_db};

use crate::docs::ApiDoc;
use crate::payroll::service::PayrollService;
use crate::store::mysql::{MySqlPayrollStore, MySqlPersonnelStore, MySqlUserStore};
use crate::store::{PersonnelStore, UserStore};
use crate::utils::login_index::LoginIndex;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn init_tracing(log_dir: &str) -> WorkerGuard {
    // Rolling daily log
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    guard
}

#[get("/")]
async fn index() -> impl Responder {
    "Payroll service is running"
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    // Subscriber first so configuration fallbacks are logged.
    let _guard = init_tracing(&config::log_dir_from_env());

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {e:#}");
        io::Error::other(format!("{e:#}"))
    })?;

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .map_err(|e| io::Error::other(format!("failed to connect to database: {e}")))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| io::Error::other(format!("failed to prepare schema: {e}")))?;

    let personnel: Arc<dyn PersonnelStore> = Arc::new(MySqlPersonnelStore::new(pool.clone()));
    let service = Data::new(PayrollService::new(
        Arc::new(MySqlPayrollStore::new(pool.clone())),
        personnel.clone(),
    ));
    let personnel = Data::from(personnel);
    let users: Arc<dyn UserStore> = Arc::new(MySqlUserStore::new(pool.clone()));
    let users = Data::from(users);
    let login_index = Data::new(LoginIndex::default());

    let warmup_pool = pool.clone();
    let warmup_index = login_index.clone();
    actix_web::rt::spawn(async move {
        // Last 30 days of active accounts, 250 rows per batch
        if let Err(e) = warmup_index.warmup(&warmup_pool, 30, 250).await {
            error!(error = %e, "Failed to warm up login index");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(service.clone())
            .app_data(personnel.clone())
            .app_data(users.clone())
            .app_data(login_index.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
