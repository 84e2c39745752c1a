use crate::{
    api::{payroll, personnel},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = 60_000 / u64::from(requests_per_min.max(1));
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request(per_ms.max(1))
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/signup")
                    .wrap(signup_limiter)
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            // token required from here on
            .service(
                web::resource("/profile")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::profile)),
            )
            .service(
                web::resource("/logout")
                    .wrap(from_fn(auth_middleware))
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .configure(personnel_routes)
            .configure(payroll_routes),
    );
}

pub fn personnel_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/personnel")
            // /personnel
            .service(
                web::resource("")
                    .route(web::get().to(personnel::list_personnel))
                    .route(web::post().to(personnel::add_personnel)),
            )
            // /personnel/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(personnel::get_personnel))
                    .route(web::put().to(personnel::update_personnel))
                    .route(web::patch().to(personnel::update_personnel))
                    .route(web::delete().to(personnel::delete_personnel)),
            ),
    );
}

pub fn payroll_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payroll")
            // /payroll
            .service(web::resource("").route(web::post().to(payroll::approve_payroll)))
            .service(web::resource("/preview").route(web::get().to(payroll::preview_payroll)))
            .service(web::resource("/run").route(web::get().to(payroll::get_payroll_run)))
            .service(
                web::resource("/history").route(web::get().to(payroll::list_payroll_history)),
            )
            // /payroll/approve/{id}
            .service(
                web::resource("/approve/{id}").route(web::post().to(payroll::approve_person)),
            ),
    );
}
