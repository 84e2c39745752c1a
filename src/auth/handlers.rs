use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, StoreError},
    model::{
        role::Role,
        user::{NewUser, UserPublic},
    },
    models::{LoginReq, SignupReq},
    store::UserStore,
    utils::login_index::{Handle, LoginIndex},
};

/// Ok(true)  => handle is TAKEN
/// Ok(false) => handle is free
async fn is_handle_taken(
    handle: Handle<'_>,
    index: &LoginIndex,
    users: &dyn UserStore,
) -> Result<bool, StoreError> {
    // Cuckoo filter: a miss means the handle was never registered.
    if !index.might_exist(handle) {
        return Ok(false);
    }

    // Cache: recently active accounts.
    if index.is_taken(handle).await {
        return Ok(true);
    }

    users.handle_exists(handle).await
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupReq,
    responses(
        (status = 201, description = "Account created", body = Object, example = json!({
            "message": "Account created",
            "user": {"_id": "1", "fullName": "Jane Doe", "email": "jane@unit.mil", "username": "jdoe", "role": "Finance Officer"}
        })),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email or username already exists")
    ),
    tag = "Auth"
)]
pub async fn signup(
    body: web::Json<SignupReq>,
    users: web::Data<dyn UserStore>,
    index: web::Data<LoginIndex>,
) -> Result<HttpResponse, AppError> {
    let full_name = body.full_name.trim();
    let email = body.email.trim().to_lowercase();
    let username = body.username.trim().to_lowercase();
    let role = Role::parse(body.role.as_deref().unwrap_or_default());

    if full_name.is_empty() || email.is_empty() || username.is_empty() || body.password.is_empty()
    {
        return Err(AppError::validation("All fields are required."));
    }

    if is_handle_taken(Handle::Email(&email), &index, users.get_ref()).await?
        || is_handle_taken(Handle::Username(&username), &index, users.get_ref()).await?
    {
        return Err(AppError::conflict("Email or username already exists."));
    }

    let hashed = hash_password(&body.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let user = users
        .insert(NewUser {
            full_name: full_name.to_string(),
            email,
            username,
            password: hashed,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => AppError::conflict("Email or username already exists."),
            other => AppError::from(other),
        })?;

    index.mark_taken(Handle::Email(&user.email)).await;
    index.mark_taken(Handle::Username(&user.username)).await;
    info!(user_id = user.id, "Account created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Account created",
        "user": UserPublic::from(&user),
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful", body = Object, example = json!({
            "message": "Login successful",
            "token": "eyJ...",
            "user": {"_id": "1", "email": "jane@unit.mil"}
        })),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(users, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginReq>,
    users: web::Data<dyn UserStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let email = body.email.trim().to_lowercase();
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = match users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid());
        }
    };

    if let Err(e) = verify_password(body.password.trim(), &user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }

    debug!(user_id = user.id, "Generating access token");
    let token = generate_access_token(
        user.id,
        &user.email,
        &user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(format!("failed to sign access token: {e}")))?;

    if let Err(e) = users.record_login(user.id, Utc::now()).await {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "token": token,
        "user": UserPublic::from(&user),
    })))
}

#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Current user", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile(
    auth: AuthUser,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(json!({ "user": UserPublic::from(&user) })))
}

/// Tokens are stateless; this only confirms the account and records the event.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = Object, example = json!({
            "message": "User jane@unit.mil logged out successfully."
        })),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    auth: AuthUser,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(
        user_id = user.id,
        token_email = %auth.email,
        role = auth.role.as_str(),
        "User logged out"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {} logged out successfully.", user.email)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_token;
    use crate::auth::middleware::auth_middleware;
    use crate::store::memory::MemoryUserStore;
    use crate::test_support::test_config;
    use actix_web::{App, http::StatusCode, middleware::from_fn, test, web::Data};
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    macro_rules! app {
        ($config:expr, $users:expr, $index:expr) => {{
            let users: Arc<dyn UserStore> = $users.clone();
            test::init_service(
                App::new()
                    .app_data(Data::new($config.clone()))
                    .app_data(Data::from(users))
                    .app_data($index.clone())
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(signup))
                            .route("/login", web::post().to(login))
                            .service(
                                web::resource("/profile")
                                    .wrap(from_fn(auth_middleware))
                                    .route(web::get().to(profile)),
                            )
                            .service(
                                web::resource("/logout")
                                    .wrap(from_fn(auth_middleware))
                                    .route(web::post().to(logout)),
                            ),
                    ),
            )
            .await
        }};
    }

    fn jane() -> Value {
        json!({
            "fullName": "Jane Doe",
            "email": " Jane@Unit.MIL ",
            "username": "JDoe",
            "password": "s3cret",
        })
    }

    fn signup_req(payload: Value) -> test::TestRequest {
        test::TestRequest::post().uri("/auth/signup").set_json(payload)
    }

    fn login_req(email: &str, password: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": email, "password": password }))
    }

    #[actix_web::test]
    async fn signup_normalises_handles_and_hides_password() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let resp = test::call_service(&app, signup_req(jane()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(body["message"], "Account created");
        assert_eq!(body["user"]["email"], "jane@unit.mil");
        assert_eq!(body["user"]["username"], "jdoe");
        assert_eq!(body["user"]["fullName"], "Jane Doe");
        assert_eq!(body["user"]["role"], "Finance Officer");
        assert!(body["user"].get("password").is_none());
    }

    #[actix_web::test]
    async fn signup_requires_every_field() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let mut payload = jane();
        payload["username"] = json!("   ");
        let resp = test::call_service(&app, signup_req(payload).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, signup_req(json!({ "email": "a@b.c" })).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn duplicate_email_or_username_conflicts() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let resp = test::call_service(&app, signup_req(jane()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let mut same_email = jane();
        same_email["username"] = json!("other");
        let resp = test::call_service(&app, signup_req(same_email).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let mut same_username = jane();
        same_username["email"] = json!("other@unit.mil");
        same_username["username"] = json!("jdoe");
        let resp = test::call_service(&app, signup_req(same_username).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Email or username already exists.");
    }

    #[actix_web::test]
    async fn existing_account_conflicts_with_cold_index() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        users
            .insert(NewUser {
                full_name: "Jane Doe".into(),
                email: "jane@unit.mil".into(),
                username: "jdoe".into(),
                password: "hash".into(),
                role: "Admin".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let resp = test::call_service(&app, signup_req(jane()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn store_outage_during_availability_check_is_internal_error() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        // In the filter but not the cache, so the check reaches the store.
        index.mark_taken(Handle::Email("jane@unit.mil")).await;
        index.evict(Handle::Email("jane@unit.mil")).await;
        users.offline.store(true, Ordering::SeqCst);
        let app = app!(config, users, index);

        let resp = test::call_service(&app, signup_req(jane()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn login_issues_token_and_records_login() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let created: Value = test::call_and_read_body_json(&app, signup_req(jane()).to_request()).await;
        let id: u64 = created["user"]["_id"].as_str().unwrap().parse().unwrap();

        let resp = test::call_service(&app, login_req("JANE@unit.mil ", "s3cret").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Login successful");

        let claims = verify_token(body["token"].as_str().unwrap(), &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "jane@unit.mil");
        assert_eq!(claims.role, "Finance Officer");
        assert!(users.last_login(id).is_some());
    }

    #[actix_web::test]
    async fn bad_credentials_are_unauthorized() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        test::call_service(&app, signup_req(jane()).to_request()).await;

        for req in [
            login_req("jane@unit.mil", "wrong").to_request(),
            login_req("nobody@unit.mil", "s3cret").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], "Invalid email or password");
        }
    }

    #[actix_web::test]
    async fn profile_and_logout_follow_the_token_subject() {
        let config = test_config();
        let users = Arc::new(MemoryUserStore::default());
        let index = Data::new(LoginIndex::default());
        let app = app!(config, users, index);

        let created: Value = test::call_and_read_body_json(&app, signup_req(jane()).to_request()).await;
        let id: u64 = created["user"]["_id"].as_str().unwrap().parse().unwrap();
        let login: Value =
            test::call_and_read_body_json(&app, login_req("jane@unit.mil", "s3cret").to_request()).await;
        let bearer = ("Authorization", format!("Bearer {}", login["token"].as_str().unwrap()));

        let req = test::TestRequest::get()
            .uri("/auth/profile")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["username"], "jdoe");

        let req = test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "User jane@unit.mil logged out successfully.");

        users.remove(id);
        let req = test::TestRequest::get()
            .uri("/auth/profile")
            .insert_header(bearer)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
