use crate::auth::jwt::generate_access_token;
use crate::config::Config;

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        rate_login_per_min: 60,
        rate_signup_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        history_limit: 50,
    }
}

/// Authorization header for user 7.
pub fn bearer(config: &Config) -> (&'static str, String) {
    let token = generate_access_token(7, "clerk@unit.mil", "Finance Officer", &config.jwt_secret, 900)
        .expect("sign test token");
    ("Authorization", format!("Bearer {token}"))
}
