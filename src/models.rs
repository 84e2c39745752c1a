use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupReq {
    #[schema(example = "Jane Doe")]
    #[serde(default)]
    pub full_name: String,
    #[schema(example = "jane@unit.mil")]
    #[serde(default)]
    pub email: String,
    #[schema(example = "jdoe")]
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[schema(example = "Finance Officer")]
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@unit.mil")]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id; this is the acting identity recorded on payroll approvals.
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,
}
