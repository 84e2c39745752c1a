use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A signup that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            full_name: self.full_name,
            email: self.email,
            username: self.username,
            password: self.password,
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// What a user may see about an account: everything except the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPublic {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    #[serde(rename = "createdAt")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserPublic {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            username: u.username.clone(),
            role: u.role.clone(),
            created_at: u.created_at,
        }
    }
}
