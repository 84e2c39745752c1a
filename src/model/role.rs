use strum_macros::EnumString;

pub const DEFAULT_ROLE: &str = "Finance Officer";

/// Account role. Roles outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    #[strum(serialize = "Admin")]
    Admin,
    #[strum(serialize = "Finance Officer")]
    FinanceOfficer,
    #[strum(default)]
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let raw = if raw.is_empty() { DEFAULT_ROLE } else { raw };
        raw.parse().unwrap_or_else(|_| Role::Other(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::FinanceOfficer => DEFAULT_ROLE,
            Role::Other(name) => name,
        }
    }
}
