use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, UserId};

/// Account role as stored on the user profile and asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Regular customer account.
    #[default]
    User,
    /// Support staff with read access to other accounts.
    Support,
    /// Administrator with unlimited access and grant management rights.
    Admin,
}

impl AccountRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Support => "support",
            Self::Admin => "admin",
        }
    }
}

impl Display for AccountRole {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "support" => Ok(Self::Support),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown account role '{value}'"
            ))),
        }
    }
}

/// Verified caller identity supplied by the identity gateway for each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    role: AccountRole,
}

impl UserIdentity {
    /// Creates a user identity from the gateway's user id and role claim.
    #[must_use]
    pub fn new(user_id: UserId, role: AccountRole) -> Self {
        Self { user_id, role }
    }

    /// Returns the stable user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the role claim attached by the identity provider.
    #[must_use]
    pub fn role(&self) -> AccountRole {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AccountRole;

    #[test]
    fn role_roundtrip_storage_value() {
        for role in [AccountRole::User, AccountRole::Support, AccountRole::Admin] {
            let restored = AccountRole::from_str(role.as_str());
            assert!(matches!(restored, Ok(value) if value == role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(AccountRole::from_str("superuser").is_err());
    }
}
