//! Session context types for authenticated requests.
//!
//! Authentication itself is delegated to the external identity provider;
//! the Engine only needs a verified (user, company, role) triple.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims carried by every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Company ID (tenant scope for every query).
    pub company: Uuid,
    /// User's role in the company (admin, manager, employee).
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, company_id: Uuid, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            company: company_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.company
    }

    /// Returns true if the session holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_accessors() {
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let claims = Claims::new(user, company, "manager", Utc::now() + Duration::minutes(15));

        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.company_id(), company);
        assert!(!claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_is_admin_case_insensitive() {
        let claims = Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Admin",
            Utc::now() + Duration::minutes(15),
        );
        assert!(claims.is_admin());
    }
}
