use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const ASSESSMENT_PATH: &str = "/mobile/assessment";
pub const RESULTS_PATH: &str = "/mobile/assessment/results";
pub const MOBILE_LOGIN_PATH: &str = "/mobile/login";

/// Login surfaces an account can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    Mobile,
    Professional,
    Admin,
}

impl Portal {
    pub fn login_path(self) -> &'static str {
        match self {
            Self::Mobile => MOBILE_LOGIN_PATH,
            Self::Professional => "/professional/login",
            Self::Admin => "/admin/login",
        }
    }
}

/// Opaque bearer token. Never printed in full.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerCredential(String);

impl BearerCredential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    /// Parse an `Authorization` header value. The scheme is matched case-insensitively.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        Self::new(token)
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Patient,
    Professional,
    Admin,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// Subset of `GET /auth/me` the flow relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, deserialize_with = "nullable_account_type")]
    pub user_type: AccountType,
    #[serde(default)]
    pub email: Option<String>,
}

/// The backend sends `"user_type": null` for accounts without a declared type.
fn nullable_account_type<'de, D>(deserializer: D) -> Result<AccountType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<AccountType>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub location: String,
    pub clear_credential: bool,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            clear_credential: false,
        }
    }

    fn clearing(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            clear_credential: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Proceed,
    Redirect(Redirect),
}

/// Where an unauthenticated visitor of the assessment is sent.
pub fn login_redirect() -> Redirect {
    Redirect::to(format!("{MOBILE_LOGIN_PATH}?redirect={ASSESSMENT_PATH}"))
}

/// Only patient accounts (or accounts with no declared type) may use the mobile flow.
pub fn route_account(user: &CurrentUser) -> AccessDecision {
    match user.user_type {
        AccountType::Patient | AccountType::Unspecified => AccessDecision::Proceed,
        AccountType::Professional => {
            AccessDecision::Redirect(Redirect::clearing(Portal::Professional.login_path()))
        }
        AccountType::Admin => {
            AccessDecision::Redirect(Redirect::clearing(Portal::Admin.login_path()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: AccountType) -> CurrentUser {
        CurrentUser {
            user_type,
            email: None,
        }
    }

    #[test]
    fn login_redirect_returns_to_assessment() {
        let redirect = login_redirect();
        assert_eq!(
            redirect.location,
            "/mobile/login?redirect=/mobile/assessment"
        );
        assert!(!redirect.clear_credential);
    }

    #[test]
    fn staff_accounts_are_sent_to_their_portal() {
        assert_eq!(
            route_account(&user(AccountType::Admin)),
            AccessDecision::Redirect(Redirect {
                location: "/admin/login".into(),
                clear_credential: true,
            })
        );
        assert_eq!(
            route_account(&user(AccountType::Professional)),
            AccessDecision::Redirect(Redirect {
                location: "/professional/login".into(),
                clear_credential: true,
            })
        );
    }

    #[test]
    fn patients_and_untyped_accounts_proceed() {
        assert_eq!(
            route_account(&user(AccountType::Patient)),
            AccessDecision::Proceed
        );
        assert_eq!(
            route_account(&user(AccountType::Unspecified)),
            AccessDecision::Proceed
        );
    }

    #[test]
    fn unknown_or_missing_user_type_reads_as_unspecified() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"user_type":"auditor"}"#).expect("deserializes");
        assert_eq!(user.user_type, AccountType::Unspecified);

        let user: CurrentUser = serde_json::from_str(r#"{"email":"a@b.fr"}"#).expect("deserializes");
        assert_eq!(user.user_type, AccountType::Unspecified);
    }

    #[test]
    fn null_user_type_reads_as_unspecified_and_proceeds() {
        let user: CurrentUser = serde_json::from_str(r#"{"user_type":null,"email":"a@b.fr"}"#)
            .expect("deserializes");
        assert_eq!(user.user_type, AccountType::Unspecified);
        assert_eq!(user.email.as_deref(), Some("a@b.fr"));
        assert_eq!(route_account(&user), AccessDecision::Proceed);

        let user: CurrentUser =
            serde_json::from_str(r#"{"user_type":"admin"}"#).expect("deserializes");
        assert_eq!(user.user_type, AccountType::Admin);
    }

    #[test]
    fn credential_parsing() {
        let credential = BearerCredential::from_authorization("Bearer abc.def").expect("parses");
        assert_eq!(credential.token(), "abc.def");
        assert!(BearerCredential::from_authorization("bearer   ").is_none());
        assert!(BearerCredential::from_authorization("Basic abc").is_none());
        assert!(BearerCredential::from_authorization("abc").is_none());
        assert_eq!(format!("{credential:?}"), "BearerCredential(***)");
    }
}
