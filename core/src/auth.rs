//! Authentication policy for YOURLS API requests.
//!
//! A signature token wins over a username/password pair. A pair with either
//! half missing or empty does not count as configured.

use std::fmt;

use crate::error::ApiError;
use crate::http::Params;

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Secret signature token from the YOURLS tools page.
    Signature(String),
    Password { username: String, password: String },
}

impl Credentials {
    pub fn resolve(signature: Option<&str>, username: Option<&str>, password: Option<&str>) -> Option<Self> {
        let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(signature) = present(signature) {
            return Some(Credentials::Signature(signature));
        }
        match (present(username), present(password)) {
            (Some(username), Some(password)) => Some(Credentials::Password { username, password }),
            _ => None,
        }
    }

    pub(crate) fn apply(&self, params: &mut Params) {
        match self {
            Credentials::Signature(signature) => params.insert("signature", signature),
            Credentials::Password { username, password } => {
                params.insert("username", username);
                params.insert("password", password);
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Signature(_) => f.write_str("Signature(***)"),
            Credentials::Password { username, .. } => {
                f.debug_struct("Password").field("username", username).field("password", &"***").finish()
            }
        }
    }
}

/// Attach credentials to `params`, or fail before any request is sent.
pub(crate) fn authenticate(credentials: Option<&Credentials>, params: &mut Params) -> Result<(), ApiError> {
    match credentials {
        Some(credentials) => {
            credentials.apply(params);
            Ok(())
        }
        None => Err(ApiError::config(
            "no authentication provided: set 'signature' or both 'username' and 'password'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_takes_precedence() {
        let creds = Credentials::resolve(Some("sig"), Some("admin"), Some("secret")).unwrap();
        assert_eq!(creds, Credentials::Signature("sig".to_string()));
    }

    #[test]
    fn password_pair_when_no_signature() {
        let creds = Credentials::resolve(None, Some("admin"), Some("secret")).unwrap();
        assert!(matches!(creds, Credentials::Password { ref username, .. } if username == "admin"));
    }

    #[test]
    fn empty_signature_falls_through_to_password() {
        let creds = Credentials::resolve(Some(""), Some("admin"), Some("secret")).unwrap();
        assert!(matches!(creds, Credentials::Password { .. }));
    }

    #[test]
    fn half_a_pair_is_no_credentials() {
        assert!(Credentials::resolve(None, Some("admin"), None).is_none());
        assert!(Credentials::resolve(None, None, Some("secret")).is_none());
        assert!(Credentials::resolve(None, Some("admin"), Some("")).is_none());
        assert!(Credentials::resolve(None, None, None).is_none());
    }

    #[test]
    fn authenticate_without_credentials_fails() {
        let mut params = Params::new();
        let err = authenticate(None, &mut params).unwrap_err();
        assert!(err.is_configuration());
        assert!(params.is_empty());
    }

    #[test]
    fn password_pair_is_attached_in_order() {
        let mut params = Params::new();
        let creds = Credentials::resolve(None, Some("admin"), Some("secret"));
        authenticate(creds.as_ref(), &mut params).unwrap();
        assert_eq!(params.get("username"), Some("admin"));
        assert_eq!(params.get("password"), Some("secret"));
        assert_eq!(params.get("signature"), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let sig = format!("{:?}", Credentials::Signature("topsecret".to_string()));
        let pair = format!("{:?}", Credentials::resolve(None, Some("admin"), Some("hunter2")).unwrap());
        assert!(!sig.contains("topsecret"));
        assert!(!pair.contains("hunter2"));
        assert!(pair.contains("admin"));
    }
}
