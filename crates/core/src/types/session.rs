//! Explicit session credential handle.
//!
//! The order backend authenticates every call with a bearer token. The
//! token is passed as an explicit [`Session`] argument on each client
//! operation rather than read from ambient storage, so there is exactly
//! one place a credential can enter a request.

use secrecy::{ExposeSecret, SecretString};

/// A bearer credential for the order backend, scoped to one signed-in user.
///
/// Wraps the token in [`SecretString`] so it is redacted from `Debug`
/// output and zeroized on drop.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
}

impl Session {
    /// Create a session handle from a bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    /// Expose the raw token for attaching to an outgoing request.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Render the `Authorization` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let session = Session::new("tok-abc");
        assert_eq!(session.bearer(), "Bearer tok-abc");
        assert_eq!(session.expose(), "tok-abc");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("tok-super-secret");
        let debug = format!("{session:?}");
        assert!(!debug.contains("tok-super-secret"));
    }
}
