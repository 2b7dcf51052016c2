use thiserror::Error;

/// Shared operator secret configured for the deployment.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

impl AdminToken {
    /// Blank tokens are treated as "not configured".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Exact comparison, without early exit on the first differing byte.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl core::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AdminToken(***)")
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("admin access is not configured")]
    NotConfigured,

    #[error("admin token is missing")]
    Missing,

    #[error("admin token is invalid")]
    Invalid,
}

/// Authorize an operator request.
///
/// - No IO
/// - No configured token means every admin request is rejected
pub fn authorize_admin(configured: Option<&AdminToken>, presented: Option<&str>) -> Result<(), AuthError> {
    let configured = configured.ok_or(AuthError::NotConfigured)?;
    let presented = presented.filter(|p| !p.is_empty()).ok_or(AuthError::Missing)?;

    if configured.matches(presented) {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}
