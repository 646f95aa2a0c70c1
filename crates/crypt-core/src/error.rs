use thiserror::Error;

pub type CryptResult<T> = Result<T, CryptError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptError {
    #[error("unknown algorithm \"{0}\"")]
    UnknownAlgorithm(String),

    #[error("algorithm index {index} out of range (0..{count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Wrong password, corrupted data, or tampering. Carries no detail.
    #[error("authentication failed: wrong password or corrupted data")]
    AuthenticationFailure,

    #[error("key derivation failed: {0}")]
    DerivationFailure(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("empty password rejected by policy")]
    EmptyPassword,

    #[error("config error: {0}")]
    Config(String),
}

impl CryptError {
    /// Stable slug used in the `error:<op>:<kind>:` boundary strings.
    pub fn kind(&self) -> &'static str {
        match self {
            CryptError::UnknownAlgorithm(_) => "unknown-algorithm",
            CryptError::IndexOutOfRange { .. } => "invalid-index",
            CryptError::MalformedEnvelope(_) => "malformed-envelope",
            CryptError::AuthenticationFailure => "authentication-failure",
            CryptError::DerivationFailure(_) => "derivation-failure",
            CryptError::InvalidParameters(_) => "invalid-parameters",
            CryptError::EmptyPassword => "empty-password",
            CryptError::Config(_) => "config",
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        CryptError::MalformedEnvelope(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let all = [
            CryptError::UnknownAlgorithm("x".into()),
            CryptError::IndexOutOfRange { index: 9, count: 4 },
            CryptError::MalformedEnvelope("x".into()),
            CryptError::AuthenticationFailure,
            CryptError::DerivationFailure("x".into()),
            CryptError::InvalidParameters("x".into()),
            CryptError::EmptyPassword,
            CryptError::Config("x".into()),
        ];
        let mut kinds: Vec<_> = all.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), all.len());
    }

    #[test]
    fn test_auth_failure_message_is_generic() {
        let msg = CryptError::AuthenticationFailure.to_string();
        assert!(msg.contains("wrong password or corrupted data"));
    }
}
