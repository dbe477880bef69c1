//! Pipeline outcome.

use super::error::GateError;

/// Result of running a request through every guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Admit { normalized_command: String },
    Deny { http_status: u16, reason: String },
}

impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

impl From<GateError> for Decision {
    fn from(err: GateError) -> Self {
        Decision::Deny {
            http_status: err.status().as_u16(),
            reason: err.to_string(),
        }
    }
}

impl From<Result<String, GateError>> for Decision {
    fn from(result: Result<String, GateError>) -> Self {
        match result {
            Ok(normalized_command) => Decision::Admit { normalized_command },
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error() {
        let decision = Decision::from(GateError::BadSignature);
        assert_eq!(
            decision,
            Decision::Deny {
                http_status: 401,
                reason: "Bad signature".into()
            }
        );
        assert!(!decision.is_admit());
    }

    #[test]
    fn test_from_ok() {
        let decision = Decision::from(Ok::<_, GateError>("kick 5".to_string()));
        assert!(decision.is_admit());
    }
}
