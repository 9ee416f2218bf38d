use serde::Serialize;
use uuid::Uuid;

/// Identity confirmed by the identity service for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Why verification could not reach a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    ConfigMissing,
    ConfigInvalid,
    ClientConstruction,
    Timeout,
    Transport,
    MalformedResponse,
    Upstream(u16),
}

impl ServiceFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "config-missing",
            Self::ConfigInvalid => "config-invalid",
            Self::ClientConstruction => "client-construction",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::MalformedResponse => "malformed-response",
            Self::Upstream(_) => "upstream-status",
        }
    }
}

/// Result of one session check. Produced once per admin-protected request
/// and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Authenticated { identity: Identity },
    Unauthenticated,
    ServiceError { reason: ServiceFailure },
}
