//! Admin authentication gate: route classification, session verification
//! against the identity service, and the allow/redirect decision.
pub mod decision;
pub mod identity;
pub mod route;
pub mod session;
pub mod verifier;

pub use decision::{Decision, LoginTarget, decide};
pub use route::{RouteClass, classify, is_excluded};
pub use session::{Identity, ServiceFailure, VerificationOutcome};
pub use verifier::{Verification, verify};
