//! Messaging gateway interface.
//!
//! Delivers a short text (confirmation code, redemption code) to a
//! client's contact handle. Fire-and-forget from the core's perspective:
//! every call site logs a failure and moves on - a code that fails to
//! send can still be relayed manually by an operator, so the state
//! transition that produced it must stand.

use crate::types::{ContactHandle, TenantId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Error reported by the messaging provider
#[derive(Error, Debug, Clone)]
#[error("message delivery failed: {0}")]
pub struct MessagingError(pub String);

/// Messaging gateway trait.
///
/// Implementations must be `Send + Sync`; the engines hold them behind
/// `Arc<dyn MessagingGateway>`.
pub trait MessagingGateway: Send + Sync {
    /// Sends a text message through the tenant's channel
    ///
    /// # Errors
    ///
    /// Returns an error when the provider reports a delivery failure;
    /// callers log and swallow it.
    fn send_text(
        &self,
        tenant_id: TenantId,
        destination: &ContactHandle,
        body: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), MessagingError>> + Send + '_>>;
}
