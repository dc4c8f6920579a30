//! Identity resolution hook.
//!
//! Parlor doesn't own user accounts. The handshake line a client sends is
//! an opaque identity; the [`NameResolver`] the server was constructed
//! with turns it into the display name used everywhere else (wire
//! messages, logs, match records). A deployment backs this with its
//! account system; tests and bare setups use [`EchoNames`].

use std::future::Future;

/// Resolves a connection's claimed identity to a display name.
///
/// `Send + Sync + 'static` because the resolver is shared by every
/// connection task for the life of the server.
pub trait NameResolver: Send + Sync + 'static {
    /// Returns the display name for the given identity.
    ///
    /// Called once per connection, right after the handshake line
    /// arrives. Resolution cannot fail — an unknown identity should
    /// resolve to something printable (e.g. the identity itself).
    fn display_name(
        &self,
        identity: &str,
    ) -> impl Future<Output = String> + Send;
}

/// A [`NameResolver`] that uses the handshake line itself as the name.
pub struct EchoNames;

impl NameResolver for EchoNames {
    async fn display_name(&self, identity: &str) -> String {
        identity.to_string()
    }
}
