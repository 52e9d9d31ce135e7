//! Identity resolution: credential first, anonymous token as fallback.

use std::{future::Future, sync::Arc};

use crate::{Error, Result, identity::Identity};

/// Verifies bearer credentials. Implemented outside this crate (e.g. by a
/// JWT verifier); the ledger never issues credentials.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the registered user id the credential vouches for.
  fn verify<'a>(
    &'a self,
    credential: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

/// Turns the identity sources on a request into a single [`Identity`].
pub struct IdentityResolver<P> {
  provider: Arc<P>,
}

impl<P> Clone for IdentityResolver<P> {
  fn clone(&self) -> Self { Self { provider: self.provider.clone() } }
}

impl<P: IdentityProvider> IdentityResolver<P> {
  pub fn new(provider: Arc<P>) -> Self { Self { provider } }

  /// Resolve an identity or fail with [`Error::IdentityRequired`].
  pub async fn resolve(
    &self,
    credential: Option<&str>,
    anonymous_token: Option<&str>,
  ) -> Result<Identity> {
    self
      .try_resolve(credential, anonymous_token)
      .await
      .ok_or(Error::IdentityRequired)
  }

  /// Like [`resolve`](Self::resolve), but yields `None` instead of failing.
  ///
  /// A credential that fails verification is logged and ignored so that a
  /// stale login token never blocks anonymous engagement.
  pub async fn try_resolve(
    &self,
    credential: Option<&str>,
    anonymous_token: Option<&str>,
  ) -> Option<Identity> {
    if let Some(credential) = credential.filter(|c| !c.trim().is_empty()) {
      match self.provider.verify(credential).await {
        Ok(user_id) => return Some(Identity::Registered(user_id)),
        Err(e) => {
          tracing::debug!(error = %e, "credential rejected, falling back to anonymous token");
        }
      }
    }

    // Opaque: only a blank token is rejected, the rest is kept verbatim.
    anonymous_token
      .filter(|t| !t.trim().is_empty())
      .map(|t| Identity::Anonymous(t.to_owned()))
  }
}
