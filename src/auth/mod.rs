//! Authentication facade for the Study Buddy client.
//!
//! Signs users in through the identity provider and the backend, keeps the
//! bearer token in client storage and mirrors the signed-in state into the
//! header navigation.

mod identity;
mod service;

pub use identity::{Credential, FirebaseIdentity, IdentityProvider, ProviderError};
pub use service::{token_expired, AuthService, AuthState, Claims};
