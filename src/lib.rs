//! Client-side OAuth 1.0a and OAuth 2.0 authorization-code flows.
//!
//! Both clients walk the multi-step handshake against a provider and then
//! sign (OAuth1) or bearer-authenticate (OAuth2) later API calls with the
//! obtained credentials. HTTP delivery goes through the [`Transport`] trait
//! so every protocol step stays testable against a stub; [`HttpTransport`]
//! is the bundled reqwest-backed implementation.

mod body;
mod error;
mod oauth1;
mod oauth2;
mod signer;
mod transport;
mod types;

pub use error::{OAuthError, TransportError};
pub use oauth1::{AccessTokenOptions, OAuth1Client, OAuth1Config};
pub use oauth2::{AuthorizeOptions, BearerCredentials, OAuth2Client, OAuth2Config};
pub use signer::SigningParams;
pub use transport::{HttpTransport, Transport};
pub use types::{OutboundRequest, RawResponse, RequestAuth, TokenExchange};
