use std::borrow::Cow;

use http::Method;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransportError;

const OAUTH_PREFIX: &str = "oauth_";
const HMAC_SHA1: &str = "HMAC-SHA1";
const HEADER_TRANSPORT: &str = "header";

/// The OAuth1 credential set a client hands to its transport.
///
/// Consumer key/secret are always present; token, token_secret and verifier
/// fill in as the handshake progresses. The trailing hints
/// (`transport_method`, `signature_method`, `body_hash`) describe how the
/// transport should transmit and sign the parameters. They are plain data
/// here, interpreted by whatever [`Transport`](crate::Transport) is plugged
/// in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigningParams {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback: Option<String>,
    pub token: Option<String>,
    pub token_secret: Option<String>,
    pub verifier: Option<String>,
    pub transport_method: Option<String>,
    pub signature_method: Option<String>,
    pub body_hash: Option<bool>,
}

/// Build the `Authorization` header for a request signed with `params`.
///
/// When the URL carries a query string the query is the signed payload and
/// the URL is stripped before signing; otherwise the form body is signed.
pub(crate) fn authorization_header(
    method: &Method,
    url: &Url,
    form: Option<&[(String, String)]>,
    params: &SigningParams,
) -> Result<String, TransportError> {
    if let Some(requested) = params.signature_method.as_deref() {
        if !requested.eq_ignore_ascii_case(HMAC_SHA1) {
            return Err(TransportError::new(format!(
                "unsupported oauth_signature_method: {requested}"
            )));
        }
    }
    if let Some(requested) = params.transport_method.as_deref() {
        if !requested.eq_ignore_ascii_case(HEADER_TRANSPORT) {
            return Err(TransportError::new(format!(
                "unsupported oauth transport_method: {requested}"
            )));
        }
    }
    if params.body_hash == Some(true) {
        tracing::warn!("oauth_body_hash requested but not supported, parameter skipped");
    }

    let form_body = match form {
        Some(pairs) => serde_urlencoded::to_string(pairs).map_err(TransportError::new)?,
        None => String::new(),
    };
    let (is_query, base_url, payload) = match url.query() {
        None | Some("") => (false, url.clone(), form_body),
        Some(query) => {
            let mut stripped = url.clone();
            stripped.set_query(None);
            (true, stripped, query.to_string())
        }
    };

    let mut options = Options::new();
    if let Some(callback) = params.callback.as_deref() {
        options.callback(callback);
    }
    if let Some(token) = params.token.as_deref() {
        options.token(token);
    }
    if let Some(verifier) = params.verifier.as_deref() {
        options.verifier(verifier);
    }

    // sort the payload pairs and split where the oauth_* block sorts in
    let parsed_payload: Vec<(Cow<'_, str>, Cow<'_, str>)> =
        url::form_urlencoded::parse(payload.as_bytes()).collect();
    let oauth_marker = vec![(Cow::from(OAUTH_PREFIX), Cow::from(""))];
    let mut sorted_payload = [parsed_payload, oauth_marker].concat();
    sorted_payload.sort();
    let mut divided = sorted_payload.splitn(2, |(key, _)| key == &OAUTH_PREFIX);
    let before_oauth = divided.next().unwrap_or_default();
    let after_oauth = divided.next().unwrap_or_default();

    let mut signer = if is_query {
        OAuthSigner::with_signature_method(
            HmacSha1,
            method.as_str(),
            base_url,
            &params.consumer_secret,
            params.token_secret.as_deref(),
        )
    } else {
        OAuthSigner::form_with_signature_method(
            HmacSha1,
            method.as_str(),
            base_url,
            &params.consumer_secret,
            params.token_secret.as_deref(),
        )
    };

    for (key, value) in before_oauth {
        if !key.starts_with(OAUTH_PREFIX) {
            signer.parameter(key, value);
        }
    }
    let mut signer = signer.oauth_parameters(params.consumer_key.as_str(), &options);
    for (key, value) in after_oauth {
        if !key.starts_with(OAUTH_PREFIX) {
            signer.parameter(key, value);
        }
    }

    Ok(signer.finish().authorization)
}
