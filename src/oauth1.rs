use http::Method;
use tracing::debug;
use url::Url;

use crate::body::{body_str, parse_body};
use crate::error::OAuthError;
use crate::signer::SigningParams;
use crate::transport::{HttpTransport, Transport};
use crate::types::{OutboundRequest, RawResponse, RequestAuth, TokenExchange};

const OAUTH_TOKEN_KEY: &str = "oauth_token";
const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Static provider configuration for the OAuth 1.0a three-legged flow.
#[derive(Debug, Clone)]
pub struct OAuth1Config {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback: Option<String>,
    pub request_token_url: String,
    pub request_token_method: Method,
    pub authorize_url: String,
    pub access_token_url: String,
    pub access_token_method: Method,
    pub account_info_url: Option<String>,
    pub account_info_method: Method,
    pub token: Option<String>,
    pub token_secret: Option<String>,
    pub transport_method: Option<String>,
    pub signature_method: Option<String>,
    pub body_hash: Option<bool>,
}

impl OAuth1Config {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        request_token_url: impl Into<String>,
        authorize_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            callback: None,
            request_token_url: request_token_url.into(),
            request_token_method: Method::GET,
            authorize_url: authorize_url.into(),
            access_token_url: access_token_url.into(),
            access_token_method: Method::GET,
            account_info_url: None,
            account_info_method: Method::GET,
            token: None,
            token_secret: None,
            transport_method: None,
            signature_method: None,
            body_hash: None,
        }
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn with_request_token_method(mut self, method: Method) -> Self {
        self.request_token_method = method;
        self
    }

    pub fn with_access_token_method(mut self, method: Method) -> Self {
        self.access_token_method = method;
        self
    }

    pub fn with_account_info_url(mut self, url: impl Into<String>) -> Self {
        self.account_info_url = Some(url.into());
        self
    }

    pub fn with_account_info_method(mut self, method: Method) -> Self {
        self.account_info_method = method;
        self
    }

    /// Seed a previously captured token/secret pair for reuse.
    pub fn with_token(
        mut self,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(token_secret.into());
        self
    }

    pub fn with_transport_method(mut self, transport_method: impl Into<String>) -> Self {
        self.transport_method = Some(transport_method.into());
        self
    }

    pub fn with_signature_method(mut self, signature_method: impl Into<String>) -> Self {
        self.signature_method = Some(signature_method.into());
        self
    }

    pub fn with_body_hash(mut self, body_hash: bool) -> Self {
        self.body_hash = Some(body_hash);
        self
    }
}

/// Optional inputs to [`OAuth1Client::exchange_token`], usually lifted from
/// the query of the provider callback.
#[derive(Debug, Clone, Default)]
pub struct AccessTokenOptions {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
}

impl AccessTokenOptions {
    pub fn with_token(mut self, oauth_token: impl Into<String>) -> Self {
        self.oauth_token = Some(oauth_token.into());
        self
    }

    pub fn with_verifier(mut self, oauth_verifier: impl Into<String>) -> Self {
        self.oauth_verifier = Some(oauth_verifier.into());
        self
    }
}

/// Drives the OAuth 1.0a handshake and signs subsequent requests.
///
/// The credential set lives inside the client and is rewritten only at the
/// end of [`request_token`](Self::request_token) and
/// [`exchange_token`](Self::exchange_token); both take `&mut self`, so two
/// overlapping handshakes on one instance are a borrow error rather than a
/// race.
#[derive(Debug, Clone)]
pub struct OAuth1Client<T = HttpTransport> {
    config: OAuth1Config,
    credentials: SigningParams,
    transport: T,
}

impl OAuth1Client<HttpTransport> {
    pub fn new(config: OAuth1Config) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> OAuth1Client<T> {
    pub fn with_transport(config: OAuth1Config, transport: T) -> Self {
        let credentials = SigningParams {
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            callback: config.callback.clone(),
            token: config.token.clone(),
            token_secret: config.token_secret.clone(),
            verifier: None,
            transport_method: config.transport_method.clone(),
            signature_method: config.signature_method.clone(),
            body_hash: config.body_hash,
        };
        Self {
            config,
            credentials,
            transport,
        }
    }

    pub fn config(&self) -> &OAuth1Config {
        &self.config
    }

    /// The live signing set; token and token_secret fill in as the handshake
    /// progresses.
    pub fn credentials(&self) -> &SigningParams {
        &self.credentials
    }

    /// Obtain a temporary request token from the provider.
    ///
    /// Any token/secret already held is dropped first so the call is signed
    /// with consumer credentials only.
    pub async fn request_token(&mut self) -> Result<TokenExchange, OAuthError> {
        self.credentials.token = None;
        self.credentials.token_secret = None;

        debug!(url = %self.config.request_token_url, "requesting temporary credentials");
        let request = OutboundRequest::new(
            self.config.request_token_method.clone(),
            &self.config.request_token_url,
        );
        let response = self.perform(request).await?;
        if response.status != 200 {
            return Err(OAuthError::HttpStatus { response });
        }

        let body = parse_body(&response.body);
        self.credentials.token = body_str(&body, OAUTH_TOKEN_KEY);
        self.credentials.token_secret = body_str(&body, OAUTH_TOKEN_SECRET_KEY);
        Ok(TokenExchange { response, body })
    }

    /// Obtain a fresh request token and build the URL the user must visit to
    /// authorize it. Any query already on the configured `authorize_url` is
    /// discarded.
    pub async fn authorize_url(&mut self) -> Result<String, OAuthError> {
        self.request_token().await?;

        let mut url = Url::parse(&self.config.authorize_url)?;
        url.set_query(None);
        let token = self.credentials.token.clone().unwrap_or_default();
        url.query_pairs_mut().append_pair(OAUTH_TOKEN_KEY, &token);
        Ok(url.to_string())
    }

    /// Trade the authorized request token (plus verifier) for the long-lived
    /// access token/secret pair.
    pub async fn exchange_token(
        &mut self,
        options: AccessTokenOptions,
    ) -> Result<TokenExchange, OAuthError> {
        if let Some(token) = options.oauth_token {
            self.credentials.token = Some(token);
        }
        if let Some(verifier) = options.oauth_verifier {
            self.credentials.verifier = Some(verifier);
        }

        debug!(url = %self.config.access_token_url, "exchanging request token for access token");
        let request = OutboundRequest::new(
            self.config.access_token_method.clone(),
            &self.config.access_token_url,
        );
        let response = self.perform(request).await?;
        if response.status != 200 {
            return Err(OAuthError::HttpStatus { response });
        }

        let body = parse_body(&response.body);
        self.credentials.token = body_str(&body, OAUTH_TOKEN_KEY);
        self.credentials.token_secret = body_str(&body, OAUTH_TOKEN_SECRET_KEY);
        Ok(TokenExchange { response, body })
    }

    /// Fetch the configured account/profile endpoint. The response comes back
    /// uninterpreted, whatever its status.
    pub async fn account_info(&self) -> Result<RawResponse, OAuthError> {
        let url = self
            .config
            .account_info_url
            .as_ref()
            .ok_or(OAuthError::MissingAccountInfoUrl)?;
        let request = OutboundRequest::new(self.config.account_info_method.clone(), url);
        self.perform(request).await
    }

    /// Sign an arbitrary request with the current credential set and forward
    /// it, returning the raw result.
    pub async fn request(&self, request: OutboundRequest) -> Result<RawResponse, OAuthError> {
        self.perform(request).await
    }

    async fn perform(&self, request: OutboundRequest) -> Result<RawResponse, OAuthError> {
        let auth = RequestAuth::OAuth1(self.credentials.clone());
        Ok(self.transport.perform(request, auth).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::stub::{StubTransport, response};

    fn config() -> OAuth1Config {
        OAuth1Config::new(
            "ck",
            "cs",
            "https://provider.example/oauth/request_token",
            "https://provider.example/oauth/authorize?old=1",
            "https://provider.example/oauth/access_token",
        )
    }

    fn signing(auth: &RequestAuth) -> &SigningParams {
        match auth {
            RequestAuth::OAuth1(params) => params,
            other => panic!("expected oauth1 signing params, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_token_stores_the_returned_pair() {
        let stub =
            StubTransport::ok("oauth_token=T1&oauth_token_secret=S1&oauth_callback_confirmed=true");
        let mut client = OAuth1Client::with_transport(config(), stub.clone());

        let exchange = client.request_token().await.unwrap();

        assert_eq!(exchange.body["oauth_token"], "T1");
        assert_eq!(client.credentials().token.as_deref(), Some("T1"));
        assert_eq!(client.credentials().token_secret.as_deref(), Some("S1"));

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.method, Method::GET);
        assert_eq!(calls[0].0.url, "https://provider.example/oauth/request_token");
    }

    #[tokio::test]
    async fn request_token_clears_stale_credentials_before_the_call() {
        let stub = StubTransport::ok("oauth_token=T2&oauth_token_secret=S2");
        let seeded = config().with_token("stale", "stale-secret");
        let mut client = OAuth1Client::with_transport(seeded, stub.clone());

        client.request_token().await.unwrap();

        let calls = stub.calls();
        let params = signing(&calls[0].1);
        assert_eq!(params.token, None);
        assert_eq!(params.token_secret, None);
    }

    #[tokio::test]
    async fn request_token_accepts_json_bodies() {
        let stub = StubTransport::ok(r#"{"oauth_token":"J1","oauth_token_secret":"J2"}"#);
        let mut client = OAuth1Client::with_transport(config(), stub);

        client.request_token().await.unwrap();

        assert_eq!(client.credentials().token.as_deref(), Some("J1"));
        assert_eq!(client.credentials().token_secret.as_deref(), Some("J2"));
    }

    #[tokio::test]
    async fn authorize_url_embeds_the_fresh_token_and_drops_the_old_query() {
        let stub = StubTransport::ok("oauth_token=T1&oauth_token_secret=S1");
        let mut client = OAuth1Client::with_transport(config(), stub);

        let url = client.authorize_url().await.unwrap();

        assert_eq!(url, "https://provider.example/oauth/authorize?oauth_token=T1");
    }

    #[tokio::test]
    async fn request_token_failure_carries_the_raw_response() {
        let stub = StubTransport::replying(vec![response(401, "unauthorized")]);
        let mut client = OAuth1Client::with_transport(config(), stub);

        let err = client.request_token().await.unwrap_err();

        match err {
            OAuthError::HttpStatus { response } => {
                assert_eq!(response.status, 401);
                assert_eq!(response.body, "unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.credentials().token, None);
    }

    #[tokio::test]
    async fn exchange_token_applies_overrides_and_stores_the_access_pair() {
        let stub = StubTransport::ok("oauth_token=AT&oauth_token_secret=AS");
        let seeded = config().with_token("RT", "RS");
        let mut client = OAuth1Client::with_transport(seeded, stub.clone());

        let options = AccessTokenOptions::default().with_verifier("V9");
        client.exchange_token(options).await.unwrap();

        let calls = stub.calls();
        let params = signing(&calls[0].1);
        assert_eq!(params.token.as_deref(), Some("RT"));
        assert_eq!(params.token_secret.as_deref(), Some("RS"));
        assert_eq!(params.verifier.as_deref(), Some("V9"));
        assert_eq!(client.credentials().token.as_deref(), Some("AT"));
        assert_eq!(client.credentials().token_secret.as_deref(), Some("AS"));
    }

    #[tokio::test]
    async fn exchange_token_honors_a_caller_supplied_token() {
        let stub = StubTransport::ok("oauth_token=AT&oauth_token_secret=AS");
        let mut client = OAuth1Client::with_transport(config(), stub.clone());

        let options = AccessTokenOptions::default()
            .with_token("callback-token")
            .with_verifier("V1");
        client.exchange_token(options).await.unwrap();

        let calls = stub.calls();
        assert_eq!(
            signing(&calls[0].1).token.as_deref(),
            Some("callback-token")
        );
    }

    #[tokio::test]
    async fn account_info_requires_configuration() {
        let stub = StubTransport::default();
        let client = OAuth1Client::with_transport(config(), stub.clone());

        let err = client.account_info().await.unwrap_err();

        assert!(matches!(err, OAuthError::MissingAccountInfoUrl));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn account_info_returns_the_raw_response_unjudged() {
        let stub = StubTransport::replying(vec![response(503, "try later")]);
        let with_account = config().with_account_info_url("https://provider.example/account");
        let client = OAuth1Client::with_transport(with_account, stub);

        let raw = client.account_info().await.unwrap();

        assert_eq!(raw.status, 503);
        assert_eq!(raw.body, "try later");
    }

    #[tokio::test]
    async fn generic_requests_are_signed_with_current_credentials() {
        let stub = StubTransport::ok("{}");
        let seeded = config().with_token("AT", "AS");
        let client = OAuth1Client::with_transport(seeded, stub.clone());

        let request = OutboundRequest::post("https://provider.example/api/update")
            .with_form(vec![("status".to_string(), "hello".to_string())]);
        client.request(request).await.unwrap();

        let calls = stub.calls();
        let params = signing(&calls[0].1);
        assert_eq!(params.token.as_deref(), Some("AT"));
        assert_eq!(
            calls[0].0.form.as_deref(),
            Some(&[("status".to_string(), "hello".to_string())][..])
        );
    }
}
