use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::body::body_str;
use crate::error::OAuthError;
use crate::transport::{HttpTransport, Transport};
use crate::types::{OutboundRequest, RawResponse, RequestAuth, TokenExchange};

const DEFAULT_RESPONSE_TYPE: &str = "code";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Static provider configuration for the OAuth 2.0 authorization-code flow.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub account_info_url: Option<String>,
    pub account_info_method: Method,
    pub response_type: Option<String>,
}

impl OAuth2Config {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
            authorize_url: authorize_url.into(),
            token_url: token_url.into(),
            account_info_url: None,
            account_info_method: Method::GET,
            response_type: None,
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
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

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }
}

/// Caller inputs to [`OAuth2Client::authorize_url`]. Everything is optional;
/// `params` carries provider-specific extras verbatim.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    pub authorize_url: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
    pub params: Vec<(String, String)>,
}

impl AuthorizeOptions {
    pub fn with_authorize_url(mut self, authorize_url: impl Into<String>) -> Self {
        self.authorize_url = Some(authorize_url.into());
        self
    }

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Bearer credential state captured by a successful code exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BearerCredentials {
    pub token_type: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Drives the OAuth 2.0 authorization-code handshake and attaches the bearer
/// credential to subsequent requests.
#[derive(Debug, Clone)]
pub struct OAuth2Client<T = HttpTransport> {
    config: OAuth2Config,
    credentials: BearerCredentials,
    transport: T,
}

impl OAuth2Client<HttpTransport> {
    pub fn new(config: OAuth2Config) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> OAuth2Client<T> {
    pub fn with_transport(config: OAuth2Config, transport: T) -> Self {
        Self {
            config,
            credentials: BearerCredentials::default(),
            transport,
        }
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn credentials(&self) -> &BearerCredentials {
        &self.credentials
    }

    /// Build the URL the user must visit to authorize access. No network
    /// call happens here.
    ///
    /// Caller extras merge lowest; the registered `client_id` and
    /// `redirect_uri` always win over same-named caller values, and
    /// `response_type` resolves caller option, then config, then `"code"`.
    pub fn authorize_url(&self, options: AuthorizeOptions) -> Result<String, OAuthError> {
        let base = options
            .authorize_url
            .as_deref()
            .unwrap_or(&self.config.authorize_url);
        let mut url = Url::parse(base)?;
        url.set_query(None);

        let mut query = options.params;
        let response_type = options
            .response_type
            .or_else(|| lookup(&query, "response_type"))
            .or_else(|| self.config.response_type.clone())
            .unwrap_or_else(|| DEFAULT_RESPONSE_TYPE.to_string());
        if let Some(scope) = options.scope {
            set_param(&mut query, "scope", scope);
        }
        set_param(&mut query, "client_id", self.config.client_id.clone());
        if let Some(redirect_uri) = &self.config.redirect_uri {
            set_param(&mut query, "redirect_uri", redirect_uri.clone());
        }
        set_param(&mut query, "response_type", response_type);

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// Trade the authorization code for an access token.
    ///
    /// Only the `authorization_code` grant is spoken here. A 200 response
    /// whose JSON body lacks `access_token` is a protocol failure
    /// ([`OAuthError::MissingAccessToken`]), not a success.
    pub async fn exchange_token(
        &mut self,
        code: Option<&str>,
    ) -> Result<TokenExchange, OAuthError> {
        let mut form: Vec<(String, String)> = Vec::new();
        if let Some(code) = code {
            form.push(("code".to_string(), code.to_string()));
        }
        form.push(("grant_type".to_string(), "authorization_code".to_string()));
        form.push(("client_id".to_string(), self.config.client_id.clone()));
        form.push(("client_secret".to_string(), self.config.client_secret.clone()));
        if let Some(redirect_uri) = &self.config.redirect_uri {
            form.push(("redirect_uri".to_string(), redirect_uri.clone()));
        }

        debug!(url = %self.config.token_url, "exchanging authorization code");
        let request = OutboundRequest::post(&self.config.token_url).with_form(form);
        let response = self.transport.perform(request, RequestAuth::None).await?;
        if response.status != 200 {
            return Err(OAuthError::HttpStatus { response });
        }

        // token endpoints speak JSON only, no form-encoded fallback here
        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(err) => {
                return Err(OAuthError::InvalidResponse {
                    message: err.to_string(),
                    response,
                });
            }
        };
        let access_token = body_str(&body, "access_token");
        let Some(access_token) = access_token else {
            return Err(OAuthError::MissingAccessToken { response, body });
        };

        self.credentials.access_token = Some(access_token);
        self.credentials.token_type =
            Some(body_str(&body, "token_type").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()));
        if let Some(refresh_token) = body_str(&body, "refresh_token") {
            self.credentials.refresh_token = Some(refresh_token);
        }
        Ok(TokenExchange { response, body })
    }

    /// Fetch the configured account/profile endpoint, bearer-authenticated
    /// when a token is held. The response comes back uninterpreted.
    pub async fn account_info(&self) -> Result<RawResponse, OAuthError> {
        let url = self
            .config
            .account_info_url
            .as_ref()
            .ok_or(OAuthError::MissingAccountInfoUrl)?;
        let request = OutboundRequest::new(self.config.account_info_method.clone(), url);
        Ok(self.transport.perform(request, self.auth()).await?)
    }

    /// Forward an arbitrary request, bearer-authenticated when a token is
    /// held, returning the raw result.
    pub async fn request(&self, request: OutboundRequest) -> Result<RawResponse, OAuthError> {
        Ok(self.transport.perform(request, self.auth()).await?)
    }

    fn auth(&self) -> RequestAuth {
        match &self.credentials.access_token {
            Some(token) => RequestAuth::Bearer(token.clone()),
            None => RequestAuth::None,
        }
    }
}

fn set_param(params: &mut Vec<(String, String)>, key: &str, value: String) {
    if let Some((_, existing)) = params.iter_mut().find(|(param, _)| param == key) {
        *existing = value;
    } else {
        params.push((key.to_string(), value));
    }
}

fn lookup(params: &[(String, String)], key: &str) -> Option<String> {
    params
        .iter()
        .find(|(param, _)| param == key)
        .map(|(_, value)| value.clone())
}
