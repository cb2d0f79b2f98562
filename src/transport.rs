use async_trait::async_trait;
use http::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::error::TransportError;
use crate::signer;
use crate::types::{OutboundRequest, RawResponse, RequestAuth};

/// The one capability the protocol clients need from HTTP land.
///
/// Implementations receive the request description plus the credentials to
/// attach; for [`RequestAuth::OAuth1`] the transport owns turning the signing
/// parameters into a valid `Authorization` header. Timeouts, retries and
/// cancellation all live on this side of the seam.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(
        &self,
        request: OutboundRequest,
        auth: RequestAuth,
    ) -> Result<RawResponse, TransportError>;
}

/// Bundled [`Transport`] over a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-built client, e.g. to control timeouts or proxies.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(
        &self,
        request: OutboundRequest,
        auth: RequestAuth,
    ) -> Result<RawResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(TransportError::new)?;
        let mut builder = self.http.request(request.method.clone(), url.clone());
        builder = apply_headers(builder, &request.headers)?;
        builder = match auth {
            RequestAuth::None => builder,
            RequestAuth::Bearer(token) => builder.bearer_auth(token),
            RequestAuth::OAuth1(params) => {
                let header = signer::authorization_header(
                    &request.method,
                    &url,
                    request.form.as_deref(),
                    &params,
                )?;
                builder.header(AUTHORIZATION, header)
            }
        };
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn apply_headers(
    mut builder: RequestBuilder,
    headers: &[(String, String)],
) -> Result<RequestBuilder, TransportError> {
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::new(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::new(format!("invalid header value for {name}")))?;
        builder = builder.header(name, value);
    }
    Ok(builder)
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::error::TransportError;
    use crate::types::{OutboundRequest, RawResponse, RequestAuth};

    use super::Transport;

    /// Records every request it sees and answers from a canned queue.
    #[derive(Clone, Default)]
    pub(crate) struct StubTransport {
        inner: Arc<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        responses: Mutex<VecDeque<RawResponse>>,
        calls: Mutex<Vec<(OutboundRequest, RequestAuth)>>,
    }

    impl StubTransport {
        pub(crate) fn replying(responses: Vec<RawResponse>) -> Self {
            let stub = Self::default();
            *stub.inner.responses.lock().unwrap() = responses.into();
            stub
        }

        pub(crate) fn ok(body: &str) -> Self {
            Self::replying(vec![response(200, body)])
        }

        pub(crate) fn calls(&self) -> Vec<(OutboundRequest, RequestAuth)> {
            self.inner.calls.lock().unwrap().clone()
        }
    }

    pub(crate) fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn perform(
            &self,
            request: OutboundRequest,
            auth: RequestAuth,
        ) -> Result<RawResponse, TransportError> {
            self.inner.calls.lock().unwrap().push((request, auth));
            self.inner
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::new("no stubbed response left"))
        }
    }
}
