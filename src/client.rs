use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderMap, Method, Request};
use tracing::{debug, info_span, warn};

use crate::HttpcResult;
use crate::config::{BasicAuth, ConfigStore};
use crate::context::{CancelReason, CancelToken, SystemWaiter, Waiter};
use crate::error::HttpClientError;
use crate::request::{RequestHook, build_request};
use crate::response::HttpResponse;
use crate::retry::RetryPolicy;
use crate::transport::{
    classify_transport_error, drain_body, is_timeout_error, make_agent, read_body,
};
use crate::util::{redact_target, truncate_body};

const DEFAULT_CLIENT_NAME: &str = "httpc";

pub struct HttpClientBuilder {
    retry_policy: RetryPolicy,
    hooks: Vec<Arc<dyn RequestHook>>,
    waiter: Arc<dyn Waiter>,
    client_name: String,
}

impl HttpClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            retry_policy: RetryPolicy::standard(),
            hooks: Vec::new(),
            waiter: Arc::new(SystemWaiter),
            client_name: DEFAULT_CLIENT_NAME.to_owned(),
        }
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn request_hook_arc(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn request_hook<H>(self, hook: H) -> Self
    where
        H: RequestHook + 'static,
    {
        self.request_hook_arc(Arc::new(hook))
    }

    pub fn waiter_arc(mut self, waiter: Arc<dyn Waiter>) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn waiter<W>(self, waiter: W) -> Self
    where
        W: Waiter + 'static,
    {
        self.waiter_arc(Arc::new(waiter))
    }

    pub fn client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    pub fn build(self) -> HttpClient {
        let agent = make_agent(&self.client_name);
        HttpClient {
            config: ConfigStore::new(),
            retry_policy: self.retry_policy,
            hooks: self.hooks,
            waiter: self.waiter,
            client_name: self.client_name,
            agent,
        }
    }
}

/// A blocking HTTP client that applies per-method default headers, form
/// fields, and basic-auth credentials to every request it sends, and
/// retries failed attempts according to its [`RetryPolicy`].
///
/// The client is safe to share across threads; configuration changes are
/// visible to every request built after the change returns.
pub struct HttpClient {
    config: ConfigStore,
    retry_policy: RetryPolicy,
    hooks: Vec<Arc<dyn RequestHook>>,
    waiter: Arc<dyn Waiter>,
    client_name: String,
    agent: ureq::Agent,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn set_header(&self, method: &str, name: &str, value: &str) -> HttpcResult<()> {
        self.config.set_header(method, name, value)
    }

    pub fn delete_header(&self, method: &str, name: &str) {
        self.config.delete_header(method, name)
    }

    pub fn headers(&self, method: &str) -> HeaderMap {
        self.config.headers(method)
    }

    /// Convenience for the common case of defaulting PATCH headers.
    pub fn set_patch_header(&self, name: &str, value: &str) -> HttpcResult<()> {
        self.config.set_header(Method::PATCH.as_str(), name, value)
    }

    pub fn set_form_value(&self, method: &str, name: &str, value: &str) {
        self.config.set_form_value(method, name, value)
    }

    pub fn delete_form_value(&self, method: &str, name: &str) {
        self.config.delete_form_value(method, name)
    }

    pub fn form_values(&self, method: &str) -> BTreeMap<String, String> {
        self.config.form_values(method)
    }

    pub fn set_basic_auth(&self, method: &str, username: &str, password: &str) {
        self.config.set_basic_auth(method, username, password)
    }

    pub fn basic_auth(&self, method: &str) -> Option<BasicAuth> {
        self.config.basic_auth(method)
    }

    pub fn get(&self, target: &str) -> HttpcResult<HttpResponse> {
        self.get_with_context(&CancelToken::new(), target)
    }

    pub fn get_with_context(
        &self,
        context: &CancelToken,
        target: &str,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::GET, target, Bytes::new(), true)
    }

    pub fn post(&self, target: &str, payload: impl Into<Bytes>) -> HttpcResult<HttpResponse> {
        self.post_with_context(&CancelToken::new(), target, payload)
    }

    pub fn post_with_context(
        &self,
        context: &CancelToken,
        target: &str,
        payload: impl Into<Bytes>,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::POST, target, payload.into(), true)
    }

    pub fn put(&self, target: &str, payload: impl Into<Bytes>) -> HttpcResult<HttpResponse> {
        self.put_with_context(&CancelToken::new(), target, payload)
    }

    pub fn put_with_context(
        &self,
        context: &CancelToken,
        target: &str,
        payload: impl Into<Bytes>,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::PUT, target, payload.into(), true)
    }

    pub fn patch(&self, target: &str, payload: impl Into<Bytes>) -> HttpcResult<HttpResponse> {
        self.patch_with_context(&CancelToken::new(), target, payload)
    }

    pub fn patch_with_context(
        &self,
        context: &CancelToken,
        target: &str,
        payload: impl Into<Bytes>,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::PATCH, target, payload.into(), true)
    }

    pub fn delete(&self, target: &str, payload: impl Into<Bytes>) -> HttpcResult<HttpResponse> {
        self.delete_with_context(&CancelToken::new(), target, payload)
    }

    pub fn delete_with_context(
        &self,
        context: &CancelToken,
        target: &str,
        payload: impl Into<Bytes>,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::DELETE, target, payload.into(), true)
    }

    /// HEAD never reads a response body; the returned response carries
    /// status and headers with an empty body.
    pub fn head(&self, target: &str) -> HttpcResult<HttpResponse> {
        self.head_with_context(&CancelToken::new(), target)
    }

    pub fn head_with_context(
        &self,
        context: &CancelToken,
        target: &str,
    ) -> HttpcResult<HttpResponse> {
        self.execute(context, Method::HEAD, target, Bytes::new(), false)
    }

    fn execute(
        &self,
        context: &CancelToken,
        method: Method,
        target: &str,
        payload: Bytes,
        read_response_body: bool,
    ) -> HttpcResult<HttpResponse> {
        let attempts = self.retry_policy.attempts_allowed(&method);
        let redacted_uri = redact_target(target);

        for attempt in 1..=attempts {
            if let Some(reason) = context.check() {
                return Err(interruption_error(reason, &method, &redacted_uri));
            }

            let request = build_request(&method, target, &payload, &self.config, &self.hooks)?;
            let span = info_span!(
                "httpc.request",
                client = %self.client_name,
                method = %method,
                uri = %redacted_uri,
                attempt = attempt,
                max_attempts = attempts
            );
            let _enter = span.enter();

            debug!("sending request");
            let mut response = match self.run_once(context, request, &redacted_uri) {
                Ok(response) => response,
                Err(error) => {
                    if attempt < attempts && self.retry_policy.should_retry_error(&error) {
                        warn!(error = %error, "retrying request after transport timeout");
                        if let Some(reason) = self
                            .waiter
                            .wait(self.retry_policy.retry_wait_value(), context)
                        {
                            return Err(interruption_error(reason, &method, &redacted_uri));
                        }
                        continue;
                    }
                    return Err(error);
                }
            };

            let status = response.status();
            if status.as_u16() >= 400 {
                if attempt < attempts && self.retry_policy.should_retry_status(status) {
                    drain_body(&mut response);
                    warn!(status = status.as_u16(), "retrying request after http status");
                    if let Some(reason) = self
                        .waiter
                        .wait(self.retry_policy.retry_wait_value(), context)
                    {
                        return Err(interruption_error(reason, &method, &redacted_uri));
                    }
                    continue;
                }
                let body = read_body(&mut response).unwrap_or_default();
                return Err(HttpClientError::HttpStatus {
                    status: status.as_u16(),
                    method,
                    uri: redacted_uri,
                    body: truncate_body(&body),
                });
            }

            let headers = response.headers().clone();
            if !read_response_body {
                return Ok(HttpResponse::new(status, headers, Bytes::new()));
            }
            let body = read_body(&mut response)
                .map_err(|source| HttpClientError::ReadBody {
                    source: Box::new(source),
                })?;
            return Ok(HttpResponse::new(status, headers, body));
        }

        Err(HttpClientError::RetriesExhausted {
            attempts,
            method,
            uri: redacted_uri,
        })
    }

    fn run_once(
        &self,
        context: &CancelToken,
        request: Request<Bytes>,
        redacted_uri: &str,
    ) -> HttpcResult<ureq::http::Response<ureq::Body>> {
        let method = request.method().clone();

        // The context deadline bounds the whole call; each attempt gets
        // whatever time remains.
        let transport_timeout = match context.deadline() {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(HttpClientError::DeadlineExceeded {
                        method,
                        uri: redacted_uri.to_owned(),
                    });
                }
                Some(remaining)
            }
            None => None,
        };

        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, body.to_vec());
        let configured_request = match transport_timeout {
            Some(timeout) => self
                .agent
                .configure_request(request)
                .timeout_global(Some(timeout))
                .build(),
            None => self.agent.configure_request(request).build(),
        };

        self.agent.run(configured_request).map_err(|source| {
            if is_timeout_error(&source) {
                if context.deadline_expired() {
                    return HttpClientError::DeadlineExceeded {
                        method,
                        uri: redacted_uri.to_owned(),
                    };
                }
                HttpClientError::Timeout {
                    timeout_ms: transport_timeout
                        .map(|timeout| timeout.as_millis())
                        .unwrap_or(0),
                    method,
                    uri: redacted_uri.to_owned(),
                }
            } else {
                HttpClientError::Transport {
                    kind: classify_transport_error(&source),
                    method,
                    uri: redacted_uri.to_owned(),
                    source: Box::new(source),
                }
            }
        })
    }
}

fn interruption_error(reason: CancelReason, method: &Method, uri: &str) -> HttpClientError {
    match reason {
        CancelReason::Cancelled => HttpClientError::Cancelled {
            method: method.clone(),
            uri: uri.to_owned(),
        },
        CancelReason::DeadlineExceeded => HttpClientError::DeadlineExceeded {
            method: method.clone(),
            uri: uri.to_owned(),
        },
    }
}
