use std::sync::Arc;

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Uri};

use crate::HttpcResult;
use crate::config::{BasicAuth, ConfigStore};
use crate::error::HttpClientError;

/// Runs over the fully-assembled request immediately before
/// transmission, for out-of-band mutation such as trace headers. Hooks
/// run in registration order on every attempt.
pub trait RequestHook: Send + Sync {
    fn on_request(&self, request: &mut Request<Bytes>);
}

impl<F> RequestHook for F
where
    F: Fn(&mut Request<Bytes>) + Send + Sync,
{
    fn on_request(&self, request: &mut Request<Bytes>) {
        self(request)
    }
}

/// Assembles one attempt's request from the target, the raw payload, and
/// the per-method configuration.
///
/// A non-empty form set takes over the body entirely and the payload is
/// ignored. Configured headers are applied after the automatic
/// content-type, so they win. Basic auth and hooks run last.
pub(crate) fn build_request(
    method: &Method,
    target: &str,
    payload: &Bytes,
    config: &ConfigStore,
    hooks: &[Arc<dyn RequestHook>],
) -> HttpcResult<Request<Bytes>> {
    let uri: Uri = target.parse().map_err(|_| HttpClientError::InvalidUri {
        uri: target.to_owned(),
    })?;

    let form_values = config.form_values(method.as_str());
    let (body, auto_content_type) = if form_values.is_empty() {
        let content_type = if !payload.is_empty()
            && matches!(*method, Method::POST | Method::PUT | Method::PATCH)
        {
            Some(HeaderValue::from_static("application/json"))
        } else {
            None
        };
        (payload.clone(), content_type)
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &form_values {
            serializer.append_pair(name, value);
        }
        (
            Bytes::from(serializer.finish()),
            Some(HeaderValue::from_static("application/x-www-form-urlencoded")),
        )
    };

    let mut request = Request::builder()
        .method(method.clone())
        .uri(uri)
        .body(body)
        .map_err(|source| HttpClientError::RequestBuild { source })?;

    if let Some(content_type) = auto_content_type {
        request.headers_mut().insert(CONTENT_TYPE, content_type);
    }

    let configured_headers = config.headers(method.as_str());
    for (name, value) in &configured_headers {
        request.headers_mut().insert(name.clone(), value.clone());
    }

    if let Some(auth) = config.basic_auth(method.as_str()) {
        request
            .headers_mut()
            .insert(AUTHORIZATION, basic_auth_value(&auth)?);
    }

    for hook in hooks {
        hook.on_request(&mut request);
    }

    Ok(request)
}

fn basic_auth_value(auth: &BasicAuth) -> HttpcResult<HeaderValue> {
    use base64::Engine as _;

    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", auth.username(), auth.password()));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|source| {
        HttpClientError::InvalidHeaderValue {
            name: AUTHORIZATION.as_str().to_owned(),
            source,
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}
