//! HTTP send helper for data service requests.
//!
//! Every data service call goes through [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so that timeouts, status
//! codes, and unparseable bodies are mapped to [`ServiceError`] the same
//! way everywhere. There are no retries: a failed request is reported
//! once and the caller decides how to degrade.
//!
//! # Usage
//!
//! ```ignore
//! use crate::http;
//!
//! let body = http::send_json(client.get(&url).query(&[("limit", 2000)])).await?;
//! let rows = http::data_rows(body)?;
//! ```

use serde_json::Value;

use crate::ServiceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends a request and parses the response body as JSON.
///
/// # Errors
///
/// * [`ServiceError::Timeout`] if the client timeout elapsed.
/// * [`ServiceError::Http`] on any other transport failure.
/// * [`ServiceError::Status`] if the status is not 2xx.
/// * [`ServiceError::Payload`] if the body is not valid JSON.
pub async fn send_json(request: reqwest::RequestBuilder) -> Result<Value, ServiceError> {
    let response = request.send().await.map_err(transport_error)?;

    let url = response.url().to_string();
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if !status.is_success() {
        log::warn!("HTTP {status} from {url}");
        return Err(ServiceError::Status {
            status: status.as_u16(),
            url,
        });
    }

    // Read the raw body as text first so it can be logged if it fails to
    // parse.
    let text = response.text().await.map_err(transport_error)?;

    serde_json::from_str(&text).map_err(|json_err| {
        log::warn!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             content-type: {content_type:?}\n  \
             received: {} bytes\n  \
             parse error: {json_err}\n  \
             body preview: {}",
            text.len(),
            preview(&text),
        );
        ServiceError::Payload {
            message: format!(
                "JSON parse failed: {json_err} (received {} bytes, content-type={content_type:?})",
                text.len()
            ),
        }
    })
}

/// Extracts the `data` array from a data service response envelope.
///
/// # Errors
///
/// Returns [`ServiceError::Payload`] if the body is not an object or its
/// `data` field is missing or not an array.
pub fn data_rows(body: Value) -> Result<Vec<Value>, ServiceError> {
    let Value::Object(mut envelope) = body else {
        return Err(ServiceError::Payload {
            message: "response is not a JSON object".to_string(),
        });
    };

    match envelope.remove("data") {
        Some(Value::Array(rows)) => Ok(rows),
        Some(other) => Err(ServiceError::Payload {
            message: format!("`data` is not an array (found {})", kind(&other)),
        }),
        None => Err(ServiceError::Payload {
            message: "response has no `data` field".to_string(),
        }),
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Http(e)
    }
}

/// Returns at most [`BODY_PREVIEW_LEN`] bytes of `text`, cut on a char
/// boundary.
fn preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
