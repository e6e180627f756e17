use log::{debug, error, warn};
use num_bigint::BigInt;
use reqwest::RequestBuilder;
use serde_json::{Value, value::RawValue};

use crate::{error::FetchError, helpers::amount::parse_atomic_integer};

/// Send the request and return the body of a 2xx response.
///
/// `endpoint` is what gets logged; callers pass it without query strings so
/// api keys stay out of the logs.
pub(crate) async fn fetch_text(request: RequestBuilder, endpoint: &str) -> Result<String, FetchError> {
    debug!("🌐 Requesting {}", endpoint);

    let response = request.send().await.map_err(|e| FetchError::Transport {
        endpoint: endpoint.to_string(),
        source: e.without_url(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            endpoint: endpoint.to_string(),
            status,
        });
    }

    response.text().await.map_err(|e| FetchError::Transport {
        endpoint: endpoint.to_string(),
        source: e.without_url(),
    })
}

/// Fetch and parse, turning every failure into a logged `None`.
pub(crate) async fn fetch_parsed<T, F>(request: RequestBuilder, endpoint: &str, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Result<T, FetchError>,
{
    let body = match fetch_text(request, endpoint).await {
        Ok(body) => body,
        Err(e) => {
            warn!("⚠️ Failed to fetch {}: {}", endpoint, e);
            return None;
        }
    };

    match parse(&body) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("❌ Failed to parse response of {}: {}", endpoint, e);
            error!("❌ Raw response body: {}", body);
            None
        }
    }
}

/// Integer amount that explorers send either as a JSON number or as a
/// numeric string. Fractional numbers are rejected.
pub(crate) fn json_integer(value: &Value) -> Result<BigInt, FetchError> {
    match value {
        Value::Number(number) => {
            if let Some(v) = number.as_i64() {
                Ok(BigInt::from(v))
            } else if let Some(v) = number.as_u64() {
                Ok(BigInt::from(v))
            } else {
                Err(FetchError::NotANumber(number.to_string()))
            }
        }
        Value::String(text) => {
            parse_atomic_integer(text).ok_or_else(|| FetchError::NotANumber(text.clone()))
        }
        other => Err(FetchError::NotANumber(other.to_string())),
    }
}

/// Decimal amount sent as a string or a JSON number, returned as the exact
/// text the explorer wrote. Taking the raw token keeps numbers like
/// `0.1000000000000000055511` from passing through `f64`.
pub(crate) fn raw_decimal_text(raw: &RawValue) -> Result<String, FetchError> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        return Ok(serde_json::from_str::<String>(text)?);
    }
    if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
        return Ok(text.to_string());
    }
    Err(FetchError::NotANumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_integer_accepts_numbers_and_strings() {
        assert_eq!(json_integer(&json!(42)).unwrap(), BigInt::from(42));
        assert_eq!(
            json_integer(&json!("1000000000000000000000")).unwrap(),
            "1000000000000000000000".parse::<BigInt>().unwrap()
        );
        assert!(json_integer(&json!(1.5)).is_err());
        assert!(json_integer(&json!("abc")).is_err());
        assert!(json_integer(&json!(null)).is_err());
    }

    #[test]
    fn test_raw_decimal_text_keeps_every_digit() {
        let raw = |text: &str| serde_json::from_str::<Box<RawValue>>(text).unwrap();
        assert_eq!(
            raw_decimal_text(&raw("12345678.123456789012345678")).unwrap(),
            "12345678.123456789012345678"
        );
        assert_eq!(raw_decimal_text(&raw(r#""20.5""#)).unwrap(), "20.5");
        assert_eq!(raw_decimal_text(&raw("-1e-8")).unwrap(), "-1e-8");
        assert!(raw_decimal_text(&raw("null")).is_err());
        assert!(raw_decimal_text(&raw(r#"{"value":1}"#)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_parsed_maps_failures_to_none() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("12")
            .create_async()
            .await;
        let failing = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let parse = |body: &str| parse_atomic_integer(body).ok_or(FetchError::NotANumber(body.to_string()));

        let value = fetch_parsed(client.get(format!("{}/ok", server.url())), "/ok", parse).await;
        assert_eq!(value, Some(BigInt::from(12)));

        let value = fetch_parsed(client.get(format!("{}/down", server.url())), "/down", parse).await;
        assert_eq!(value, None);

        ok.assert_async().await;
        failing.assert_async().await;
    }
}
