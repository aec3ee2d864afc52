use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::ports::ProviderError;

pub fn default_client() -> Client {
    Client::builder()
        .user_agent(concat!("card-recommender/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// POST `body` as JSON and parse the JSON reply, giving up once `deadline` elapses.
pub(crate) async fn post_json<B>(
    client: &Client,
    url: &str,
    body: &B,
    deadline: Duration,
) -> Result<Value, ProviderError>
where
    B: Serialize + ?Sized,
{
    let call = async {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "upstream returned status {}",
                status.as_u16()
            )));
        }

        let text = response.text().await.map_err(transport_error)?;
        serde_json::from_str::<Value>(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("malformed JSON payload: {e}")))
    };

    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(deadline)),
    }
}

/// Accept either a bare array of cards or an object wrapping them under `cards`.
pub(crate) fn decode_cards<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>, ProviderError> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(mut fields) => fields.remove("cards").ok_or_else(|| {
            ProviderError::InvalidResponse("response object has no `cards` field".to_string())
        })?,
        other => {
            return Err(ProviderError::InvalidResponse(format!(
                "expected a list of cards, got {}",
                json_kind(&other)
            )))
        }
    };

    serde_json::from_value(list).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Transport(format!("request timeout: {error}"))
    } else if error.is_connect() {
        ProviderError::Transport(format!("connection failed: {error}"))
    } else {
        ProviderError::Transport(format!("request failed: {error}"))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
