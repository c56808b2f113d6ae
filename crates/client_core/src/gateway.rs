use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use shared::{
    error::GatewayError,
    protocol::{
        ClearHistoryReply, GeneratedKey, ProcessOutcome, ProcessReply, ProcessRequest, StatsReply,
    },
};

/// Request/response contract with the text-processing collaborator. Every
/// call resolves to a success payload or exactly one `GatewayError`.
#[async_trait]
pub trait ProcessorGateway: Send + Sync {
    async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, GatewayError>;
    async fn generate_key(&self, length: u32, symbols: bool)
        -> Result<GeneratedKey, GatewayError>;
    async fn stats(&self) -> Result<StatsReply, GatewayError>;
    async fn clear_history(&self) -> Result<String, GatewayError>;
}

pub struct MissingGateway;

#[async_trait]
impl ProcessorGateway for MissingGateway {
    async fn process(&self, _request: ProcessRequest) -> Result<ProcessOutcome, GatewayError> {
        Err(GatewayError::Application(
            "processing service is unavailable".to_string(),
        ))
    }

    async fn generate_key(
        &self,
        _length: u32,
        _symbols: bool,
    ) -> Result<GeneratedKey, GatewayError> {
        Err(GatewayError::Application(
            "processing service is unavailable".to_string(),
        ))
    }

    async fn stats(&self) -> Result<StatsReply, GatewayError> {
        Err(GatewayError::Application(
            "processing service is unavailable".to_string(),
        ))
    }

    async fn clear_history(&self) -> Result<String, GatewayError> {
        Err(GatewayError::Application(
            "processing service is unavailable".to_string(),
        ))
    }
}

/// HTTP implementation over the service's JSON endpoints. Deadlines stay
/// with the transport defaults; no extra timeout is layered on top.
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url).map_err(|err| {
            GatewayError::Application(format!("invalid service url '{base_url}': {err}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Application(format!(
                "service url '{base_url}' must use http or https"
            )));
        }
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProcessorGateway for HttpGateway {
    async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, GatewayError> {
        let response = self
            .http
            .post(format!("{}/process", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;
        let reply: ProcessReply = read_reply(response).await?;

        if !reply.success {
            return Err(GatewayError::Application(
                reply
                    .error
                    .unwrap_or_else(|| "Processing failed".to_string()),
            ));
        }
        let result = reply.result.ok_or_else(|| {
            GatewayError::Application("processing reply is missing a result".to_string())
        })?;

        Ok(ProcessOutcome {
            result,
            method: reply.method.unwrap_or(request.method),
            action: reply.action.unwrap_or(request.action),
            input_length: reply.input_length,
            output_length: reply.output_length,
        })
    }

    async fn generate_key(
        &self,
        length: u32,
        symbols: bool,
    ) -> Result<GeneratedKey, GatewayError> {
        let response = self
            .http
            .get(format!("{}/generate-key", self.base_url))
            .query(&[
                ("length", length.to_string()),
                ("symbols", symbols.to_string()),
            ])
            .send()
            .await
            .map_err(classify_send_error)?;
        let key: GeneratedKey = read_reply(response).await?;

        if !key.success {
            return Err(GatewayError::Application(
                key.error
                    .unwrap_or_else(|| "Key generation failed".to_string()),
            ));
        }
        Ok(key)
    }

    async fn stats(&self) -> Result<StatsReply, GatewayError> {
        let response = self
            .http
            .get(format!("{}/stats", self.base_url))
            .send()
            .await
            .map_err(classify_send_error)?;
        read_reply(response).await
    }

    async fn clear_history(&self) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(format!("{}/clear-history", self.base_url))
            .send()
            .await
            .map_err(classify_send_error)?;
        let reply: ClearHistoryReply = read_reply(response).await?;
        Ok(reply.message)
    }
}

/// Errors raised before any response arrived mean the collaborator was
/// never reached.
fn classify_send_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

async fn read_reply<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        };
        return Err(GatewayError::Application(format!(
            "HTTP {}: {detail}",
            status.as_u16()
        )));
    }

    response.json::<T>().await.map_err(|err| {
        GatewayError::Application(format!(
            "unreadable reply from the processing service: {err}"
        ))
    })
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
