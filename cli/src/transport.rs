//! Submission and realtime channels over HTTP and websocket.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use frames::{Envelope, SubmitRequest, SubmitResponse};
use futures_util::StreamExt;
use reqwest::header::RETRY_AFTER;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::CliError;

pub type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// `{base}/Pixel`.
pub fn pixel_url(base_url: &str) -> String {
    format!("{}/Pixel", base_url.trim_end_matches('/'))
}

/// Realtime endpoint derived from the HTTP base URL.
pub fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/hub"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/hub"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

/// POST one placement and map the HTTP outcome.
///
/// Transport failures surface as [`SubmitResponse::Error`] so the engine
/// retracts the speculative entry instead of leaving it in flight.
pub async fn submit(client: &reqwest::Client, base_url: &str, request: &SubmitRequest) -> SubmitResponse {
    match post(client, base_url, request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(%error, "submission failed");
            SubmitResponse::Error {
                message: error.to_string(),
            }
        }
    }
}

async fn post(client: &reqwest::Client, base_url: &str, request: &SubmitRequest) -> Result<SubmitResponse, reqwest::Error> {
    let response = client.post(pixel_url(base_url)).json(request).send().await?;
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let body = response.text().await?;
    Ok(SubmitResponse::from_http(status, retry_after.as_deref(), &body))
}

pub async fn connect(url: &str) -> Result<Socket, CliError> {
    let (stream, _) = connect_async(url)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;
    Ok(stream)
}

/// Wait for the next realtime envelope.
///
/// Undecodable text frames are logged and skipped. With no `timeout` the call
/// waits until the socket closes.
pub async fn recv_next(stream: &mut Socket, timeout: Option<Duration>) -> Result<Envelope, CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
                Message::Text(text) => match frames::decode_envelope(text.as_str()) {
                    Ok(envelope) => return Ok(envelope),
                    Err(error) => debug!(%error, "skipping undecodable message"),
                },
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| CliError::Timeout)?,
        None => fut.await,
    }
}
