mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, anyhow};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Builds a request, serializing `body` as JSON when present.
pub fn json_request<B: Serialize + ?Sized>(
    method: Method,
    url: reqwest::Url,
    body: Option<&B>,
) -> Result<Request> {
    let mut req = Request::new(method, url);
    if let Some(body) = body {
        let bytes = serde_json::to_vec(body)?;
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(bytes.into());
    }
    Ok(req)
}

/// Executes `req` and decodes a JSON response.
///
/// # Errors
///
/// Transport failures, non-success status codes (with the response body in
/// the message) and undecodable bodies.
pub async fn execute_json<C: HttpClient + ?Sized, T: DeserializeOwned>(
    client: &C,
    req: Request,
) -> Result<T> {
    let url = req.url().clone();
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{url} returned status {status}: {body}"));
    }

    resp.json()
        .await
        .with_context(|| format!("failed to decode response from {url}"))
}

/// Executes `req` and only checks the status code.
pub async fn execute_empty<C: HttpClient + ?Sized>(client: &C, req: Request) -> Result<()> {
    let url = req.url().clone();
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{url} returned status {status}: {body}"));
    }
    Ok(())
}
