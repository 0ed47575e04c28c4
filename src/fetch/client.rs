use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::Arc;

/// Transport seam for every outbound call. Auth wrappers such as
/// [`ApiKey`](crate::fetch::auth::ApiKey) implement it by decorating an
/// inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
