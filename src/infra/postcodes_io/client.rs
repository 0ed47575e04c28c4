use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;

use charity_insights::fetch::{HttpClient, execute_json, json_request};
use charity_insights::services::PostcodeLookup;

#[derive(Deserialize)]
struct LookupResponse {
    result: Option<LookupResult>,
}

#[derive(Deserialize)]
struct LookupResult {
    admin_district: Option<String>,
}

/// Local authority lookup against the postcodes.io API.
pub struct PostcodesIoClient<C> {
    http: C,
    base_url: Url,
}

impl<C: HttpClient> PostcodesIoClient<C> {
    pub fn new(http: C, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    /// `{base}/postcodes/{postcode}` with the postcode percent-encoded.
    fn lookup_url(&self, postcode: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("postcode API URL cannot have a path: {}", self.base_url))?
            .pop_if_empty()
            .push("postcodes")
            .push(postcode.trim());
        Ok(url)
    }
}

fn admin_district(response: LookupResponse) -> Result<String> {
    response
        .result
        .and_then(|r| r.admin_district)
        .ok_or_else(|| anyhow!("no admin district in postcode lookup result"))
}

#[async_trait]
impl<C: HttpClient> PostcodeLookup for PostcodesIoClient<C> {
    async fn local_authority(&self, postcode: &str) -> Result<String> {
        let req = json_request::<()>(Method::GET, self.lookup_url(postcode)?, None)?;
        let response: LookupResponse = execute_json(&self.http, req).await?;
        admin_district(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charity_insights::fetch::BasicClient;
    use std::time::Duration;

    fn client(base: &str) -> PostcodesIoClient<BasicClient> {
        PostcodesIoClient::new(BasicClient::new(Duration::from_secs(1)).unwrap(), base).unwrap()
    }

    #[test]
    fn test_lookup_url_encodes_postcode() {
        let url = client("https://api.postcodes.io").lookup_url(" LS1 1UR ").unwrap();
        assert_eq!(url.as_str(), "https://api.postcodes.io/postcodes/LS1%201UR");
    }

    #[test]
    fn test_lookup_url_with_trailing_slash() {
        let url = client("http://localhost:8000/").lookup_url("YO1 7HH").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/postcodes/YO1%207HH");
    }

    #[test]
    fn test_admin_district_extraction() {
        let ok: LookupResponse =
            serde_json::from_str(r#"{"status":200,"result":{"admin_district":"Leeds"}}"#).unwrap();
        assert_eq!(admin_district(ok).unwrap(), "Leeds");

        let missing: LookupResponse =
            serde_json::from_str(r#"{"status":200,"result":null}"#).unwrap();
        assert!(admin_district(missing).is_err());

        let null_district: LookupResponse =
            serde_json::from_str(r#"{"result":{"admin_district":null}}"#).unwrap();
        assert!(admin_district(null_district).is_err());
    }
}
