use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use charity_insights::contribute::ContributionRow;
use charity_insights::fetch::auth::ApiKey;
use charity_insights::fetch::{HttpClient, execute_empty, execute_json, json_request};
use charity_insights::records::RawRow;
use charity_insights::services::ContributionStore;

const ORGANISATIONS: &str = "organisations";
const MAIN_DATA: &str = "main_data";
const MAIN_DATA_COLUMNS: &str =
    "activity,number_of_people,type_of_insight,age_range,date,local_authority,location,postcode";

#[derive(Deserialize)]
struct IdRow {
    id: i64,
}

/// PostgREST client for the shared Supabase tables.
pub struct SupabaseClient<C> {
    http: ApiKey<ApiKey<C>>,
    rest_url: Url,
}

impl<C: HttpClient> SupabaseClient<C> {
    /// Wraps `http` so every request carries the `apikey` and bearer
    /// `Authorization` headers Supabase expects.
    pub fn new(http: C, project_url: &str, key: &str) -> Result<Self> {
        let base = Url::parse(&format!("{}/", project_url.trim_end_matches('/')))?;
        Ok(Self {
            http: ApiKey::bearer(ApiKey::new(http, "apikey", key)?, key)?,
            rest_url: base.join("rest/v1/")?,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.rest_url.join(table)?)
    }

    fn organisation_query(&self, name: &str) -> Result<Url> {
        let mut url = self.table_url(ORGANISATIONS)?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("name", &format!("eq.{name}"));
        Ok(url)
    }

    fn main_data_query(&self) -> Result<Url> {
        let mut url = self.table_url(MAIN_DATA)?;
        url.query_pairs_mut().append_pair("select", MAIN_DATA_COLUMNS);
        Ok(url)
    }
}

fn prefer(req: &mut reqwest::Request, value: &'static str) {
    req.headers_mut().insert(
        HeaderName::from_static("prefer"),
        HeaderValue::from_static(value),
    );
}

/// Converts one JSON object from the backend into a [`RawRow`]. Nulls are
/// left out so they read as missing columns.
fn row_from_json(object: Map<String, Value>) -> RawRow {
    object
        .into_iter()
        .filter_map(|(column, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((column, text))
        })
        .collect()
}

#[async_trait]
impl<C: HttpClient> ContributionStore for SupabaseClient<C> {
    #[tracing::instrument(skip(self))]
    async fn find_or_create_organisation(&self, name: &str) -> Result<i64> {
        let req = json_request::<()>(Method::GET, self.organisation_query(name)?, None)?;
        let existing: Vec<IdRow> = execute_json(&self.http, req).await?;
        if let Some(row) = existing.first() {
            debug!(id = row.id, "Organisation exists");
            return Ok(row.id);
        }

        let body = json!([{ "name": name }]);
        let mut req = json_request(Method::POST, self.table_url(ORGANISATIONS)?, Some(&body))?;
        prefer(&mut req, "return=representation");
        let created: Vec<IdRow> = execute_json(&self.http, req).await?;

        created
            .first()
            .map(|row| row.id)
            .ok_or_else(|| anyhow!("unexpected empty response from organisation insert"))
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert_rows(&self, rows: &[ContributionRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut req = json_request(Method::POST, self.table_url(MAIN_DATA)?, Some(rows))?;
        prefer(&mut req, "return=minimal");
        execute_empty(&self.http, req).await?;
        Ok(rows.len())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let req = json_request::<()>(Method::GET, self.main_data_query()?, None)?;
        let objects: Vec<Map<String, Value>> = execute_json(&self.http, req).await?;
        debug!(rows = objects.len(), "Backend rows fetched");
        Ok(objects.into_iter().map(row_from_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charity_insights::fetch::BasicClient;
    use std::time::Duration;

    fn client(url: &str) -> SupabaseClient<BasicClient> {
        SupabaseClient::new(BasicClient::new(Duration::from_secs(1)).unwrap(), url, "anon").unwrap()
    }

    #[test]
    fn test_table_urls() {
        let c = client("https://abc.supabase.co/");
        assert_eq!(
            c.table_url(MAIN_DATA).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/main_data"
        );
        assert_eq!(
            c.organisation_query("Helping Hands").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/organisations?select=id&name=eq.Helping+Hands"
        );
    }

    #[test]
    fn test_main_data_query_selects_columns() {
        let url = client("https://abc.supabase.co").main_data_query().unwrap();
        let select = url
            .query_pairs()
            .find(|(k, _)| k == "select")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(select, MAIN_DATA_COLUMNS);
    }

    #[test]
    fn test_row_from_json_stringifies_values() {
        let object = json!({
            "activity": "Energy",
            "number_of_people": 7,
            "date": "2023-02-01",
            "postcode": null
        });
        let Value::Object(map) = object else {
            panic!("expected object");
        };
        let row = row_from_json(map);

        assert_eq!(row.get("activity"), Some("Energy"));
        assert_eq!(row.get("number_of_people"), Some("7"));
        assert_eq!(row.get("postcode"), None);
        assert_eq!(row.len(), 3);
    }
}
