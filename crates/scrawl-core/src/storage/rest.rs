//! Canvas store backed by the `/canvases` REST API.

use super::{BoxFuture, CanvasData, CanvasRecord, CanvasStore, NewCanvas, StorageError, StorageResult};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Http(err.to_string())
    }
}

/// Talks to a persistence backend such as `scrawl-server`.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-success statuses onto storage errors.
    async fn check(response: Response, id: &str) -> StorageResult<Response> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Http(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        Ok(response)
    }
}

impl CanvasStore for RestStore {
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let url = self.url(&format!("/canvases/{id}"));
        let id = id.to_string();
        Box::pin(async move {
            let response = self.client.get(&url).send().await?;
            let response = Self::check(response, &id).await?;
            Ok(response.json::<CanvasRecord>().await?)
        })
    }

    fn put(&self, id: &str, data: Value) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.url(&format!("/canvases/{id}"));
        let id = id.to_string();
        Box::pin(async move {
            let response = self.client.put(&url).json(&CanvasData { data }).send().await?;
            Self::check(response, &id).await?;
            Ok(())
        })
    }

    fn create(&self, project_id: &str, title: &str) -> BoxFuture<'_, StorageResult<CanvasRecord>> {
        let url = self.url("/canvases");
        let body = NewCanvas {
            project_id: project_id.to_string(),
            title: title.to_string(),
        };
        Box::pin(async move {
            let response = self.client.post(&url).json(&body).send().await?;
            let response = Self::check(response, "").await?;
            Ok(response.json::<CanvasRecord>().await?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let url = self.url(&format!("/canvases/{id}"));
        let id = id.to_string();
        Box::pin(async move {
            let response = self.client.delete(&url).send().await?;
            Self::check(response, &id).await?;
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let url = self.url("/canvases");
        Box::pin(async move {
            let response = self.client.get(&url).send().await?;
            let response = Self::check(response, "").await?;
            let records = response.json::<Vec<CanvasRecord>>().await?;
            Ok(records.into_iter().map(|r| r.id).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let store = RestStore::new("http://localhost:3030/");
        assert_eq!(store.base_url(), "http://localhost:3030");
        assert_eq!(store.url("/canvases/a"), "http://localhost:3030/canvases/a");
    }
}
