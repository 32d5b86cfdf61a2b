//! HTTP-backed document store client.
//!
//! Talks to a per-user cart-document REST surface:
//!
//! ```text
//! GET   {base}/carts/{user}   -> 200 CartDocument | 404 absent
//! PUT   {base}/carts/{user}   -> full replace, create-if-absent
//! PATCH {base}/carts/{user}   -> partial update of the line list
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use greengrocer_core::{CartLine, UserId};

use super::{CartDocument, DocumentStore, StoreError};

/// Client for a remote cart-document service.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct HttpDocumentStore {
    inner: Arc<HttpDocumentStoreInner>,
}

struct HttpDocumentStoreInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: SecretString,
}

#[derive(Serialize)]
struct LinesPatch<'a> {
    lines: &'a [CartLine],
}

impl HttpDocumentStore {
    /// Create a new client.
    #[must_use]
    pub fn new(base_url: Url, api_token: SecretString) -> Self {
        Self {
            inner: Arc::new(HttpDocumentStoreInner {
                client: reqwest::Client::new(),
                base_url,
                api_token,
            }),
        }
    }

    fn cart_url(&self, user: &UserId) -> Result<Url, StoreError> {
        self.inner
            .base_url
            .join(&format!("carts/{user}"))
            .map_err(|e| StoreError::Unavailable(format!("invalid cart URL: {e}")))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    #[instrument(skip(self), fields(user = %user))]
    async fn get_cart(&self, user: &UserId) -> Result<Option<CartDocument>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.cart_url(user)?)
            .bearer_auth(self.inner.api_token.expose_secret())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await?;
                let document: CartDocument = serde_json::from_str(&body)?;
                debug!(lines = document.lines.len(), "fetched cart document");
                Ok(Some(document))
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
            }),
        }
    }

    #[instrument(skip(self, document), fields(user = %user, lines = document.lines.len()))]
    async fn put_cart(&self, user: &UserId, document: &CartDocument) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .put(self.cart_url(user)?)
            .bearer_auth(self.inner.api_token.expose_secret())
            .json(document)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("replaced cart document");
            Ok(())
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
            })
        }
    }

    #[instrument(skip(self, lines), fields(user = %user, lines = lines.len()))]
    async fn update_lines(&self, user: &UserId, lines: &[CartLine]) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .patch(self.cart_url(user)?)
            .bearer_auth(self.inner.api_token.expose_secret())
            .json(&LinesPatch { lines })
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            status if status.is_success() => Ok(()),
            status => Err(StoreError::Status {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_url_joins_user_id() {
        let store = HttpDocumentStore::new(
            Url::parse("https://store.example.com/api/").unwrap(),
            SecretString::from("token"),
        );
        let url = store.cart_url(&UserId::new("uid-1")).unwrap();
        assert_eq!(url.as_str(), "https://store.example.com/api/carts/uid-1");
    }
}
