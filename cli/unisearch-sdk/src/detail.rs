use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use unisearch_catalog::{CatalogClientError, CatalogRecord, ClientTrait};

use crate::failure_message;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailFailure {
    NotFound,
    Network(String),
}

impl From<CatalogClientError> for DetailFailure {
    fn from(error: CatalogClientError) -> Self {
        match error.status() {
            Some(status) if status.is_client_error() => DetailFailure::NotFound,
            _ => DetailFailure::Network(failure_message(&error)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DetailState {
    #[default]
    Idle,
    Loading,
    Loaded(CatalogRecord),
    Failed(DetailFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no university id given")]
pub struct MissingIdError;

#[derive(Debug)]
struct Inner {
    state: DetailState,
    sequence: u64,
}

/// Loads a single university record.
#[derive(Debug)]
pub struct DetailController<C> {
    client: C,
    inner: Mutex<Inner>,
}

impl<C: ClientTrait> DetailController<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            inner: Mutex::new(Inner {
                state: DetailState::Idle,
                sequence: 0,
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> DetailState {
        self.lock().state.clone()
    }

    /// Load the university with the given id.
    ///
    /// A missing or blank id fails without contacting the catalog.
    #[instrument(skip(self))]
    pub async fn load(&self, id: Option<&str>) -> Result<(), MissingIdError> {
        let id = id.map(str::trim).filter(|id| !id.is_empty()).ok_or(MissingIdError)?;

        let sequence = {
            let mut inner = self.lock();
            inner.sequence += 1;
            inner.state = DetailState::Loading;
            inner.sequence
        };

        let result = self.client.get_university(id).await;

        let mut inner = self.lock();
        if inner.sequence != sequence {
            debug!(sequence, "discarding superseded detail response");
            return Ok(());
        }
        inner.state = match result {
            Ok(record) => DetailState::Loaded(record),
            Err(e) => {
                debug!(error = %e, "loading university failed");
                DetailState::Failed(e.into())
            },
        };
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("detail controller mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use unisearch_catalog::StatusCode;
    use unisearch_catalog::mock::{MockClient, MockReply};

    use super::*;

    fn record() -> CatalogRecord {
        CatalogRecord::new(json!({ "id": "mit", "name": "MIT" }))
    }

    #[tokio::test]
    async fn missing_id_makes_no_request() {
        let controller = DetailController::new(MockClient::new());

        assert_eq!(controller.load(None).await, Err(MissingIdError));
        assert_eq!(controller.load(Some("  ")).await, Err(MissingIdError));

        assert!(controller.client().get_requests().is_empty());
        assert_eq!(controller.state(), DetailState::Idle);
    }

    #[tokio::test]
    async fn loads_record() {
        let controller = DetailController::new(MockClient::new());
        controller.client().push_get(MockReply::ok(record()));

        controller.load(Some("mit")).await.unwrap();

        assert_eq!(controller.client().get_requests(), vec!["mit".to_string()]);
        assert_eq!(controller.state(), DetailState::Loaded(record()));
    }

    #[tokio::test]
    async fn client_errors_mean_not_found() {
        let controller = DetailController::new(MockClient::new());
        controller
            .client()
            .push_get(MockReply::err(CatalogClientError::http(StatusCode::NOT_FOUND)));

        controller.load(Some("nope")).await.unwrap();

        assert_eq!(
            controller.state(),
            DetailState::Failed(DetailFailure::NotFound)
        );
    }

    #[tokio::test]
    async fn server_errors_are_network_failures() {
        let controller = DetailController::new(MockClient::new());
        controller
            .client()
            .push_get(MockReply::err(CatalogClientError::http(
                StatusCode::BAD_GATEWAY,
            )));

        controller.load(Some("mit")).await.unwrap();

        assert!(matches!(
            controller.state(),
            DetailState::Failed(DetailFailure::Network(ref message)) if message.contains("502")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn later_load_wins() {
        let controller = DetailController::new(MockClient::new());
        controller
            .client()
            .push_get(
                MockReply::ok(CatalogRecord::new(json!({ "id": "slow" })))
                    .delayed(Duration::from_millis(100)),
            )
            .push_get(MockReply::ok(record()));

        let (first, second) = tokio::join!(controller.load(Some("slow")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.load(Some("mit")).await
        });

        assert_eq!((first, second), (Ok(()), Ok(())));
        assert_eq!(controller.state(), DetailState::Loaded(record()));
    }

    #[test]
    fn failure_serializes() {
        let json = serde_json::to_value(DetailState::Failed(DetailFailure::NotFound)).unwrap();
        assert_eq!(json, json!({ "state": "failed", "value": "not_found" }));
    }
}
