//! Catalog client over the UniSearch HTTP API.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, http_error};
use crate::types::{CatalogRecord, ExamValidationRequest, ListResponse, ValidatedExam};

const UNIVERSITIES_PATH: &str = "universities";
const EXAMS_VALIDATE_PATH: [&str; 2] = ["exams", "validate"];

/// A client for the catalog service.
///
/// Handles HTTP client configuration with timeouts and extra headers,
/// URL construction and mapping of responses to [CatalogClientError]s.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = Url::parse(&config.catalog_url).map_err(|e| {
            CatalogClientError::Other(format!(
                "invalid catalog url '{}': {e}",
                config.catalog_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::Other(format!(
                "catalog url '{}' cannot be used as a base url",
                config.catalog_url
            )));
        }

        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Join path segments onto the base url, percent-encoding each segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CatalogClientError> {
        let response = request.send().await.map_err(CatalogClientError::Network)?;
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The catalog API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalog API via [`CatalogClient`]
/// - **Mock** (controller tests): canned responses without HTTP
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List universities matching the given query parameters.
    async fn list_universities(
        &self,
        params: &[(String, String)],
    ) -> Result<ListResponse, CatalogClientError>;

    /// Get a single university by id.
    async fn get_university(
        &self,
        id: impl AsRef<str> + Send + Sync,
    ) -> Result<CatalogRecord, CatalogClientError>;

    /// Check an exam result with the catalog.
    ///
    /// The catalog may normalize the exam name and score.
    async fn validate_exam(
        &self,
        exam: impl AsRef<str> + Send + Sync,
        score: f64,
    ) -> Result<ValidatedExam, CatalogClientError>;
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(n_params = params.len()))]
    async fn list_universities(
        &self,
        params: &[(String, String)],
    ) -> Result<ListResponse, CatalogClientError> {
        let mut url = self.endpoint([UNIVERSITIES_PATH]);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        debug!(%url, "listing universities");

        let response = self.send(self.client.get(url)).await?;
        let page = response
            .json::<ListResponse>()
            .await
            .map_err(CatalogClientError::InvalidResponse)?;

        debug!(
            n_items = page.items.len(),
            total = ?page.total,
            "received universities"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(id = %id.as_ref()))]
    async fn get_university(
        &self,
        id: impl AsRef<str> + Send + Sync,
    ) -> Result<CatalogRecord, CatalogClientError> {
        let url = self.endpoint([UNIVERSITIES_PATH, id.as_ref()]);
        debug!(%url, "fetching university");

        let response = self.send(self.client.get(url)).await?;
        response
            .json::<CatalogRecord>()
            .await
            .map_err(CatalogClientError::InvalidResponse)
    }

    #[instrument(skip_all, fields(exam = %exam.as_ref(), score = score))]
    async fn validate_exam(
        &self,
        exam: impl AsRef<str> + Send + Sync,
        score: f64,
    ) -> Result<ValidatedExam, CatalogClientError> {
        let url = self.endpoint(EXAMS_VALIDATE_PATH);
        let body = ExamValidationRequest {
            exam: exam.as_ref(),
            score,
        };

        let result = self.send(self.client.post(url).json(&body)).await;
        let response = match result {
            Ok(response) => response,
            Err(CatalogClientError::Http { status, detail }) if status.is_client_error() => {
                let message = detail.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("exam rejected by catalog")
                        .to_string()
                });
                debug!(%status, %message, "exam rejected");
                return Err(CatalogClientError::Validation { message });
            },
            Err(e) => return Err(e),
        };

        response
            .json::<ValidatedExam>()
            .await
            .map_err(CatalogClientError::InvalidResponse)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig::new(url)
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn list_sends_query_params() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/universities")
                .query_param("q", "tech")
                .query_param("sort", "name_asc")
                .query_param("page", "2")
                .query_param("user_budget", "500");
            then.status(200)
                .json_body(json!({"items": [{"id": 1, "name": "A"}], "total": 13}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let page = client
            .list_universities(&params(&[
                ("q", "tech"),
                ("sort", "name_asc"),
                ("page", "2"),
                ("user_budget", "500"),
            ]))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, Some(13));
        mock.assert();
    }

    #[tokio::test]
    async fn list_without_total_has_no_total() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(200).json_body(json!({"items": [], "count": 0}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let page = client.list_universities(&[]).await.unwrap();
        assert_eq!(page.total, None);
        assert!(page.items.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn list_http_error() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|_, then| {
            then.status(500).body("<html>oops</html>");
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.list_universities(&[]).await;
        assert!(
            matches!(
                result,
                Err(CatalogClientError::Http { status, detail: None })
                    if status == StatusCode::INTERNAL_SERVER_ERROR
            ),
            "expected Http error, found: {result:?}"
        );
        mock.assert();
    }

    #[tokio::test]
    async fn list_invalid_json() {
        let server = MockServer::start_async().await;
        server.mock(|_, then| {
            then.status(200).body("not json");
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.list_universities(&[]).await;
        assert!(
            matches!(result, Err(CatalogClientError::InvalidResponse(_))),
            "expected InvalidResponse, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_catalog_is_a_network_error() {
        // Nothing listens on the discard port
        let client = CatalogClient::new(client_config("http://127.0.0.1:9")).unwrap();
        let result = client.get_university("1").await;
        assert!(
            matches!(result, Err(CatalogClientError::Network(_))),
            "expected Network error, found: {result:?}"
        );
    }

    #[test]
    fn endpoint_encodes_id_as_single_segment() {
        for base in ["http://example.com", "http://example.com/api", "http://example.com/api/"] {
            let client = CatalogClient::new(client_config(base)).unwrap();
            let url = client.endpoint([UNIVERSITIES_PATH, "a/b c"]);
            let expected = if base == "http://example.com" {
                "http://example.com/universities/a%2Fb%20c"
            } else {
                "http://example.com/api/universities/a%2Fb%20c"
            };
            assert_eq!(url.as_str(), expected, "base: {base}");
        }
    }

    #[tokio::test]
    async fn get_university_respects_base_path() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/universities/7");
            then.status(200).json_body(json!({"id": 7}));
        });

        let client = CatalogClient::new(client_config(&server.url("/api/"))).unwrap();
        let record = client.get_university("7").await.unwrap();
        assert_eq!(record.id(), Some("7".to_string()));
        mock.assert();
    }

    #[tokio::test]
    async fn get_university_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|_, then| {
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "University not found"}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let err = client.get_university("999").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "404 Not Found: University not found");
    }

    #[tokio::test]
    async fn validate_exam_returns_normalized_exam() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/exams/validate")
                .json_body(json!({"exam": "ielts", "score": 7.5}));
            then.status(200).json_body(json!({"exam": "IELTS", "score": 7.5}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let exam = client.validate_exam("ielts", 7.5).await.unwrap();
        assert_eq!(exam, ValidatedExam {
            exam: "IELTS".to_string(),
            score: 7.5
        });
        mock.assert();
    }

    #[tokio::test]
    async fn validate_exam_rejection_carries_detail() {
        let server = MockServer::start_async().await;
        server.mock(|_, then| {
            then.status(422)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "IELTS score must be between 0 and 9"}));
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.validate_exam("IELTS", 12.0).await;
        match result {
            Err(CatalogClientError::Validation { message }) => {
                assert_eq!(message, "IELTS score must be between 0 and 9")
            },
            other => panic!("expected Validation error, found: {other:?}"),
        }
    }

    #[tokio::test]
    async fn validate_exam_server_error_is_not_a_validation_error() {
        let server = MockServer::start_async().await;
        server.mock(|_, then| {
            then.status(503);
        });

        let client = CatalogClient::new(client_config(&server.base_url())).unwrap();
        let result = client.validate_exam("IELTS", 7.0).await;
        assert!(
            matches!(result, Err(CatalogClientError::Http { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE),
            "expected Http error, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("unisearch-test".to_string(), "test-value".to_string());

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("unisearch-test", "test-value");
            then.status(200).json_body(json!({"items": []}));
        });

        let config = CatalogClientConfig {
            extra_headers,
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.list_universities(&[]).await;
        mock.assert();
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!({"id": 1}));
        });

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.get_university("1").await;
        mock.assert();
    }

    #[test]
    fn invalid_catalog_url_is_rejected() {
        let result = CatalogClient::new(client_config("not a url"));
        assert!(matches!(result, Err(CatalogClientError::Other(_))));
        let result = CatalogClient::new(client_config("mailto:someone@example.com"));
        assert!(matches!(result, Err(CatalogClientError::Other(_))));
    }
}
