//! Canned-response catalog client for tests.
//!
//! Replies are queued per operation and handed out in call order,
//! each optionally delayed to simulate a slow catalog.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::client::ClientTrait;
use crate::error::CatalogClientError;
use crate::types::{CatalogRecord, ListResponse, ValidatedExam};

/// A queued reply.
#[derive(Debug)]
pub struct MockReply<T> {
    pub delay: Duration,
    pub result: Result<T, CatalogClientError>,
}

impl<T> MockReply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(error: CatalogClientError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
pub struct MockClient {
    list_replies: Mutex<VecDeque<MockReply<ListResponse>>>,
    get_replies: Mutex<VecDeque<MockReply<CatalogRecord>>>,
    validate_replies: Mutex<VecDeque<MockReply<ValidatedExam>>>,

    list_requests: Mutex<Vec<Vec<(String, String)>>>,
    get_requests: Mutex<Vec<String>>,
    validate_requests: Mutex<Vec<(String, f64)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, reply: MockReply<ListResponse>) -> &Self {
        self.list_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_get(&self, reply: MockReply<CatalogRecord>) -> &Self {
        self.get_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_validate(&self, reply: MockReply<ValidatedExam>) -> &Self {
        self.validate_replies.lock().unwrap().push_back(reply);
        self
    }

    /// Query parameters of every list request, in call order.
    pub fn list_requests(&self) -> Vec<Vec<(String, String)>> {
        self.list_requests.lock().unwrap().clone()
    }

    pub fn get_requests(&self) -> Vec<String> {
        self.get_requests.lock().unwrap().clone()
    }

    pub fn validate_requests(&self) -> Vec<(String, f64)> {
        self.validate_requests.lock().unwrap().clone()
    }
}

async fn reply<T>(
    queue: &Mutex<VecDeque<MockReply<T>>>,
    operation: &str,
) -> Result<T, CatalogClientError> {
    // pop before suspending so replies follow call order
    let next = queue.lock().unwrap().pop_front();
    let Some(MockReply { delay, result }) = next else {
        return Err(CatalogClientError::Other(format!(
            "no mock reply queued for {operation}"
        )));
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

impl ClientTrait for MockClient {
    async fn list_universities(
        &self,
        params: &[(String, String)],
    ) -> Result<ListResponse, CatalogClientError> {
        self.list_requests.lock().unwrap().push(params.to_vec());
        reply(&self.list_replies, "list_universities").await
    }

    async fn get_university(
        &self,
        id: impl AsRef<str> + Send + Sync,
    ) -> Result<CatalogRecord, CatalogClientError> {
        self.get_requests.lock().unwrap().push(id.as_ref().to_string());
        reply(&self.get_replies, "get_university").await
    }

    async fn validate_exam(
        &self,
        exam: impl AsRef<str> + Send + Sync,
        score: f64,
    ) -> Result<ValidatedExam, CatalogClientError> {
        self.validate_requests
            .lock()
            .unwrap()
            .push((exam.as_ref().to_string(), score));
        reply(&self.validate_replies, "validate_exam").await
    }
}
