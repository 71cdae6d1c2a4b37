#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Publishes results to a remote results service as JSON.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize, ser::SerializeMap};
use typed_builder::TypedBuilder;

use super::{Sink, SinkError};
use crate::report::{ReportBundle, ResultRecord, Status};

/// How records are grouped into requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishPolicy {
    /// One request per record, in bundle order.
    #[default]
    PerRecord,
    /// A single request carrying every record.
    Batch,
}

/// One test case as the results service expects it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
#[serde(rename_all = "camelCase")]
#[builder(field_defaults(setter(into)))]
pub struct TestCaseResultDto {
    /// Check name.
    pub method_name:   String,
    /// Category, lowercase.
    pub method_type:   String,
    /// Points available.
    pub actual_score:  f64,
    /// Points earned.
    pub earned_score:  f64,
    /// `Pass` or `Fail`.
    pub status:        String,
    /// Whether a failure blocks acceptance.
    pub is_mandatory:  bool,
    /// Failure reasons, empty on a pass.
    pub error_message: String,
}

impl From<&ResultRecord> for TestCaseResultDto {
    fn from(record: &ResultRecord) -> Self {
        TestCaseResultDto::builder()
            .method_name(record.check_name())
            .method_type(record.category().as_str())
            .actual_score(record.max_score())
            .earned_score(record.earned_score())
            .status(match record.status() {
                Status::Pass => "Pass",
                Status::Fail => "Fail",
            })
            .is_mandatory(record.mandatory())
            .error_message(record.feedback())
            .build()
    }
}

/// Test cases keyed by report key, serialized as a JSON object in bundle
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCaseResults(Vec<(String, TestCaseResultDto)>);

impl TestCaseResults {
    /// Looks up a test case by report key.
    pub fn get(&self, key: &str) -> Option<&TestCaseResultDto> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, dto)| dto)
    }

    /// Iterates keys and test cases in bundle order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestCaseResultDto)> {
        self.0.iter().map(|(k, dto)| (k.as_str(), dto))
    }

    /// Number of test cases.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no test cases.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TestCaseResults {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, dto) in &self.0 {
            map.serialize_entry(key, dto)?;
        }
        map.end()
    }
}

/// Body of one publish request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishPayload {
    /// Test cases keyed by report key.
    pub test_case_results: TestCaseResults,
    /// The bundle's metadata, verbatim.
    pub custom_data:       String,
}

/// Collects `pairs` into one request body.
fn payload_for<'a>(
    pairs: impl Iterator<Item = (&'a str, &'a ResultRecord)>,
    metadata: &str,
) -> PublishPayload {
    PublishPayload {
        test_case_results: TestCaseResults(
            pairs
                .map(|(key, record)| (key.to_string(), TestCaseResultDto::from(record)))
                .collect(),
        ),
        custom_data:       metadata.to_string(),
    }
}

/// Posts results to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    /// Shared HTTP client.
    client:   Client,
    /// Target URL.
    endpoint: String,
    /// Request grouping.
    policy:   PublishPolicy,
}

impl HttpPublisher {
    /// Creates a publisher for `endpoint`.
    pub fn new(endpoint: impl Into<String>, policy: PublishPolicy) -> Result<Self, SinkError> {
        let endpoint = endpoint.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| SinkError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint,
            policy,
        })
    }

    /// The request bodies this publisher would send for `bundle`, in order.
    pub fn payloads(&self, bundle: &ReportBundle) -> Vec<PublishPayload> {
        match self.policy {
            PublishPolicy::PerRecord => bundle
                .iter()
                .map(|pair| payload_for(std::iter::once(pair), bundle.metadata()))
                .collect(),
            PublishPolicy::Batch => vec![payload_for(bundle.iter(), bundle.metadata())],
        }
    }

    /// Sends one payload.
    fn publish(&self, payload: &PublishPayload) -> Result<(), SinkError> {
        let body = serde_json::to_string_pretty(payload)?;
        tracing::debug!("Sending below data to server:\n{body}");

        let http_err = |source: reqwest::Error| SinkError::Http {
            endpoint: self.endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;

        let body = response.text().map_err(http_err)?;
        tracing::debug!("Server response: {body}");
        Ok(())
    }
}

impl Sink for HttpPublisher {
    fn name(&self) -> &str {
        "publish"
    }

    /// Sends every payload even when an earlier one fails, and reports the
    /// first failure.
    fn consume(&self, bundle: &ReportBundle) -> Result<(), SinkError> {
        let mut first_error = None;
        for payload in self.payloads(bundle) {
            if let Err(e) = self.publish(&payload) {
                tracing::warn!("Error publishing results: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
