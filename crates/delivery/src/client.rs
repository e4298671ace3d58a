use std::fmt::Display;
use std::time::Duration;

use bpwatch_core::DeliveryConfig;
use serde::Serialize;

use crate::transport::{Transport, TransportResponse};

const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per record, including the first.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, retry_delay: Duration::from_secs(5) }
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self { max_retries: config.max_retries, retry_delay: config.retry_delay() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    FailedAfterRetries { attempts: u32, last_error: String },
    /// The record could not be encoded; never retried.
    SerializationError(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts } | Self::FailedAfterRetries { attempts, .. } => *attempts,
            Self::SerializationError(_) => 0,
        }
    }
}

/// Per-record outcomes, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl BatchReport {
    /// True only if every record was delivered. An empty batch counts as delivered.
    pub fn all_delivered(&self) -> bool {
        self.outcomes.iter().all(DeliveryOutcome::is_delivered)
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.delivered_count()
    }
}

pub struct DeliveryClient<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> DeliveryClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Delivers each record in turn. Failures are reported, never raised.
    pub async fn deliver_batch<R: Serialize + Display>(&self, records: &[R]) -> BatchReport {
        let mut outcomes = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let label = format!("Record {} (Name: {record})", i + 1);
            outcomes.push(self.deliver_one(&label, record).await);
        }

        let report = BatchReport { outcomes };
        if report.all_delivered() {
            tracing::info!(records = report.outcomes.len(), "All records delivered");
        } else {
            tracing::warn!(
                delivered = report.delivered_count(),
                failed = report.failed_count(),
                "Some records were not delivered"
            );
        }
        report
    }

    pub async fn deliver_one<R: Serialize>(&self, label: &str, record: &R) -> DeliveryOutcome {
        let body = match serde_json::to_string(record) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(record = %label, error = %e, "Could not serialize record to JSON");
                return DeliveryOutcome::SerializationError(e.to_string());
            }
        };

        let max = self.policy.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max {
            tracing::info!(record = %label, attempt, max, "Sending record");
            match self.transport.submit(body.clone()).await {
                Ok(resp) if resp.status == STATUS_OK => {
                    log_success(label, &resp);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Ok(resp) => {
                    last_error = format!("Server returned status {} - {}", resp.status, resp.body.trim());
                }
                Err(e) => last_error = e.to_string(),
            }
            tracing::warn!(record = %label, attempt, max, error = %last_error, "Delivery attempt failed");

            if attempt < max {
                tracing::info!(delay_secs = self.policy.retry_delay.as_secs_f64(), "Retrying");
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        tracing::error!(record = %label, attempts = max, "All retries failed");
        DeliveryOutcome::FailedAfterRetries { attempts: max, last_error }
    }
}

fn log_success(label: &str, resp: &TransportResponse) {
    match serde_json::from_str::<serde_json::Value>(&resp.body) {
        Ok(json) => tracing::info!(record = %label, response = %json, "Record delivered"),
        Err(_) => tracing::warn!(
            record = %label,
            response = %resp.body.trim(),
            "Record delivered; server response was not JSON"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::collections::VecDeque;
    use std::fmt;
    use std::sync::Mutex;
    use tokio::time::Instant;

    type Reply = Result<TransportResponse, TransportError>;

    /// Replays canned replies in order; answers 200 once the script runs out.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<(Instant, String)>>,
    }

    impl ScriptedTransport {
        fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self { replies: Mutex::new(replies.into_iter().collect()), calls: Mutex::default() }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }

        fn bodies(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn submit(&self, body: String) -> Reply {
            self.calls.lock().unwrap().push((Instant::now(), body));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ok()))
        }
    }

    #[derive(Serialize)]
    struct Rec {
        first_name: &'static str,
    }

    impl fmt::Display for Rec {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.first_name)
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("unsupported value"))
        }
    }

    impl fmt::Display for Unencodable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("?")
        }
    }

    fn ok() -> TransportResponse {
        TransportResponse::new(200, r#"{"status":"success","message":"Data received successfully"}"#)
    }

    fn refused() -> Reply {
        Err(TransportError::Connect("connection refused".into()))
    }

    fn timed_out() -> Reply {
        Err(TransportError::Timeout("operation timed out".into()))
    }

    fn policy(delay_secs: u64) -> RetryPolicy {
        RetryPolicy { max_retries: 3, retry_delay: Duration::from_secs(delay_secs) }
    }

    #[tokio::test(start_paused = true)]
    async fn delivered_on_third_attempt_after_two_waits() {
        let transport = ScriptedTransport::new([refused(), refused(), Ok(ok())]);
        let client = DeliveryClient::new(transport, policy(5));

        let start = Instant::now();
        let report = client.deliver_batch(&[Rec { first_name: "John" }]).await;

        assert_eq!(report.outcomes, vec![DeliveryOutcome::Delivered { attempts: 3 }]);
        assert!(report.all_delivered());
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        let times = client.transport.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_secs(5));
        assert_eq!(times[2] - times[1], Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_times_out_fails_whole_batch() {
        let transport = ScriptedTransport::new([Ok(ok()), timed_out(), timed_out(), timed_out(), Ok(ok())]);
        let client = DeliveryClient::new(transport, policy(5));

        let records = [Rec { first_name: "A" }, Rec { first_name: "B" }, Rec { first_name: "C" }];
        let start = Instant::now();
        let report = client.deliver_batch(&records).await;

        assert_eq!(report.outcomes[0], DeliveryOutcome::Delivered { attempts: 1 });
        assert!(matches!(
            &report.outcomes[1],
            DeliveryOutcome::FailedAfterRetries { attempts: 3, last_error } if last_error.contains("timed out")
        ));
        assert_eq!(report.outcomes[2], DeliveryOutcome::Delivered { attempts: 1 });
        assert!(!report.all_delivered());
        assert_eq!(report.delivered_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(client.transport.call_times().len(), 5);
        // Two pauses between three attempts; none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn non_200_status_is_a_failed_attempt() {
        let transport = ScriptedTransport::new([
            Ok(TransportResponse::new(503, "busy")),
            Ok(TransportResponse::new(400, "bad")),
        ]);
        let client = DeliveryClient::new(transport, RetryPolicy { max_retries: 2, ..policy(1) });

        let outcome = client.deliver_one("r", &Rec { first_name: "A" }).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::FailedAfterRetries { attempts: 2, last_error: "Server returned status 400 - bad".into() }
        );
    }

    #[tokio::test]
    async fn serialization_failure_is_not_retried() {
        let client = DeliveryClient::new(ScriptedTransport::default(), policy(0));
        let outcome = client.deliver_one("r", &Unencodable).await;
        assert!(matches!(outcome, DeliveryOutcome::SerializationError(ref msg) if msg.contains("unsupported")));
        assert_eq!(outcome.attempts(), 0);
        assert!(client.transport.call_times().is_empty());

        let report = client.deliver_batch(&[Unencodable]).await;
        assert!(!report.all_delivered());
    }

    #[tokio::test]
    async fn non_json_success_body_still_counts() {
        let transport = ScriptedTransport::new([Ok(TransportResponse::new(200, "OK"))]);
        let client = DeliveryClient::new(transport, policy(0));
        let outcome = client.deliver_one("r", &Rec { first_name: "A" }).await;
        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
    }

    #[tokio::test]
    async fn records_are_sent_in_order_as_json() {
        let client = DeliveryClient::new(ScriptedTransport::default(), policy(0));
        client
            .deliver_batch(&[Rec { first_name: "A" }, Rec { first_name: "B" }])
            .await;
        assert_eq!(
            client.transport.bodies(),
            vec![r#"{"first_name":"A"}"#.to_string(), r#"{"first_name":"B"}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_vacuously_delivered() {
        let client = DeliveryClient::new(ScriptedTransport::default(), policy(0));
        let report = client.deliver_batch::<Rec>(&[]).await;
        assert!(report.outcomes.is_empty());
        assert!(report.all_delivered());
    }

    #[tokio::test]
    async fn zero_max_retries_still_attempts_once() {
        let transport = ScriptedTransport::new([refused()]);
        let client = DeliveryClient::new(transport, RetryPolicy { max_retries: 0, ..policy(0) });
        let outcome = client.deliver_one("r", &Rec { first_name: "A" }).await;
        assert_eq!(outcome.attempts(), 1);
        assert!(!outcome.is_delivered());
    }

    #[test]
    fn policy_from_config() {
        let config = DeliveryConfig { retry_delay_secs: 0.25, max_retries: 7, ..Default::default() };
        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy { max_retries: 7, retry_delay: Duration::from_millis(250) }
        );
        assert_eq!(RetryPolicy::from(&DeliveryConfig::default()), RetryPolicy::default());
    }
}
