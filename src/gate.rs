//! Dispatch Gate
//!
//! Every outbound call goes through [`DispatchGate::send`]:
//!
//! ```text
//! Idle -> CheckingQuota -> Skipped
//!                       -> Dispatching -> Success | NotFound | Conflict
//!                                       | Rejected | UnexpectedStatus / transport failure
//! ```
//!
//! The quota check and the timestamp record happen under one lock, so two
//! callers sharing a client cannot both take the last slot. The lock is
//! released before the network call. Nothing is retried.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::metrics;
use crate::models::MapPayload;
use crate::rate_limit::{QuotaExceeded, QuotaTracker, QuotaUsage, RateLimitConfig};
use crate::request::{ApiRequest, OperationKind};
use crate::transport::{RawResponse, Transport};

/// Result of a dispatched (or skipped) call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not sent; the local quota is exhausted
    RateLimited,
    /// 200
    Success(MapPayload),
    /// 404 on a read
    NotFound,
    /// 409: generating (read) or already exists (create)
    Conflict(MapPayload),
}

/// How a `(kind, status)` pair is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Payload,
    NotFound,
    Conflict,
    Rejection,
    Unexpected,
}

fn disposition(kind: OperationKind, status: u16) -> Disposition {
    match (kind, status) {
        (_, 200) => Disposition::Payload,
        (OperationKind::Read, 404) => Disposition::NotFound,
        (_, 409) => Disposition::Conflict,
        (OperationKind::Create, 400) => Disposition::Rejection,
        _ => Disposition::Unexpected,
    }
}

fn interpret(kind: OperationKind, response: RawResponse) -> Result<Outcome> {
    match disposition(kind, response.status) {
        Disposition::Payload => Ok(Outcome::Success(MapPayload::new(response.json()?))),
        Disposition::NotFound => Ok(Outcome::NotFound),
        Disposition::Conflict => Ok(Outcome::Conflict(MapPayload::new(response.json()?))),
        Disposition::Rejection => match rejection_reason(&response.body) {
            Some(reason) => Err(ClientError::Rejected { reason }),
            None => Err(unexpected(response)),
        },
        Disposition::Unexpected => Err(unexpected(response)),
    }
}

fn unexpected(response: RawResponse) -> ClientError {
    ClientError::UnexpectedStatus {
        status: response.status,
        body: response.body,
    }
}

/// `reason` from a 400 body, if it is present and not empty
///
/// Strings are passed through untouched; any other non-empty value is
/// rendered as JSON.
fn rejection_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let reason = value.get("reason")?;
    let present = match reason {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    };
    if !present {
        return None;
    }
    Some(match reason {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn outcome_label(result: &Result<Outcome>) -> &'static str {
    match result {
        Ok(Outcome::RateLimited) => "rate_limited",
        Ok(Outcome::Success(_)) => "success",
        Ok(Outcome::NotFound) => "not_found",
        Ok(Outcome::Conflict(_)) => "conflict",
        Err(ClientError::Rejected { .. }) => "rejected",
        Err(ClientError::UnexpectedStatus { .. }) => "unexpected_status",
        Err(ClientError::Timeout { .. }) => "timeout",
        Err(ClientError::Network(_)) => "network",
        Err(ClientError::Decode(_)) => "decode",
        Err(ClientError::Validation(_)) | Err(ClientError::InvalidConfig(_)) => "invalid",
    }
}

/// Quota-checked access to a [`Transport`]
pub struct DispatchGate<T> {
    transport: T,
    tracker: Mutex<QuotaTracker>,
}

impl<T: Transport> DispatchGate<T> {
    pub fn new(transport: T, rate_limit: &RateLimitConfig) -> Self {
        Self::with_tracker(transport, QuotaTracker::new(rate_limit))
    }

    pub fn with_tracker(transport: T, tracker: QuotaTracker) -> Self {
        Self {
            transport,
            tracker: Mutex::new(tracker),
        }
    }

    /// Check the quota, record the attempt, dispatch, interpret.
    ///
    /// A skipped call returns `Ok(Outcome::RateLimited)` and logs a warning;
    /// it neither touches the network nor consumes quota. A call that fails
    /// after dispatch still counts against the quota.
    pub async fn send(&self, request: &ApiRequest) -> Result<Outcome> {
        let operation = request.operation.name();

        match self.acquire() {
            Ok(usage) => metrics::record_quota_usage(&usage),
            Err(exceeded) => {
                tracing::warn!(
                    operation,
                    window_secs = exceeded.window_secs,
                    limit = exceeded.limit,
                    "Skipping request because the rate limit is reached"
                );
                metrics::record_rate_limited(operation);
                return Ok(Outcome::RateLimited);
            }
        }

        tracing::debug!(operation, path = %request.path_and_query(), "Dispatching request");
        let started = Instant::now();
        let result = self.transport.execute(request).await;
        metrics::observe_duration(operation, started.elapsed().as_secs_f64());

        let outcome = result.and_then(|response| interpret(request.kind(), response));
        metrics::record_outcome(operation, outcome_label(&outcome));
        if let Err(err) = &outcome {
            tracing::debug!(operation, error = %err, "Request failed");
        }
        outcome
    }

    /// Current usage per window; prunes stale entries
    pub fn quota_usage(&self) -> QuotaUsage {
        let usage = self.lock_tracker().usage(Instant::now());
        metrics::record_quota_usage(&usage);
        usage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // The instant is read under the lock so the record stays in order
    fn acquire(&self) -> std::result::Result<QuotaUsage, QuotaExceeded> {
        let mut tracker = self.lock_tracker();
        tracker.try_acquire(Instant::now())
    }

    // The record is plain data; a panic elsewhere cannot leave it inconsistent
    fn lock_tracker(&self) -> MutexGuard<'_, QuotaTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MockTransport;
    use super::*;
    use crate::logging::test_support::{capturing_subscriber, CapturedLogs};
    use crate::rate_limit::RateLimitPolicy;
    use crate::request::{Endpoint, Operation};
    use serde_json::json;
    use std::sync::Arc;

    fn request(operation: Operation) -> ApiRequest {
        ApiRequest::new(
            operation,
            Endpoint::MapBySeed {
                seed: 590877946,
                size: 2500,
            },
            false,
            false,
        )
    }

    fn gate(transport: MockTransport) -> DispatchGate<MockTransport> {
        DispatchGate::new(transport, &RateLimitConfig::default())
    }

    fn small_gate(transport: MockTransport, max_calls: u32) -> DispatchGate<MockTransport> {
        let tracker = QuotaTracker::with_policies(vec![RateLimitPolicy::new(60, max_calls)]);
        DispatchGate::with_tracker(transport, tracker)
    }

    #[test]
    fn test_disposition_table() {
        use Disposition::*;
        use OperationKind::*;

        let cases = [
            (Read, 200, Payload),
            (Read, 404, NotFound),
            (Read, 409, Conflict),
            (Read, 400, Unexpected),
            (Read, 500, Unexpected),
            (Create, 200, Payload),
            (Create, 404, Unexpected),
            (Create, 409, Conflict),
            (Create, 400, Rejection),
            (Create, 503, Unexpected),
        ];
        for (kind, status, expected) in cases {
            assert_eq!(disposition(kind, status), expected, "{:?} {}", kind, status);
        }
    }

    #[tokio::test]
    async fn test_read_success() {
        let gate = gate(MockTransport::respond(200, r#"{"id":"abc","seed":1}"#));
        let outcome = gate.send(&request(Operation::GetMap)).await.unwrap();

        match outcome {
            Outcome::Success(payload) => assert_eq!(payload.map_id(), Some("abc")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_404_is_not_found_not_error() {
        let gate = gate(MockTransport::respond(404, "Not Found"));
        let outcome = gate.send(&request(Operation::GetMap)).await.unwrap();
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[tokio::test]
    async fn test_read_409_returns_payload_as_is() {
        let gate = gate(MockTransport::respond(409, r#"{"currentState":"Generating"}"#));
        let outcome = gate.send(&request(Operation::GetMap)).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Conflict(MapPayload::new(json!({"currentState": "Generating"})))
        );
    }

    #[tokio::test]
    async fn test_read_other_status_is_transport_error() {
        let gate = gate(MockTransport::respond(500, "boom"));
        let err = gate.send(&request(Operation::GetMap)).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 500, .. }));

        let gate = gate_with_400_read();
        let err = gate.send(&request(Operation::GetMap)).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(matches!(err, ClientError::UnexpectedStatus { .. }));
    }

    fn gate_with_400_read() -> DispatchGate<MockTransport> {
        gate(MockTransport::respond(400, r#"{"reason":"ignored for reads"}"#))
    }

    #[tokio::test]
    async fn test_create_409_preserves_identifier() {
        let gate = gate(MockTransport::respond(409, r#"{"mapId":"474b4c64-ab86-4128-a075-e88737fa5820"}"#));
        let outcome = gate.send(&request(Operation::GenerateMap)).await.unwrap();

        match outcome {
            Outcome::Conflict(payload) => assert_eq!(
                payload.map_id(),
                Some("474b4c64-ab86-4128-a075-e88737fa5820")
            ),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_400_with_reason_is_rejected() {
        let cases = [
            (r#"{"reason": "seed taken"}"#, "seed taken"),
            (r#"{"reason":"  seed taken  "}"#, "  seed taken  "),
            (r#"{"reason":"   "}"#, "   "),
            (r#"{"reason":42}"#, "42"),
            (r#"{"reason":["a"]}"#, r#"["a"]"#),
            (r#"{"reason":true}"#, "true"),
        ];

        for (body, expected) in cases {
            let gate = gate(MockTransport::respond(400, body));
            let err = gate.send(&request(Operation::GenerateMap)).await.unwrap_err();

            match err {
                ClientError::Rejected { reason } => assert_eq!(reason, expected, "body {}", body),
                other => panic!("body {} gave unexpected error {:?}", body, other),
            }
        }
    }

    #[tokio::test]
    async fn test_create_400_without_reason_is_transport_error() {
        for body in [
            "",
            "{}",
            r#"{"reason":""}"#,
            r#"{"reason":null}"#,
            r#"{"reason":0}"#,
            r#"{"reason":false}"#,
            r#"{"reason":[]}"#,
            r#"{"reason":{}}"#,
            "bad request",
        ] {
            let gate = gate(MockTransport::respond(400, body));
            let err = gate.send(&request(Operation::GenerateMap)).await.unwrap_err();
            assert!(
                matches!(err, ClientError::UnexpectedStatus { status: 400, .. }),
                "body {:?} gave {:?}",
                body,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_success_with_invalid_json_is_decode_error() {
        let gate = gate(MockTransport::respond(200, "<html>"));
        let err = gate.send(&request(Operation::GetMap)).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_call_is_skipped_and_not_recorded() {
        let gate = small_gate(MockTransport::new(), 2);

        for _ in 0..2 {
            let outcome = gate.send(&request(Operation::GetMap)).await.unwrap();
            assert!(matches!(outcome, Outcome::Success(_)));
        }
        let outcome = gate.send(&request(Operation::GetMap)).await.unwrap();

        assert_eq!(outcome, Outcome::RateLimited);
        assert_eq!(gate.transport().calls(), 2);
        assert_eq!(gate.quota_usage().windows[0].used, 2);
    }

    #[tokio::test]
    async fn test_failed_call_still_consumes_quota() {
        let transport = MockTransport::with_responses(vec![Err(ClientError::Network(
            "connection reset".to_string(),
        ))]);
        let gate = small_gate(transport, 1);

        assert!(gate.send(&request(Operation::GetMap)).await.is_err());
        assert_eq!(
            gate.send(&request(Operation::GetMap)).await.unwrap(),
            Outcome::RateLimited
        );
        assert_eq!(gate.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_skip_logs_warning() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(capturing_subscriber(&logs));

        let gate = small_gate(MockTransport::new(), 1);
        gate.send(&request(Operation::GenerateMap)).await.unwrap();
        gate.send(&request(Operation::GenerateMap)).await.unwrap();

        let output = logs.contents();
        assert!(output.contains("WARN"));
        assert!(output.contains("Skipping request because the rate limit is reached"));
        assert!(output.contains("generate_map"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_callers_record_in_order() {
        let gate = Arc::new(small_gate(MockTransport::new(), 1_000));

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.send(&request(Operation::GetMap)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tracker = gate.lock_tracker();
        assert_eq!(tracker.len(), 200);
        assert!(tracker.is_chronological());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_never_overshoot() {
        let gate = Arc::new(small_gate(MockTransport::new(), 5));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.send(&request(Operation::GetMap)).await })
            })
            .collect();

        let mut dispatched = 0;
        let mut skipped = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Outcome::RateLimited => skipped += 1,
                _ => dispatched += 1,
            }
        }

        assert_eq!(dispatched, 5);
        assert_eq!(skipped, 27);
        assert_eq!(gate.transport().calls(), 5);
    }
}
