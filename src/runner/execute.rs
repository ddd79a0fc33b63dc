//! Runner implementation
//!
//! Executes a plan's steps strictly in order against one base URL, stopping
//! at the first failure. Every step error is converted into a failure
//! [`Outcome`] here; nothing escapes as a Rust error.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::common::{Config, Error, Result};
use crate::http::{failure_message, ApiEnvelope, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportFailure};

use super::context::RunContext;
use super::outcome::{FailureKind, Outcome, RunState, StepFailure, StepRecord};
use super::plan::Plan;
use super::redact;
use super::step::{CallStep, RequestSpec};

/// Receives progress notifications while a plan runs
///
/// All methods default to doing nothing.
pub trait RunObserver {
    fn step_started(&mut self, _index: usize, _step: &CallStep, _request: &HttpRequest) {}
    fn step_passed(&mut self, _record: &StepRecord) {}
    fn step_failed(&mut self, _failure: &StepFailure) {}
}

impl RunObserver for () {}

/// Executes plans against one API
pub struct Runner {
    transport: Arc<dyn Transport>,
    base_url: String,
    default_timeout: Duration,
}

impl Runner {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, default_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::InvalidUrl {
                url: base_url,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        Ok(Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout,
        })
    }

    /// Runner over the reqwest transport, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::new(Arc::new(transport), config.base_url()?, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run `plan` from `seed` without progress notifications
    pub async fn run(&self, plan: &Plan, seed: RunContext) -> Outcome {
        self.run_observed(plan, seed, &mut ()).await
    }

    /// Run `plan` from `seed`, reporting each step to `observer`
    pub async fn run_observed(&self, plan: &Plan, seed: RunContext, observer: &mut dyn RunObserver) -> Outcome {
        let mut ctx = seed;
        let mut completed: Vec<StepRecord> = Vec::with_capacity(plan.len());
        let mut state = RunState::InProgress { next_step: 0 };

        tracing::info!(plan = plan.name(), steps = plan.len(), "Starting run against {}", self.base_url);

        for (index, step) in plan.steps().iter().enumerate() {
            tracing::debug!(?state, step = %step.name, "{}", step.description);

            match self.execute_step(index, step, &ctx, observer).await {
                Ok(StepSuccess { record, values, body }) => {
                    if let Err(failure) = merge(&mut ctx, values) {
                        let failure = StepFailure {
                            step_index: index,
                            step_name: step.name.clone(),
                            kind: FailureKind::ExtractionError,
                            message: failure.to_string(),
                            status: Some(record.status),
                            body: Some(body),
                            context: ctx.snapshot(),
                            completed,
                        };
                        return finish_failed(plan, failure, observer);
                    }
                    observer.step_passed(&record);
                    completed.push(record);
                    state = RunState::InProgress { next_step: index + 1 };
                }
                Err(partial) => {
                    let failure = StepFailure {
                        step_index: index,
                        step_name: step.name.clone(),
                        kind: partial.kind,
                        message: partial.message,
                        status: partial.status,
                        body: partial.body,
                        context: ctx.snapshot(),
                        completed,
                    };
                    return finish_failed(plan, failure, observer);
                }
            }
        }

        tracing::info!(plan = plan.name(), state = ?RunState::Succeeded, "All {} steps passed", completed.len());

        Outcome::Success {
            plan: plan.name().to_string(),
            context: ctx.snapshot(),
            steps: completed,
        }
    }

    async fn execute_step(
        &self,
        index: usize,
        step: &CallStep,
        ctx: &RunContext,
        observer: &mut dyn RunObserver,
    ) -> std::result::Result<StepSuccess, PartialFailure> {
        if let Some(missing) = step.requires.iter().find(|key| !ctx.contains(key)) {
            return Err(PartialFailure::extraction(
                Error::MissingContextValue(missing.clone()).to_string(),
                None,
                None,
            ));
        }

        let spec = (step.build)(ctx).map_err(|e| PartialFailure::extraction(e.to_string(), None, None))?;
        let timeout = step.timeout.unwrap_or(self.default_timeout);
        let request = self
            .resolve(spec, ctx, timeout)
            .map_err(|e| PartialFailure::extraction(e.to_string(), None, None))?;

        log_request(step, &request);
        observer.step_started(index, step, &request);

        let started = Instant::now();
        let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(failure)) => return Err(PartialFailure::transport(failure)),
            Err(_) => return Err(PartialFailure::transport(TransportFailure::timeout(timeout))),
        };
        let elapsed_ms = started.elapsed().as_millis();

        tracing::debug!(
            step = %step.name,
            status = response.status,
            elapsed_ms = elapsed_ms as u64,
            "Response: {}",
            redact::redact_json(&response.body)
        );

        if !step.check.passes(&response) {
            return Err(PartialFailure::application(response));
        }

        let values = step
            .extractor
            .extract(&response.body)
            .map_err(|reason| PartialFailure::extraction(reason, Some(response.status), Some(response.body.clone())))?;

        for (key, value) in &values {
            tracing::info!(step = %step.name, "Extracted {} = {}", key, redact::redact_named(key, value));
        }

        let record = StepRecord {
            index,
            name: step.name.clone(),
            description: step.description.clone(),
            status: response.status,
            extracted: values.iter().map(|(k, _)| k.clone()).collect(),
            elapsed_ms,
        };

        Ok(StepSuccess {
            record,
            values,
            body: response.body,
        })
    }

    /// Apply base URL and bearer token to a request spec
    fn resolve(&self, spec: RequestSpec, ctx: &RunContext, timeout: Duration) -> Result<HttpRequest> {
        let url = if spec.path.starts_with("http://") || spec.path.starts_with("https://") {
            spec.path
        } else {
            format!("{}/{}", self.base_url, spec.path.trim_start_matches('/'))
        };

        let mut headers = spec.headers;
        if let Some(key) = &spec.bearer {
            let token = ctx.text(key)?;
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        Ok(HttpRequest {
            method: spec.method,
            url,
            query: spec.query,
            headers,
            body: spec.body,
            timeout,
        })
    }
}

/// A passed step's record, extracted values and raw response body
struct StepSuccess {
    record: StepRecord,
    values: Vec<(String, Value)>,
    body: Value,
}

/// Failure detail before the step's identity and context are attached
#[derive(Debug)]
struct PartialFailure {
    kind: FailureKind,
    message: String,
    status: Option<u16>,
    body: Option<Value>,
}

impl PartialFailure {
    fn transport(failure: TransportFailure) -> Self {
        Self {
            kind: FailureKind::TransportError,
            message: failure.message,
            status: None,
            body: None,
        }
    }

    fn application(response: HttpResponse) -> Self {
        let message = match ApiEnvelope::from_body(&response.body) {
            Some(env) if response.is_success_status() && !env.is_success() => format!(
                "API reported status '{}': {}",
                env.status.as_deref().unwrap_or("missing"),
                env.message.as_deref().unwrap_or("no message")
            ),
            _ => match failure_message(&response.body) {
                Some(msg) => format!("HTTP {}: {}", response.status, msg),
                None => format!("HTTP {}", response.status),
            },
        };

        Self {
            kind: FailureKind::ApplicationError,
            message,
            status: Some(response.status),
            body: Some(response.body),
        }
    }

    fn extraction(message: String, status: Option<u16>, body: Option<Value>) -> Self {
        Self {
            kind: FailureKind::ExtractionError,
            message,
            status,
            body,
        }
    }
}

/// Insert all extracted values or none of them
fn merge(ctx: &mut RunContext, values: Vec<(String, Value)>) -> Result<()> {
    let mut incoming = BTreeSet::new();
    for (key, _) in &values {
        if ctx.contains(key) || !incoming.insert(key.as_str()) {
            return Err(Error::DuplicateContextKey(key.clone()));
        }
    }
    for (key, value) in values {
        ctx.insert(key, value)?;
    }
    Ok(())
}

fn finish_failed(plan: &Plan, failure: StepFailure, observer: &mut dyn RunObserver) -> Outcome {
    let state = RunState::FailedAt(failure.step_index);
    tracing::warn!(
        plan = plan.name(),
        ?state,
        step = %failure.step_name,
        kind = %failure.kind,
        "{}",
        redact::redact_text(&failure.message)
    );
    observer.step_failed(&failure);
    Outcome::Failure {
        plan: plan.name().to_string(),
        failure,
    }
}

fn log_request(step: &CallStep, request: &HttpRequest) {
    tracing::info!(step = %step.name, "{} {}", request.method, request.url);
    for (name, value) in &request.headers {
        tracing::debug!(step = %step.name, "Header {}: {}", name, redact::redact_header(name, value));
    }
    if let Some(body) = &request.body {
        tracing::debug!(step = %step.name, "Body: {}", redact::redact_json(body));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::step::SuccessCheck;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned results and records every request it receives
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<std::result::Result<HttpResponse, TransportFailure>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<std::result::Result<HttpResponse, TransportFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportFailure> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::new("no scripted reply")))
        }
    }

    /// Never answers, so only the runner's timeout ends the call
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, TransportFailure> {
            std::future::pending().await
        }
    }

    fn ok(body: Value) -> std::result::Result<HttpResponse, TransportFailure> {
        Ok(HttpResponse::new(200, body))
    }

    fn runner(transport: Arc<dyn Transport>) -> Runner {
        Runner::new(transport, "http://api.test/", Duration::from_secs(5)).unwrap()
    }

    fn booking_plan() -> Plan {
        let steps = vec![
            CallStep::new("login", "Log in", |_| {
                Ok(RequestSpec::post("/api/auth/login").json(json!({"email": "a@b.test", "password": "pw"})))
            })
            .extract("token", ["data.token"]),
            CallStep::new("customer", "Fetch customer", |_| {
                Ok(RequestSpec::get("/api/customers/profile").bearer("token"))
            })
            .requires(["token"])
            .extract("customerId", ["data.customer.id"]),
            CallStep::new("tour", "Fetch tour", |ctx| {
                Ok(RequestSpec::get(format!("/api/tours/{}", ctx.text("tourId")?)).bearer("token"))
            })
            .requires(["token", "tourId"])
            .extract("tourName", ["data.tour.name"]),
            CallStep::new("schedule", "Fetch schedule", |ctx| {
                Ok(RequestSpec::get(format!("/api/schedules/{}", ctx.text("scheduleId")?)).bearer("token"))
            })
            .requires(["token", "scheduleId"])
            .extract("scheduleStart", ["data.schedule.startDate"]),
            CallStep::new("booking", "Create booking", |ctx| {
                Ok(RequestSpec::post("/api/bookings").bearer("token").json(json!({
                    "customerId": ctx.value("customerId")?,
                    "tourId": ctx.value("tourId")?,
                    "scheduleId": ctx.value("scheduleId")?,
                })))
            })
            .requires(["token", "customerId", "tourId", "scheduleId"])
            .extract("bookingId", ["data.booking._id", "data.booking.id"]),
        ];
        Plan::new("booking", steps, ["tourId", "scheduleId"]).unwrap()
    }

    fn seed() -> RunContext {
        RunContext::seeded([("tourId", json!("tour-1")), ("scheduleId", json!("sch-1"))]).unwrap()
    }

    fn happy_replies() -> Vec<std::result::Result<HttpResponse, TransportFailure>> {
        vec![
            ok(json!({"status": "success", "data": {"token": "T1"}})),
            ok(json!({"status": "success", "data": {"customer": {"id": "cust-1"}}})),
            ok(json!({"status": "success", "data": {"tour": {"name": "Ha Long Bay"}}})),
            ok(json!({"status": "success", "data": {"schedule": {"startDate": "2026-11-01"}}})),
            Ok(HttpResponse::new(201, json!({"status": "success", "data": {"booking": {"_id": "bk-77"}}}))),
        ]
    }

    #[tokio::test]
    async fn test_token_flows_into_bearer_header() {
        let transport = ScriptedTransport::new(happy_replies());
        let outcome = runner(transport.clone()).run(&booking_plan(), seed()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.context().get("token"), Some(&json!("T1")));

        let seen = transport.seen();
        assert_eq!(seen[0].header("authorization"), None);
        assert_eq!(seen[1].header("Authorization"), Some("Bearer T1"));
        assert_eq!(seen[1].url, "http://api.test/api/customers/profile");
    }

    #[tokio::test]
    async fn test_full_booking_chain_succeeds() {
        let transport = ScriptedTransport::new(happy_replies());
        let outcome = runner(transport.clone()).run(&booking_plan(), seed()).await;

        let Outcome::Success { context, steps, .. } = &outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(context["bookingId"], json!("bk-77"));
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[4].status, 201);

        let booking_request = &transport.seen()[4];
        let body = booking_request.body.as_ref().unwrap();
        assert_eq!(body["customerId"], "cust-1");
        assert_eq!(body["scheduleId"], "sch-1");
    }

    #[tokio::test]
    async fn test_not_found_is_application_error() {
        let mut replies = happy_replies();
        replies[2] = Ok(HttpResponse::new(404, json!({"status": "error", "message": "Tour not found"})));
        let transport = ScriptedTransport::new(replies);

        let outcome = runner(transport.clone()).run(&booking_plan(), seed()).await;
        let failure = outcome.failure().expect("run should fail");

        assert_eq!(failure.kind, FailureKind::ApplicationError);
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.step_name, "tour");
        assert!(failure.message.contains("Tour not found"));
        assert_eq!(outcome.state(), RunState::FailedAt(2));
    }

    #[tokio::test]
    async fn test_error_envelope_on_2xx_is_application_error() {
        let transport = ScriptedTransport::new(vec![ok(json!({"status": "error", "message": "Invalid credentials"}))]);

        let outcome = runner(transport).run(&booking_plan(), seed()).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::ApplicationError);
        assert_eq!(failure.status, Some(200));
        assert!(failure.message.contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_missing_field_is_extraction_error() {
        let mut replies = happy_replies();
        replies[1] = ok(json!({"status": "success", "data": {"user": {"id": "u-1"}}}));
        let transport = ScriptedTransport::new(replies);

        let outcome = runner(transport).run(&booking_plan(), seed()).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::ExtractionError);
        assert!(failure.message.contains("data.customer.id"));
        assert_eq!(failure.body.as_ref().unwrap()["data"]["user"]["id"], "u-1");
    }

    #[tokio::test]
    async fn test_transport_failure_stops_the_run() {
        let mut replies = happy_replies();
        replies[1] = Err(TransportFailure::new("connection refused"));
        let transport = ScriptedTransport::new(replies);

        let outcome = runner(transport.clone()).run(&booking_plan(), seed()).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::TransportError);
        assert_eq!(failure.status, None);
        assert_eq!(failure.completed.len(), 1);
        // Steps after the failure never reach the transport
        assert_eq!(transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_fast_at_every_position() {
        for failing in 0..5 {
            let mut replies = happy_replies();
            replies[failing] = Ok(HttpResponse::new(500, json!({"status": "error"})));
            let transport = ScriptedTransport::new(replies);

            let outcome = runner(transport.clone()).run(&booking_plan(), seed()).await;

            assert_eq!(outcome.state(), RunState::FailedAt(failing));
            assert_eq!(transport.seen().len(), failing + 1);
        }
    }

    #[tokio::test]
    async fn test_step_timeout_is_transport_error() {
        let plan = Plan::new(
            "slow",
            vec![
                CallStep::new("slow", "Never answers", |_| Ok(RequestSpec::get("/slow")))
                    .timeout(Duration::from_millis(50)),
                CallStep::new("after", "Must not run", |_| Ok(RequestSpec::get("/after"))),
            ],
            Vec::<String>::new(),
        )
        .unwrap();

        let outcome = runner(Arc::new(HangingTransport)).run(&plan, RunContext::new()).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::TransportError);
        assert!(failure.message.contains("timed out"));
        assert_eq!(failure.step_index, 0);
    }

    #[tokio::test]
    async fn test_identical_inputs_give_identical_outcomes() {
        let mut replies = happy_replies();
        replies[3] = ok(json!({"status": "success", "data": {}}));

        let first = runner(ScriptedTransport::new(replies.clone())).run(&booking_plan(), seed()).await;
        let second = runner(ScriptedTransport::new(replies)).run(&booking_plan(), seed()).await;

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_seed_value_reported_before_sending() {
        let transport = ScriptedTransport::new(happy_replies());
        let seed = RunContext::seeded([("scheduleId", json!("sch-1"))]).unwrap();

        let outcome = runner(transport.clone()).run(&booking_plan(), seed).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.step_name, "tour");
        assert_eq!(failure.kind, FailureKind::ExtractionError);
        assert!(failure.message.contains("tourId"));
        assert_eq!(transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_required_key_checked_even_when_builder_ignores_it() {
        let plan = Plan::new(
            "tours",
            vec![CallStep::new("needs-tour", "List tours", |_| Ok(RequestSpec::get("/tours"))).requires(["tourId"])],
            ["tourId"],
        )
        .unwrap();
        let transport = ScriptedTransport::new(vec![ok(json!({"status": "success"}))]);

        let outcome = runner(transport.clone()).run(&plan, RunContext::new()).await;
        let failure = outcome.failure().expect("run should fail");

        assert_eq!(failure.kind, FailureKind::ExtractionError);
        assert!(failure.message.contains("tourId"));
        assert!(transport.seen().is_empty());
    }

    #[tokio::test]
    async fn test_colliding_extraction_writes_nothing() {
        let plan = Plan::new(
            "pair",
            vec![CallStep::new("pair", "Fetch pair", |_| Ok(RequestSpec::get("/pair")))
                .extract("a", ["data.a"])
                .extract("b", ["data.b"])],
            Vec::<String>::new(),
        )
        .unwrap();
        let transport = ScriptedTransport::new(vec![ok(json!({"status": "success", "data": {"a": "x", "b": "y"}}))]);
        let seed = RunContext::seeded([("b", json!("seeded"))]).unwrap();

        let outcome = runner(transport).run(&plan, seed).await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::ExtractionError);
        assert!(!failure.context.contains_key("a"));
        assert_eq!(failure.context["b"], json!("seeded"));
        assert_eq!(failure.body.as_ref().unwrap()["data"]["a"], "x");
    }

    #[tokio::test]
    async fn test_http_status_check_ignores_envelope() {
        let plan = Plan::new(
            "plain",
            vec![CallStep::new("health", "Health check", |_| Ok(RequestSpec::get("/health")))
                .check(SuccessCheck::HttpStatus)],
            Vec::<String>::new(),
        )
        .unwrap();
        let transport = ScriptedTransport::new(vec![ok(json!("OK"))]);

        assert!(runner(transport).run(&plan, RunContext::new()).await.is_success());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = Runner::new(ScriptedTransport::new(Vec::new()), "localhost:3000", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_absolute_paths_bypass_base_url() {
        let runner = runner(ScriptedTransport::new(Vec::new()));
        let request = runner
            .resolve(RequestSpec::get("https://other.test/x"), &RunContext::new(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(request.url, "https://other.test/x");
    }
}
