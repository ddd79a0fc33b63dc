//! Built-in call chains for the booking API
//!
//! Each flow turns the explicit [`Config`](crate::common::Config) into a
//! validated [`Plan`](crate::runner::Plan) plus its seed context. Endpoint
//! paths come from the `[endpoints]` config section and may use `{{key}}`
//! placeholders for any context key available at that step.

pub mod booking;
pub mod payment;
pub mod schema;

use reqwest::Method;
use serde_json::Value;

use crate::common::Result;
use crate::runner::{CallStep, RequestSpec, RunContext};
use crate::scenario::template;

pub use booking::{booking_flow, booking_steps};
pub use payment::{payment_flow, PaymentProvider};
pub use schema::{describe_shape, schema_flow};

/// Context keys shared between flows
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const CUSTOMER_ID: &str = "customerId";
    pub const TOUR_ID: &str = "tourId";
    pub const TOUR_NAME: &str = "tourName";
    pub const SCHEDULE_ID: &str = "scheduleId";
    pub const SCHEDULE_START: &str = "scheduleStart";
    pub const BOOKING_ID: &str = "bookingId";
    pub const PAYMENT_URL: &str = "paymentUrl";
    pub const APP_TRANS_ID: &str = "appTransId";
    pub const PAYMENT_STATUS: &str = "paymentStatus";
    pub const SAMPLE: &str = "sample";
}

/// Step whose path is an endpoint template and which authenticates with the login token
///
/// `body` builds the JSON body from the context; its reads must be listed
/// in `reads`.
fn endpoint_step<B>(
    name: &str,
    description: &str,
    method: Method,
    path: &str,
    reads: &[&str],
    body: Option<B>,
) -> Result<CallStep>
where
    B: Fn(&RunContext) -> Result<Value> + Send + Sync + 'static,
{
    let mut requires = template::placeholders(path)?;
    requires.push(keys::TOKEN.to_string());
    requires.extend(reads.iter().map(|k| k.to_string()));
    requires.sort();
    requires.dedup();

    let path = path.to_string();
    let step = CallStep::new(name, description, move |ctx| {
        let mut request = RequestSpec::new(method.clone(), template::render_str(&path, ctx)?).bearer(keys::TOKEN);
        if let Some(body) = &body {
            request = request.json(body(ctx)?);
        }
        Ok(request)
    });

    Ok(step.requires(requires))
}

/// `endpoint_step` for GET requests without a body
fn get_step(name: &str, description: &str, path: &str) -> Result<CallStep> {
    endpoint_step(name, description, Method::GET, path, &[], no_body())
}

/// Typed `None` for steps without a request body
fn no_body() -> Option<fn(&RunContext) -> Result<Value>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_step_requires_path_keys_and_token() {
        let step = get_step("tour", "Fetch tour", "/api/tours/{{tourId}}").unwrap();
        assert_eq!(step.requires, vec!["token", "tourId"]);

        let ctx = RunContext::seeded([("tourId", json!("t-9")), ("token", json!("T1"))]).unwrap();
        let request = (step.build)(&ctx).unwrap();
        assert_eq!(request.path, "/api/tours/t-9");
        assert_eq!(request.bearer.as_deref(), Some(keys::TOKEN));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_post_step_with_body() {
        let step = endpoint_step(
            "pay",
            "Pay",
            Method::POST,
            "/api/pay",
            &[keys::BOOKING_ID],
            Some(|ctx: &RunContext| -> Result<Value> { Ok(json!({ "bookingId": ctx.value(keys::BOOKING_ID)? })) }),
        )
        .unwrap();
        assert_eq!(step.requires, vec!["bookingId", "token"]);

        let ctx = RunContext::seeded([("bookingId", json!("bk-1")), ("token", json!("T1"))]).unwrap();
        let request = (step.build)(&ctx).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.unwrap()["bookingId"], "bk-1");
    }

    #[test]
    fn test_no_body_helper() {
        let step = endpoint_step("status", "Status", Method::GET, "/s/{{appTransId}}", &[], no_body()).unwrap();
        assert_eq!(step.requires, vec!["appTransId", "token"]);
    }
}
