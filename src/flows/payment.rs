//! Payment flows
//!
//! Both providers start with the full booking flow, then create a payment
//! for the new booking. ZaloPay additionally queries the order status by
//! its transaction id.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::{json, Value};

use crate::common::{Config, Error, Result};
use crate::runner::{CallStep, Plan, RunContext};

use super::booking::{booking_seed, booking_steps};
use super::{endpoint_step, get_step, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Momo,
    ZaloPay,
}

impl FromStr for PaymentProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "momo" => Ok(PaymentProvider::Momo),
            "zalopay" | "zalo" => Ok(PaymentProvider::ZaloPay),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentProvider::Momo => f.write_str("momo"),
            PaymentProvider::ZaloPay => f.write_str("zalopay"),
        }
    }
}

/// Plan and seed for booking followed by payment with `provider`
pub fn payment_flow(config: &Config, provider: PaymentProvider) -> Result<(Plan, RunContext)> {
    let mut steps = booking_steps(config)?;
    match provider {
        PaymentProvider::Momo => steps.push(momo_create_step(config)?),
        PaymentProvider::ZaloPay => {
            steps.push(zalopay_create_step(config)?);
            steps.push(zalopay_status_step(config)?);
        }
    }

    let plan = Plan::new(format!("payment-{}", provider), steps, [keys::TOUR_ID, keys::SCHEDULE_ID])?;
    Ok((plan, booking_seed(config)?))
}

fn payment_body(config: &Config) -> impl Fn(&RunContext) -> Result<Value> + Send + Sync + 'static {
    let return_url = config.payment.return_url.clone();
    move |ctx| {
        let mut body = json!({ "bookingId": ctx.value(keys::BOOKING_ID)? });
        if let Some(url) = &return_url {
            body["returnUrl"] = Value::String(url.clone());
        }
        Ok(body)
    }
}

fn momo_create_step(config: &Config) -> Result<CallStep> {
    Ok(endpoint_step(
        "momo-create",
        "Create MoMo payment",
        Method::POST,
        &config.endpoints.momo_create,
        &[keys::BOOKING_ID],
        Some(payment_body(config)),
    )?
    .extract(keys::PAYMENT_URL, ["data.payUrl", "data.paymentUrl", "payUrl"]))
}

fn zalopay_create_step(config: &Config) -> Result<CallStep> {
    Ok(endpoint_step(
        "zalopay-create",
        "Create ZaloPay order",
        Method::POST,
        &config.endpoints.zalopay_create,
        &[keys::BOOKING_ID],
        Some(payment_body(config)),
    )?
    .extract(keys::PAYMENT_URL, ["data.order_url", "data.orderUrl", "data.paymentUrl"])
    .extract(keys::APP_TRANS_ID, ["data.app_trans_id", "data.appTransId"]))
}

fn zalopay_status_step(config: &Config) -> Result<CallStep> {
    Ok(get_step("zalopay-status", "Query ZaloPay order status", &config.endpoints.zalopay_status)?
        .requires([keys::APP_TRANS_ID])
        .extract(
            keys::PAYMENT_STATUS,
            ["data.status", "data.return_code", "data.returnCode"],
        ))
}
