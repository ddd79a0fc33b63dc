//! Booking creation flow
//!
//! login -> fetch customer -> fetch tour -> fetch schedule -> create booking

use reqwest::Method;
use serde_json::{json, Map, Value};

use crate::common::config::{ENV_SCHEDULE_ID, ENV_TOUR_ID};
use crate::common::{Config, Error, Result};
use crate::runner::{CallStep, Plan, RequestSpec, RunContext};

use super::{endpoint_step, get_step, keys};

/// Plan and seed for the booking flow
pub fn booking_flow(config: &Config) -> Result<(Plan, RunContext)> {
    let plan = Plan::new("booking", booking_steps(config)?, [keys::TOUR_ID, keys::SCHEDULE_ID])?;
    Ok((plan, booking_seed(config)?))
}

/// Seed context: the tour and schedule to book
pub fn booking_seed(config: &Config) -> Result<RunContext> {
    let tour_id = config
        .fixtures
        .tour_id
        .clone()
        .ok_or(Error::MissingSetting("fixtures.tour_id", ENV_TOUR_ID))?;
    let schedule_id = config
        .fixtures
        .schedule_id
        .clone()
        .ok_or(Error::MissingSetting("fixtures.schedule_id", ENV_SCHEDULE_ID))?;

    RunContext::seeded([
        (keys::TOUR_ID, Value::String(tour_id)),
        (keys::SCHEDULE_ID, Value::String(schedule_id)),
    ])
}

/// The five booking steps, reusable as the prefix of longer flows
pub fn booking_steps(config: &Config) -> Result<Vec<CallStep>> {
    let endpoints = &config.endpoints;

    Ok(vec![
        login_step(config)?,
        get_step("customer", "Fetch customer profile", &endpoints.customer)?.extract(
            keys::CUSTOMER_ID,
            ["data.customer._id", "data.customer.id", "data._id", "data.id"],
        ),
        get_step("tour", "Fetch tour", &endpoints.tour)?
            .requires([keys::TOUR_ID])
            .extract(
                keys::TOUR_NAME,
                ["data.tour.name", "data.tour.title", "data.name", "data.title"],
            ),
        get_step("schedule", "Fetch schedule", &endpoints.schedule)?
            .requires([keys::SCHEDULE_ID])
            .extract(
                keys::SCHEDULE_START,
                [
                    "data.schedule.startDate",
                    "data.schedule.departureDate",
                    "data.startDate",
                    "data.departureDate",
                ],
            ),
        create_booking_step(config)?,
    ])
}

/// Log in with the configured credentials
///
/// The credentials are captured by the request builder, not stored in the
/// run context, so they never appear in reports.
pub fn login_step(config: &Config) -> Result<CallStep> {
    let (email, password) = config.login()?;
    let body = json!({ "email": email, "password": password });
    let path = config.endpoints.login.clone();

    Ok(
        CallStep::new("login", "Log in", move |_| Ok(RequestSpec::post(path.clone()).json(body.clone())))
            .extract(keys::TOKEN, ["data.token", "data.accessToken", "token"]),
    )
}

fn create_booking_step(config: &Config) -> Result<CallStep> {
    let booking = config.booking.clone();

    let mut contact = Map::new();
    for (field, value) in [
        ("fullName", &booking.contact_name),
        ("email", &booking.contact_email),
        ("phone", &booking.contact_phone),
    ] {
        if let Some(value) = value {
            contact.insert(field.to_string(), Value::String(value.clone()));
        }
    }

    let body = move |ctx: &RunContext| -> Result<Value> {
        let mut body = json!({
            "customerId": ctx.value(keys::CUSTOMER_ID)?,
            "tourId": ctx.value(keys::TOUR_ID)?,
            "scheduleId": ctx.value(keys::SCHEDULE_ID)?,
            "numberOfAdults": booking.adults,
            "numberOfChildren": booking.children,
        });
        if !contact.is_empty() {
            body["contactInfo"] = Value::Object(contact.clone());
        }
        if let Some(requests) = &booking.special_requests {
            body["specialRequests"] = Value::String(requests.clone());
        }
        Ok(body)
    };

    Ok(endpoint_step(
        "booking",
        "Create booking",
        Method::POST,
        &config.endpoints.booking,
        &[keys::CUSTOMER_ID, keys::TOUR_ID, keys::SCHEDULE_ID],
        Some(body),
    )?
    .extract(
        keys::BOOKING_ID,
        ["data.booking._id", "data.booking.id", "data._id", "data.id"],
    ))
}
