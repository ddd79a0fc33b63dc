//! Compiling scenario files into runner plans

use std::path::Path;
use std::time::Duration;

use reqwest::Method;

use crate::common::{Error, Result};
use crate::runner::{CallStep, Plan, RequestSpec, RunContext, SuccessCheck};

use super::config::{Scenario, ScenarioStep, SeedValue};
use super::template;

impl Scenario {
    /// Load and parse a scenario from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Build the validated plan for this scenario
    pub fn compile(&self) -> Result<Plan> {
        let steps = self
            .steps
            .iter()
            .map(|step| compile_step(&self.name, step))
            .collect::<Result<Vec<_>>>()?;

        Plan::new(self.name.clone(), steps, self.seed.keys().cloned())
    }

    /// Resolve seed values, reading `{ env: NAME }` entries through `lookup`
    pub fn resolve_seed<F>(&self, lookup: F) -> Result<RunContext>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ctx = RunContext::new();
        for (key, seed) in &self.seed {
            let value = match seed {
                SeedValue::Literal(value) => value.clone(),
                SeedValue::Env { env } => lookup(env).map(serde_json::Value::String).ok_or_else(|| {
                    Error::Config(format!("environment variable {} (seed '{}') is not set", env, key))
                })?,
            };
            ctx.insert(key.clone(), value)?;
        }
        Ok(ctx)
    }
}

fn compile_step(scenario: &str, step: &ScenarioStep) -> Result<CallStep> {
    let method = Method::from_bytes(step.method.to_uppercase().as_bytes()).map_err(|_| {
        Error::invalid_plan(scenario, format!("step '{}' has invalid method '{}'", step.name, step.method))
    })?;

    let mut requires = template::placeholders(&step.path)?;
    for value in step.query.values().chain(step.headers.values()) {
        requires.extend(template::placeholders(value)?);
    }
    if let Some(body) = &step.body {
        requires.extend(template::value_placeholders(body)?);
    }
    if let Some(auth) = &step.auth {
        requires.push(auth.clone());
    }
    requires.sort();
    requires.dedup();

    let spec = step.clone();
    let build = move |ctx: &RunContext| -> Result<RequestSpec> {
        let mut request = RequestSpec::new(method.clone(), template::render_str(&spec.path, ctx)?);
        for (name, value) in &spec.query {
            request = request.query(name.clone(), template::render_str(value, ctx)?);
        }
        for (name, value) in &spec.headers {
            request = request.header(name.clone(), template::render_str(value, ctx)?);
        }
        if let Some(body) = &spec.body {
            request = request.json(template::render_value(body, ctx)?);
        }
        if let Some(auth) = &spec.auth {
            request = request.bearer(auth.clone());
        }
        Ok(request)
    };

    let description = step.description.clone().unwrap_or_else(|| step.name.clone());
    let mut call = CallStep::new(step.name.clone(), description, build).requires(requires);

    for (key, paths) in &step.extract {
        call = call.extract(key.clone(), paths.to_vec());
    }

    if let Some(expect) = &step.expect {
        call = call.check(match &expect.status {
            Some(codes) => SuccessCheck::Statuses {
                codes: codes.clone(),
                envelope: expect.envelope,
            },
            None if expect.envelope => SuccessCheck::Envelope,
            None => SuccessCheck::HttpStatus,
        });
    }

    if let Some(secs) = step.timeout_secs {
        if secs == 0 {
            return Err(Error::invalid_plan(scenario, format!("step '{}' has a zero timeout", step.name)));
        }
        call = call.timeout(Duration::from_secs(secs));
    }

    Ok(call)
}
