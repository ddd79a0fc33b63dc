//! Validated, ordered step lists

use std::collections::HashSet;

use crate::common::{Error, Result};

use super::context::RunContext;
use super::step::CallStep;

/// An ordered list of steps whose dependencies have been checked
///
/// Construction guarantees that step names are unique, that no two steps
/// (and no step and the seed) write the same context key, and that every
/// key a step requires is produced before it runs.
#[derive(Debug, Clone)]
pub struct Plan {
    name: String,
    steps: Vec<CallStep>,
    seed_keys: Vec<String>,
}

impl Plan {
    pub fn new<I, S>(name: impl Into<String>, steps: Vec<CallStep>, seed_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let seed_keys: Vec<String> = seed_keys.into_iter().map(Into::into).collect();

        if steps.is_empty() {
            return Err(Error::invalid_plan(&name, "plan has no steps"));
        }

        let mut available: HashSet<&str> = HashSet::new();
        for key in &seed_keys {
            if !available.insert(key.as_str()) {
                return Err(Error::invalid_plan(&name, format!("seed key '{}' listed twice", key)));
            }
        }

        let mut names: HashSet<&str> = HashSet::new();
        for step in &steps {
            if !names.insert(step.name.as_str()) {
                return Err(Error::invalid_plan(&name, format!("duplicate step name '{}'", step.name)));
            }

            if let Some(missing) = step.requires.iter().find(|k| !available.contains(k.as_str())) {
                return Err(Error::invalid_plan(
                    &name,
                    format!(
                        "step '{}' requires '{}', which no earlier step or seed provides",
                        step.name, missing
                    ),
                ));
            }

            for key in step.provides() {
                if !available.insert(key) {
                    return Err(Error::invalid_plan(
                        &name,
                        format!("step '{}' writes '{}', which is already provided", step.name, key),
                    ));
                }
            }
        }

        Ok(Self {
            name,
            steps,
            seed_keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[CallStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check that `seed` carries exactly the declared seed keys' values
    pub fn check_seed(&self, seed: &RunContext) -> Result<()> {
        if let Some(missing) = self.seed_keys.iter().find(|k| !seed.contains(k)) {
            return Err(Error::MissingContextValue(missing.clone()));
        }
        if let Some(extra) = seed.keys().find(|k| !self.seed_keys.iter().any(|s| s == k)) {
            return Err(Error::invalid_plan(
                &self.name,
                format!("seed value '{}' is not declared by the plan", extra),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::step::RequestSpec;
    use serde_json::json;

    fn step(name: &str) -> CallStep {
        CallStep::new(name, name, |_| Ok(RequestSpec::get("/")))
    }

    #[test]
    fn test_valid_chain() {
        let plan = Plan::new(
            "chain",
            vec![
                step("login").extract("token", ["data.token"]),
                step("profile").requires(["token"]).extract("customerId", ["data.id"]),
                step("tour").requires(["token", "tourId"]),
            ],
            ["tourId"],
        )
        .unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.name(), "chain");
    }

    #[test]
    fn test_requires_must_be_provided_earlier() {
        let err = Plan::new(
            "order",
            vec![
                step("profile").requires(["token"]),
                step("login").extract("token", ["data.token"]),
            ],
            Vec::<String>::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("requires 'token'"));
    }

    #[test]
    fn test_duplicate_writer_rejected() {
        let err = Plan::new(
            "dup",
            vec![
                step("a").extract("id", ["data.id"]),
                step("b").extract("id", ["data.id"]),
            ],
            Vec::<String>::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("writes 'id'"));
    }

    #[test]
    fn test_step_cannot_overwrite_seed() {
        let result = Plan::new("seed", vec![step("a").extract("tourId", ["data.id"])], ["tourId"]);
        assert!(matches!(result, Err(Error::InvalidPlan { .. })));
    }

    #[test]
    fn test_duplicate_step_names_rejected() {
        let result = Plan::new("names", vec![step("a"), step("a")], Vec::<String>::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!(Plan::new("empty", Vec::new(), Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_check_seed() {
        let plan = Plan::new("seeded", vec![step("a").requires(["tourId"])], ["tourId"]).unwrap();

        assert!(plan.check_seed(&RunContext::seeded([("tourId", json!("t"))]).unwrap()).is_ok());
        assert!(matches!(
            plan.check_seed(&RunContext::new()),
            Err(Error::MissingContextValue(_))
        ));
        let extra = RunContext::seeded([("tourId", json!("t")), ("other", json!(1))]).unwrap();
        assert!(plan.check_seed(&extra).is_err());
    }
}
