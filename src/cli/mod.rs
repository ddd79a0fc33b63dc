//! CLI command handling
//!
//! Builds the configuration, turns each command into a plan, runs it and
//! reports the outcome. Returns the process exit code.

use crate::commands::{Commands, GlobalArgs};
use crate::common::{Config, Result};
use crate::flows::{self, keys, PaymentProvider};
use crate::report::{self, ConsoleReporter};
use crate::runner::{Outcome, Plan, RunContext, Runner};
use crate::scenario::Scenario;

use colored::Colorize;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, global: &GlobalArgs) -> Result<i32> {
    match command {
        Commands::Booking => {
            let config = load_config(global, None)?;
            let (plan, seed) = flows::booking_flow(&config)?;
            let outcome = execute(&config, &plan, seed, Some("Create a booking"), global).await?;
            Ok(outcome.exit_code())
        }

        Commands::Pay { provider } => {
            let provider: PaymentProvider = provider.parse()?;
            let config = load_config(global, None)?;
            let (plan, seed) = flows::payment_flow(&config, provider)?;
            let description = format!("Create a booking and pay with {}", provider);
            let outcome = execute(&config, &plan, seed, Some(&description), global).await?;
            Ok(outcome.exit_code())
        }

        Commands::Schema { path } => {
            let config = load_config(global, None)?;
            let (plan, seed) = flows::schema_flow(&config, &path)?;
            let outcome = execute(&config, &plan, seed, Some("Inspect response shape"), global).await?;

            if let (false, Some(sample)) = (global.json, outcome.context().get(keys::SAMPLE)) {
                println!("{} {}", "Shape of".cyan(), path.white().bold());
                for (field, kind) in flows::describe_shape(sample) {
                    println!("  {:<48} {}", field, kind.dimmed());
                }
                println!();
            }
            Ok(outcome.exit_code())
        }

        Commands::Run { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            let config = load_config(global, Some(&scenario))?;
            let plan = scenario.compile()?;
            let seed = scenario.resolve_seed(|name| std::env::var(name).ok())?;
            let outcome = execute(&config, &plan, seed, scenario.description.as_deref(), global).await?;
            Ok(outcome.exit_code())
        }

        Commands::Config => {
            let config = load_config(global, None)?;
            print!("{}", config.redacted().to_toml()?);
            Ok(0)
        }
    }
}

/// Layer configuration: file, environment, scenario, then command-line flags
fn load_config(global: &GlobalArgs, scenario: Option<&Scenario>) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    config.apply_env()?;

    if let Some(scenario) = scenario {
        if let Some(url) = &scenario.base_url {
            config.api.base_url = Some(url.clone());
        }
        if let Some(secs) = scenario.timeout_secs {
            config.api.timeout_secs = secs;
        }
    }

    if let Some(url) = &global.base_url {
        config.api.base_url = Some(url.clone());
    }
    if let Some(secs) = global.timeout {
        config.api.timeout_secs = secs;
    }
    config.validate()?;

    tracing::debug!(
        base_url = config.api.base_url.as_deref().unwrap_or("<unset>"),
        timeout_secs = config.api.timeout_secs,
        "Configuration loaded"
    );
    Ok(config)
}

/// Run a plan and report its outcome
async fn execute(
    config: &Config,
    plan: &Plan,
    seed: RunContext,
    description: Option<&str>,
    global: &GlobalArgs,
) -> Result<Outcome> {
    plan.check_seed(&seed)?;
    let runner = Runner::from_config(config)?;

    let outcome = if global.json {
        runner.run(plan, seed).await
    } else {
        let mut reporter = ConsoleReporter::new(plan.len(), global.verbose);
        reporter.header(plan.name(), description, runner.base_url());
        runner.run_observed(plan, seed, &mut reporter).await
    };

    if global.json {
        report::print_json(&outcome)?;
    } else {
        report::print_summary(&outcome);
    }
    if let Some(path) = &global.report {
        report::write_json(&outcome, path)?;
    }

    Ok(outcome)
}
