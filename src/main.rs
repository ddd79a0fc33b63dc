//! Booking probe - verifies the booking/payment API by running dependent call chains
//!
//! Exit codes: 0 when every step passed, 1 when a step failed, 2 when the
//! run could not start.

use clap::Parser;
use booking_probe::cli;
use booking_probe::commands::{Commands, GlobalArgs};
use booking_probe::common::logging;

#[derive(Parser)]
#[command(name = "probe", about = "Dependent-call verification for the booking API")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match logging::init_cli(cli.global.verbose, cli.global.log_path().as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let code = match cli::dispatch(cli.command, &cli.global).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };

    // Flush the file logger before exiting
    drop(guard);
    std::process::exit(code);
}
