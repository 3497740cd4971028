use clap::Parser as ClapParser;
use shadefront::driver::{Cli, CompilerDriver};
use std::process::exit;

/// Parses command-line arguments and runs the driver.
fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut driver = CompilerDriver::new(cli);
    if let Err(e) = driver.run() {
        match e {
            shadefront::driver::DriverError::CompilationFailed => {}
            other => eprintln!("error: {}", other),
        }
        exit(1);
    }
}
