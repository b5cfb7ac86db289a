//! Runs the compute context handoff once.
//!
//! Without arguments this reproduces the observed behaviour: the worker's
//! execution context takes over the context and device, and the main
//! thread's release afterwards is a double release.

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use ocl_handoff::sim::SimRuntime;
use ocl_handoff::{DeviceType, ScenarioOptions, SharedRuntime, TeardownPolicy};
use simple_logger::SimpleLogger;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[clap(name = "ocl-handoff")]
#[clap(version, about, long_about = None)]
struct Cli {
    /// What the worker's execution context does with the handles on teardown.
    #[clap(long, value_enum, default_value_t = PolicyArg::Adopt)]
    policy: PolicyArg,
    /// Device type to enumerate on the first platform.
    #[clap(long, value_enum, default_value_t = DeviceTypeArg::Default)]
    device_type: DeviceTypeArg,
    /// Use the simulated runtime instead of the system's OpenCL loader.
    #[clap(long)]
    simulate: bool,
    /// Query reference counts after the worker exited. On by default only
    /// for the simulated runtime: against a driver the query touches the
    /// context before the release under test does.
    #[clap(long, conflicts_with = "no_probe")]
    probe: bool,
    /// Do not query reference counts after the worker exited.
    #[clap(long)]
    no_probe: bool,
    /// Log level, may be "off", "trace", "debug", "info" or "error".
    #[clap(long)]
    log: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Adopt,
    Borrow,
    Retain,
}

impl From<PolicyArg> for TeardownPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Adopt => TeardownPolicy::Adopt,
            PolicyArg::Borrow => TeardownPolicy::Borrow,
            PolicyArg::Retain => TeardownPolicy::Retain,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceTypeArg {
    Default,
    Cpu,
    Gpu,
    Accelerator,
    All,
}

impl From<DeviceTypeArg> for DeviceType {
    fn from(device_type: DeviceTypeArg) -> Self {
        match device_type {
            DeviceTypeArg::Default => DeviceType::Default,
            DeviceTypeArg::Cpu => DeviceType::Cpu,
            DeviceTypeArg::Gpu => DeviceType::Gpu,
            DeviceTypeArg::Accelerator => DeviceType::Accelerator,
            DeviceTypeArg::All => DeviceType::All,
        }
    }
}

fn logger_init(log_level: &Option<String>) {
    let log = log_level
        .as_ref()
        .and_then(|log| match log.to_lowercase().as_str() {
            "off" | "none" => Some(LevelFilter::Off),
            "trace" => Some(LevelFilter::Trace),
            "debug" => Some(LevelFilter::Debug),
            "info" => Some(LevelFilter::Info),
            "error" => Some(LevelFilter::Error),
            _ => None,
        })
        .unwrap_or(LevelFilter::Warn);
    if let Err(e) = SimpleLogger::new().with_level(log).init() {
        eprintln!("Logger already initialised: {e}");
    }
}

/// The runtime to run against, and whether it is the simulated one.
fn runtime(simulate: bool) -> (SharedRuntime, bool) {
    #[cfg(feature = "opencl")]
    if !simulate {
        return (Arc::new(ocl_handoff::native::OpenClRuntime::new()), false);
    }
    #[cfg(not(feature = "opencl"))]
    if !simulate {
        log::warn!("Built without the `opencl` feature; using the simulated runtime");
    }
    (
        Arc::new(SimRuntime::builder().platform("Simulated Platform", 1).build()),
        true,
    )
}

fn probe_reference_counts(cli: &Cli, simulated: bool) -> bool {
    match (cli.probe, cli.no_probe) {
        (true, _) => true,
        (_, true) => false,
        _ => simulated,
    }
}

fn main() {
    let cli = Cli::parse();
    logger_init(&cli.log);

    let (runtime, simulated) = runtime(cli.simulate);
    let options = ScenarioOptions {
        policy: cli.policy.into(),
        device_type: cli.device_type.into(),
        probe_reference_counts: probe_reference_counts(&cli, simulated),
    };
    log::info!("Running handoff with policy {}", options.policy);

    match ocl_handoff::run(runtime, &options) {
        Ok(report) if report.handles_survived() => {
            log::info!("Context and device survived the worker thread");
        }
        Ok(report) => {
            log::info!("Handoff finished: {report:?}");
        }
        Err(e) => {
            // Nothing up the stack could recover from a failed setup or a
            // failed release.
            log::error!("{e}");
            process::abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ocl-handoff").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn reference_counts_are_only_queried_on_the_simulator_by_default() {
        let cli = parse(&[]);
        assert!(probe_reference_counts(&cli, true));
        assert!(!probe_reference_counts(&cli, false));
    }

    #[test]
    fn explicit_flags_win() {
        assert!(probe_reference_counts(&parse(&["--probe"]), false));
        assert!(!probe_reference_counts(&parse(&["--no-probe"]), true));
        assert!(Cli::try_parse_from(["ocl-handoff", "--probe", "--no-probe"]).is_err());
    }
}
