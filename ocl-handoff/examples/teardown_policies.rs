//! Example running the context handoff under every teardown policy.
//!
//! Uses the simulated runtime, so it runs without a GPU and shows what a
//! memory sanitizer would report against a real driver.

use ocl_handoff::sim::SimRuntime;
use ocl_handoff::{run, ScenarioOptions, TeardownPolicy};
use std::sync::Arc;

fn handoff(policy: TeardownPolicy) {
    let sim = SimRuntime::builder().platform("Simulated Platform", 1).build();

    let result = run(
        Arc::new(sim.clone()),
        &ScenarioOptions {
            policy,
            ..Default::default()
        },
    );

    match result {
        Ok(report) => println!(
            "  context refs after join: {:?}, device refs after join: {:?}",
            report.context_refs_after_join, report.device_refs_after_join
        ),
        Err(e) => println!("  cleanup failed: {e}"),
    }

    let findings = sim.findings();
    if findings.is_empty() {
        println!("  no invalid accesses");
    }
    for finding in findings {
        println!(
            "  {} on {} {:#x} in {}",
            finding.kind, finding.object, finding.handle, finding.call
        );
    }
}

fn main() {
    println!("Compute Context Handoff");
    println!("=======================");

    for policy in [
        TeardownPolicy::Adopt,
        TeardownPolicy::Borrow,
        TeardownPolicy::Retain,
    ] {
        println!("\nPolicy `{policy}`:");
        handoff(policy);
    }
}
