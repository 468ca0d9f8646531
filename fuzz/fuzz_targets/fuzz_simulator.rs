#![no_main]

use libfuzzer_sys::fuzz_target;
use looptrace::{SimConfig, StepEvent, simulate};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Smaller limit, simulation is more expensive per byte
    if source.len() > 10_000 {
        return;
    }

    let config = SimConfig::default().with_max_steps(5_000).with_max_call_depth(64);
    let Ok(run) = simulate(source, &config) else {
        return;
    };

    assert!(run.trace.len() <= config.max_steps);
    assert_eq!(run.trace.get(0).map(|step| &step.event), Some(&StepEvent::Start));
    for step in &run.trace {
        assert!(step.call_stack.len() <= config.max_call_depth);
    }
});
