//! Fuzz target for the budget split.
//!
//! Checks the split invariants over arbitrary validated budgets.

#![no_main]

use arbitrary::Arbitrary;
use dpb_core::{split_budget, validate_budget_parameters, Parameter};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    epsilon: f64,
    delta: f64,
    mechanisms: u8,
    threshold: f64,
}

fuzz_target!(|input: Input| {
    let params = [Parameter::F64(input.epsilon), Parameter::F64(input.delta)];
    let Ok((epsilon, delta)) = validate_budget_parameters(&params) else {
        return;
    };
    if !input.threshold.is_finite() || input.threshold <= 0.0 || input.mechanisms == 0 {
        return;
    }

    let n = usize::from(input.mechanisms);
    let split = split_budget(epsilon, delta, n, input.threshold).expect("validated budget");
    assert!(split.epsilon_per_mechanism <= input.threshold);
    assert!(split.delta_per_mechanism <= delta);
    assert_eq!(split.capped, epsilon >= input.threshold);
});
