//! End-to-end bundle lifecycle tests.
//!
//! Covers:
//! - Construction and the fixed order of validation failures
//! - Checkpoint and restore, including via bytes and files
//! - Forwarding: accumulate, merge, report

use dpb_core::test_utils::{gated_sum_spec, sum_bundle_spec, sum_spec, test_registry};
use dpb_core::{
    assert_approx_eq, assert_err, assert_ok, BundleConfig, BundleFactory, BundleSpec, BundleState,
    DataType, Error, ErrorKind, MechanismSpec, Parameter,
};
use tempfile::TempDir;

#[test]
fn split_caps_epsilon_at_threshold() {
    let registry = test_registry();
    let bundle = assert_ok!(BundleFactory::new(&registry)
        .with_epsilon_threshold(1.0)
        .create(&sum_bundle_spec(&[1, 1, 1], 3.0, 0.0001)));

    assert_eq!(bundle.epsilon_per_mechanism(), 1.0);
    assert_approx_eq!(bundle.delta_per_mechanism(), 3.3333333e-5, 1e-12);
    assert!(bundle.budget().capped);
}

#[test]
fn split_divides_below_threshold() {
    let registry = test_registry();
    let bundle = assert_ok!(BundleFactory::new(&registry)
        .with_epsilon_threshold(1.0)
        .create(&sum_bundle_spec(&[1, 1, 1], 0.3, 0.0003)));

    assert_approx_eq!(bundle.epsilon_per_mechanism(), 0.1, 1e-12);
    assert_approx_eq!(bundle.delta_per_mechanism(), 0.0001, 1e-15);
    assert!(!bundle.budget().capped);
}

#[test]
fn negative_epsilon_message() {
    let registry = test_registry();
    let err = BundleFactory::new(&registry)
        .create(&sum_bundle_spec(&[1], -1.0, 0.0))
        .unwrap_err();
    assert_eq!(err.to_string(), "epsilon must be positive, but got -1");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn every_construction_failure_is_invalid_argument() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let specs = [
        BundleSpec::new().with_budget(1.0, 0.0),
        BundleSpec::new()
            .with_nested(MechanismSpec::new("missing"))
            .with_budget(1.0, 0.0),
        BundleSpec::new()
            .with_nested(MechanismSpec::new("plain_sum"))
            .with_budget(1.0, 0.0),
        BundleSpec::new().with_nested(sum_spec(1)).with_parameter(1.0),
        BundleSpec::new()
            .with_nested(sum_spec(1))
            .with_parameter("one")
            .with_parameter(0.0),
        BundleSpec::new()
            .with_nested(sum_spec(1))
            .with_parameter(1.0)
            .with_parameter("zero"),
        sum_bundle_spec(&[1], 0.0, 0.0),
        sum_bundle_spec(&[1], 1.0, 1.0),
        sum_bundle_spec(&[1], 1.0, -0.5),
    ];

    for spec in &specs {
        let err = factory.create(spec).unwrap_err();
        assert!(err.is_invalid_argument(), "{err}");
    }
}

#[test]
fn empty_nested_specs_reported_first() {
    let registry = test_registry();
    // Also wrong parameter count; the empty nested list wins.
    let spec = BundleSpec::new().with_parameter(1.0);
    assert_err!(
        BundleFactory::new(&registry).create(&spec),
        Error::EmptyNestedSpecs
    );
}

#[test]
fn first_failing_nested_spec_is_reported() {
    let registry = test_registry();
    let spec = BundleSpec::new()
        .with_nested(sum_spec(1))
        .with_nested(MechanismSpec::new("plain_sum"))
        .with_nested(MechanismSpec::new("missing"))
        .with_budget(1.0, 0.0);
    assert_err!(
        BundleFactory::new(&registry).create(&spec),
        Error::NotDifferentiallyPrivate { index: 1, .. }
    );
}

#[test]
fn parameter_type_errors_name_the_parameter() {
    let registry = test_registry();
    let spec = BundleSpec::new()
        .with_nested(sum_spec(1))
        .with_parameter(1.0)
        .with_parameter("tiny");
    let err = BundleFactory::new(&registry).create(&spec).unwrap_err();
    match err {
        Error::NonNumericParameter { name, dtype } => {
            assert_eq!(name, "delta");
            assert_eq!(dtype, DataType::String);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn integer_budget_parameters_accepted() {
    let registry = test_registry();
    let spec = BundleSpec::new()
        .with_nested(sum_spec(1))
        .with_nested(sum_spec(1))
        .with_parameter(Parameter::I32(4))
        .with_parameter(Parameter::I64(0));
    let bundle = assert_ok!(BundleFactory::new(&registry).create(&spec));
    assert_eq!(bundle.epsilon_per_mechanism(), 2.0);
    assert_eq!(bundle.delta_per_mechanism(), 0.0);
}

#[test]
fn checkpoint_round_trip_preserves_progress() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let spec = sum_bundle_spec(&[1, 2], 2.0, 1e-6);

    let mut bundle = assert_ok!(factory.create(&spec));
    bundle.accumulate(&[1.0, 2.0, 3.0]).unwrap();
    bundle.accumulate(&[4.0, 5.0, 6.0]).unwrap();
    let bytes = bundle.serialize_to_bytes().unwrap();

    let mut restored = assert_ok!(factory.restore_from_bytes(&spec, &bytes));
    assert_eq!(restored.total_inputs_seen(), 2);
    assert_eq!(restored.inputs_per_mechanism(), &[1, 2]);
    assert_eq!(restored.epsilon_per_mechanism(), bundle.epsilon_per_mechanism());
    assert_eq!(restored.delta_per_mechanism(), bundle.delta_per_mechanism());

    restored.accumulate(&[10.0, 0.0, 0.0]).unwrap();
    assert_eq!(restored.total_inputs_seen(), 3);

    let outputs = restored.report().unwrap();
    assert_eq!(outputs[0], 15.0);
    assert_eq!(outputs[3], 16.0);
}

#[test]
fn restored_budget_comes_from_spec_not_checkpoint() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let state = factory
        .create(&sum_bundle_spec(&[1], 1.0, 0.0))
        .unwrap()
        .serialize()
        .unwrap();

    let bundle = assert_ok!(factory.restore(&sum_bundle_spec(&[1], 4.0, 0.5), &state));
    assert_eq!(bundle.epsilon_per_mechanism(), 4.0);
    assert_eq!(bundle.delta_per_mechanism(), 0.5);
}

#[test]
fn restore_rejects_state_for_other_spec() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let state = BundleState::new(0);

    let err = factory
        .restore(&sum_bundle_spec(&[1], 1.0, 0.0), &state)
        .unwrap_err();
    assert_eq!(err.code(), 20);
}

#[test]
fn restore_rejects_corrupt_nested_blob() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let mut state = BundleState::new(3);
    state.push_nested(Some("dp_sum"), b"{broken".to_vec());

    let err = factory
        .restore(&sum_bundle_spec(&[1], 1.0, 0.0), &state)
        .unwrap_err();
    assert!(matches!(err, Error::Resolution { index: 0, .. }));
}

#[test]
fn restore_rejects_tampered_bytes() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let spec = sum_bundle_spec(&[1], 1.0, 0.0);
    let mut bundle = factory.create(&spec).unwrap();
    bundle.accumulate(&[1.0]).unwrap();

    let mut state = bundle.serialize().unwrap();
    state.nested[0].blob = br#"{"sum":99.0,"count":1,"min_contributions":0}"#.to_vec();
    let bytes = serde_json::to_vec(&state).unwrap();

    let err = factory.restore_from_bytes(&spec, &bytes).unwrap_err();
    assert_eq!(err.code(), 21);
}

#[test]
fn merge_combines_partial_aggregates() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let spec = sum_bundle_spec(&[1, 1], 1.0, 0.0);

    let mut left = factory.create(&spec).unwrap();
    let mut right = factory.create(&spec).unwrap();
    left.accumulate(&[1.0, 2.0]).unwrap();
    right.accumulate(&[3.0, 4.0]).unwrap();
    right.accumulate(&[5.0, 6.0]).unwrap();

    assert_ok!(left.merge_with(right));
    assert_eq!(left.total_inputs_seen(), 3);

    let outputs = left.report().unwrap();
    assert_eq!(outputs[0], 9.0);
    assert_eq!(outputs[3], 12.0);
}

#[test]
fn merge_rejects_different_budget() {
    let registry = test_registry();
    let factory = BundleFactory::new(&registry);
    let mut left = factory.create(&sum_bundle_spec(&[1], 1.0, 0.0)).unwrap();
    let right = factory.create(&sum_bundle_spec(&[1], 2.0, 0.0)).unwrap();

    assert!(!left.is_compatible(&right));
    assert_err!(left.merge_with(right), Error::Incompatible(_));
}

#[test]
fn report_requires_every_nested_mechanism_ready() {
    let registry = test_registry();
    let spec = BundleSpec::new()
        .with_nested(sum_spec(1))
        .with_nested(gated_sum_spec(1, 2))
        .with_budget(1.0, 0.0);
    let factory = BundleFactory::new(&registry);

    let mut bundle = factory.create(&spec).unwrap();
    bundle.accumulate(&[1.0, 1.0]).unwrap();
    assert!(!bundle.can_report());
    let err = bundle.report().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FailedPrecondition);

    let mut bundle = factory.create(&spec).unwrap();
    bundle.accumulate(&[1.0, 1.0]).unwrap();
    bundle.accumulate(&[1.0, 1.0]).unwrap();
    assert!(bundle.can_report());
    assert_eq!(bundle.report().unwrap().len(), 6);
}

#[test]
fn spec_and_config_load_from_files() {
    let dir = TempDir::new().unwrap();
    let spec_path = dir.path().join("spec.json");
    let config_path = dir.path().join("bundle.json");

    let spec = sum_bundle_spec(&[1, 1], 10.0, 0.001);
    std::fs::write(&spec_path, serde_json::to_string_pretty(&spec).unwrap()).unwrap();
    std::fs::write(
        &config_path,
        r#"{"schema_version": "1.0.0", "epsilon_threshold": 2.0}"#,
    )
    .unwrap();

    let loaded = assert_ok!(BundleSpec::from_file(&spec_path));
    assert_eq!(loaded, spec);

    let config = assert_ok!(BundleConfig::from_file(&config_path));
    let registry = test_registry();
    let bundle = assert_ok!(BundleFactory::with_config(&registry, &config).create(&loaded));
    assert_eq!(bundle.epsilon_per_mechanism(), 2.0);
    assert_approx_eq!(bundle.delta_per_mechanism(), 0.0005, 1e-15);
}

#[test]
fn missing_spec_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = BundleSpec::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.code(), 41);
}
