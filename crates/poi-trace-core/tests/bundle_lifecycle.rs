//! End-to-end bundle lifecycle scenarios

use poi_trace_core::{
    empty_tree_hash, sign_bundle, verify_bundle, verify_bundle_signature, verify_merkle_proof,
    Ed25519Signer, EventInput, Outcome, SpanInput, TraceBundle, TraceError, TraceRun, Visibility,
};

#[test]
fn empty_run_finalizes_to_valid_bundle() {
    let mut run = TraceRun::new("agent-empty");
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    assert_eq!(bundle.merkle_root, empty_tree_hash());
    assert_eq!(bundle.public_view.total_events, 0);
    assert_eq!(bundle.public_view.total_spans, 0);

    let report = verify_bundle(&bundle);
    assert!(report.valid);
    assert_eq!(report.warnings, vec!["No public spans present"]);
}

#[test]
fn public_span_with_mixed_events() {
    let mut run = TraceRun::new("agent-mixed");
    let span = run
        .add_span(SpanInput::new("shell").visibility(Visibility::Public))
        .unwrap();
    run.add_event(&span, EventInput::command("git status")).unwrap();
    run.add_event(&span, EventInput::command("git diff")).unwrap();
    run.add_event(&span, EventInput::output("diff --git a/x b/x")).unwrap();
    run.close_span(&span, Outcome::Completed).unwrap();
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    // Two public command events disclosed, the private output redacted
    assert_eq!(bundle.public_view.public_spans.len(), 1);
    assert_eq!(bundle.public_view.public_spans[0].events.len(), 2);
    assert_eq!(bundle.private_run.events.len(), 3);
    assert!(verify_bundle(&bundle).valid);
}

#[test]
fn tampered_event_hash_fails_verification() {
    let mut run = TraceRun::new("agent-tamper");
    let span = run
        .add_span(SpanInput::new("work").visibility(Visibility::Public))
        .unwrap();
    run.add_event(&span, EventInput::command("make")).unwrap();
    run.close_span(&span, Outcome::Completed).unwrap();
    run.finish(Outcome::Completed).unwrap();
    let mut bundle = run.finalize().unwrap();

    bundle.private_run.events[0].hash = "0".repeat(64);
    let report = verify_bundle(&bundle);
    assert!(!report.valid);
    assert!(!report.checks.event_hashes_valid);
    assert!(report.errors.iter().any(|e| e.contains("Event hash mismatch")));
}

#[test]
fn secret_only_bundle_is_valid_but_fully_redacted() {
    let mut run = TraceRun::new("agent-secret");
    for name in ["stage-1", "stage-2"] {
        let span = run
            .add_span(SpanInput::new(name).visibility(Visibility::Secret))
            .unwrap();
        run.add_event(&span, EventInput::decision("redacted step")).unwrap();
        run.close_span(&span, Outcome::Completed).unwrap();
    }
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    assert!(bundle.public_view.public_spans.is_empty());
    assert_eq!(bundle.public_view.redacted_span_hashes.len(), 2);
    let report = verify_bundle(&bundle);
    assert!(report.valid);
    assert_eq!(report.warnings, vec!["No public spans present"]);
}

#[test]
fn ledger_error_taxonomy() {
    let mut run = TraceRun::new("agent-errors");

    assert!(matches!(
        run.add_event("span-nope", EventInput::command("ls")),
        Err(TraceError::UnknownSpan(_))
    ));
    assert!(matches!(
        run.add_span(SpanInput::new("child").parent("span-nope")),
        Err(TraceError::InvalidParent(_))
    ));

    let span = run.add_span(SpanInput::new("work")).unwrap();
    run.close_span(&span, Outcome::Cancelled).unwrap();
    assert!(matches!(
        run.add_event(&span, EventInput::command("ls")),
        Err(TraceError::SpanClosed(_))
    ));

    // Finalizing a running run is rejected; the caller finishes it first
    let running = TraceRun::new("agent-running");
    assert!(matches!(running.finalize(), Err(TraceError::InvalidRunStatus)));

    run.finish(Outcome::Failed).unwrap();
    assert!(matches!(
        run.add_span(SpanInput::new("late")),
        Err(TraceError::AlreadyFinalized)
    ));
}

#[test]
fn public_view_accessor_is_pure() {
    let mut run = TraceRun::new("agent-view");
    let span = run
        .add_span(SpanInput::new("work").visibility(Visibility::Public))
        .unwrap();
    run.add_event(&span, EventInput::observation("ok")).unwrap();
    run.close_span(&span, Outcome::Completed).unwrap();
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    // The accessor returns exactly what finalization produced
    let via_accessor = bundle.public_view().clone();
    assert_eq!(via_accessor, bundle.public_view);
    assert_eq!(via_accessor.root_hash, bundle.root_hash);
    assert_eq!(via_accessor.merkle_root, bundle.merkle_root);
}

#[test]
fn bundle_proofs_cover_every_event() {
    let mut run = TraceRun::new("agent-proofs");
    let span = run
        .add_span(SpanInput::new("work").visibility(Visibility::Public))
        .unwrap();
    for i in 0..5 {
        run.add_event(&span, EventInput::command(format!("step-{i}"))).unwrap();
    }
    run.close_span(&span, Outcome::Completed).unwrap();
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    let tree = bundle.merkle_tree();
    assert_eq!(tree.root_hash, bundle.merkle_root);
    for i in 0..5 {
        let proof = tree.proof(i).unwrap();
        assert!(verify_merkle_proof(&proof));
        assert_eq!(proof.root_hash, bundle.merkle_root);
    }
}

#[test]
fn signed_bundle_roundtrips_through_json() {
    let mut run = TraceRun::new("agent-json");
    let span = run
        .add_span(SpanInput::new("work").visibility(Visibility::Public))
        .unwrap();
    run.add_event(&span, EventInput::command("ls")).unwrap();
    run.close_span(&span, Outcome::Completed).unwrap();
    run.finish(Outcome::Completed).unwrap();
    let bundle = run.finalize().unwrap();

    let signer = Ed25519Signer::generate("release-key");
    let signed = sign_bundle(&bundle, &signer).unwrap();

    let bytes = signed.to_json_vec().unwrap();
    let restored = TraceBundle::from_json_slice(&bytes).unwrap();
    assert_eq!(restored, signed);

    // Both the content checks and the signature survive the round-trip
    assert!(verify_bundle(&restored).valid);
    assert!(verify_bundle_signature(&restored, &signer).unwrap());
}

#[test]
fn malformed_bundle_bytes_fail_fast() {
    assert!(matches!(
        TraceBundle::from_json_slice(b"not json"),
        Err(TraceError::MalformedBundle(_))
    ));
    assert!(matches!(
        TraceBundle::from_json_slice(br#"{"formatVersion":"1.0","merkleRoot":"x"}"#),
        Err(TraceError::MalformedBundle(_))
    ));
}
