//! Reconciliation scenarios over realistic sacct exports

use sacct_reconcile::{reconcile, Classifier, Filters, ReconcileError};

mod common;
use common::{job_pair, realistic_export, OCEAN_JOB, OCEAN_STEP};

fn fre_filters(min_memory: u64) -> Filters {
    Filters::new()
        .with_required_substring("fre/")
        .with_min_memory(min_memory)
}

#[test]
fn test_ocean_run_pair() {
    let jobs = reconcile([OCEAN_JOB, OCEAN_STEP], &fre_filters(0), &Classifier::default()).unwrap();

    assert_eq!(jobs.len(), 1);
    let job = jobs.get("100").expect("job 100 reconciled");
    assert_eq!(job.memory, 512);
    assert_eq!(job.elapsed, 3600);
    assert_eq!(job.job_type, "ocean run");
    assert_eq!(job.name, "sim");
    assert_eq!(job.node, "node01");
    assert_eq!(job.end, "2023-02-01");
    assert_eq!(job.state, "COMPLETED");
    assert!(!jobs.contains_key("100.batch"));
}

#[test]
fn test_ocean_run_below_threshold() {
    let jobs =
        reconcile([OCEAN_JOB, OCEAN_STEP], &fre_filters(1000), &Classifier::default()).unwrap();
    assert!(jobs.is_empty());
}

#[test]
fn test_skipped_job_line_does_not_consume_step() {
    // The rejected line is followed directly by a qualifying job line; if the
    // rejected line swallowed a step, job 100 would be paired with the wrong line.
    let lines = [
        "99|bash|interactive|0|10|node02|2023-02-01|COMPLETED",
        OCEAN_JOB,
        OCEAN_STEP,
    ];
    let jobs = reconcile(lines, &fre_filters(0), &Classifier::default()).unwrap();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs.get("100").unwrap().memory, 512);
    assert!(!jobs.contains_key("99"));
}

#[test]
fn test_realistic_export() {
    let lines = realistic_export();
    let jobs = reconcile(&lines, &fre_filters(0), &Classifier::default()).unwrap();

    let ids: Vec<&str> = jobs.ids().collect();
    assert_eq!(ids, vec!["201", "203", "204", "205"]);

    assert_eq!(jobs.get("201").unwrap().job_type, "ocean run");
    assert_eq!(jobs.get("203").unwrap().job_type, "refineDiag_atmos");
    assert_eq!(jobs.get("204").unwrap().job_type, "mppnccombine.csh");
    assert_eq!(jobs.get("205").unwrap().job_type, "ice run");

    // 203.extern folds its step memory into 203
    assert_eq!(jobs.get("203").unwrap().memory, 4096);
    assert_eq!(jobs.get("203").unwrap().elapsed, 0);
    assert_eq!(jobs.get("204").unwrap().memory, 0);
}

#[test]
fn test_one_record_per_base_id() {
    let lines = realistic_export();
    let jobs = reconcile(&lines, &fre_filters(0), &Classifier::default()).unwrap();

    for id in jobs.ids() {
        assert!(!id.contains('.'), "suffixed id {} leaked into the map", id);
    }
}

#[test]
fn test_last_write_wins() {
    let mut lines = Vec::new();
    lines.extend(job_pair("1", "sim", "fre/a", "10K", "1"));
    lines.extend(job_pair("2", "sim", "fre/b", "20K", "1"));
    lines.extend(job_pair("1", "sim", "fre/c", "30K", "1"));

    let jobs = reconcile(&lines, &fre_filters(0), &Classifier::default()).unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs.get("1").unwrap().memory, 30);
    assert_eq!(jobs.get("1").unwrap().comment, "fre/c");
}

#[test]
fn test_fold_without_base_is_dropped() {
    let lines = [
        "7.extern|extern|fre/x|0|1|n|e|COMPLETED",
        "7.extern|extern||99K|1|n|e|COMPLETED",
    ];
    let jobs = reconcile(lines, &fre_filters(0), &Classifier::default()).unwrap();
    assert!(jobs.is_empty());
}

#[test]
fn test_empty_fields_normalize_to_zero() {
    let lines = job_pair("5", "sim", "fre/x", "", "");
    let jobs = reconcile(&lines, &Filters::new(), &Classifier::default()).unwrap();
    let job = jobs.get("5").unwrap();
    assert_eq!(job.memory, 0);
    assert_eq!(job.elapsed, 0);
}

#[test]
fn test_min_memory_is_monotonic() {
    let lines = realistic_export();
    let classifier = Classifier::default();

    let mut previous: Option<Vec<String>> = None;
    for threshold in [0, 1, 1024, 2048, 2049, 4096, 10_000] {
        let jobs = reconcile(&lines, &fre_filters(threshold), &classifier).unwrap();
        let ids: Vec<String> = jobs.ids().map(str::to_string).collect();
        for job in jobs.iter() {
            assert!(job.memory >= threshold);
        }
        if let Some(previous) = &previous {
            assert!(ids.iter().all(|id| previous.contains(id)));
        }
        previous = Some(ids);
    }
}

#[test]
fn test_no_substring_filter_pairs_every_line() {
    let lines = [OCEAN_JOB, OCEAN_STEP];
    let jobs = reconcile(lines, &Filters::new(), &Classifier::default()).unwrap();
    assert_eq!(jobs.len(), 1);
}

#[test]
fn test_extended_fields_carried() {
    let lines = [
        "300|sim|fre/x_run1|0|60|node03|2023-03-01|FAILED|1:0|jdoe",
        "300.batch|batch||128K|60|node03|2023-03-01|FAILED|1:0|",
    ];
    let jobs = reconcile(lines, &fre_filters(0), &Classifier::default()).unwrap();
    let job = jobs.get("300").unwrap();
    assert_eq!(job.exit_code.as_deref(), Some("1:0"));
    assert_eq!(job.user.as_deref(), Some("jdoe"));
}

#[test]
fn test_truncated_export_is_fatal() {
    let err = reconcile([OCEAN_JOB], &fre_filters(0), &Classifier::default()).unwrap_err();
    assert!(matches!(err, ReconcileError::TruncatedPair { line: 1, .. }));
    assert!(err.to_string().contains("no step line"));
}

#[test]
fn test_short_job_line_is_fatal() {
    let err = reconcile(
        ["100|sim|fre/ocean"],
        &fre_filters(0),
        &Classifier::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::FieldCount { line: 1, expected: 8, found: 3 }
    ));
}

#[test]
fn test_custom_classifier_rules() {
    use sacct_reconcile::classify::RuleSpec;

    let classifier = Classifier::from_specs(&[RuleSpec::new("sim", r"sim\w*", false)]).unwrap();
    let jobs = reconcile([OCEAN_JOB, OCEAN_STEP], &fre_filters(0), &classifier).unwrap();
    assert_eq!(jobs.get("100").unwrap().job_type, "sim");
}
