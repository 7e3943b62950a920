mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::{Call, ScriptedBackend};
use kjob_core::{DispatchConfig, Dispatcher, SubmitError};
use kjob_model::{JobTemplate, WorkItem};

const POLL: Duration = Duration::from_secs(5);

fn dispatcher(backend: &Arc<ScriptedBackend>, ceiling: usize) -> Dispatcher {
    let config = DispatchConfig::default()
        .with_ceiling(ceiling)
        .with_poll_interval(POLL);
    Dispatcher::new(backend.clone(), JobTemplate::new("worker:test"), config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn one_admission_per_requested_unit() {
    for n in [0usize, 1, 7] {
        let backend = Arc::new(ScriptedBackend::constant(0));
        let report = dispatcher(&backend, 3).run(n, CancellationToken::new()).await;

        assert!(report.is_done());
        assert_eq!(report.admissions, n);
        assert_eq!(report.observations, n);
        assert_eq!(report.submitted_indices(), (0..n).collect::<Vec<_>>());
        assert_eq!(backend.submit_calls(), n);
    }
}

#[tokio::test(start_paused = true)]
async fn first_submit_waits_for_count_below_ceiling() {
    let backend = Arc::new(ScriptedBackend::new(
        [Some(2), Some(2), Some(1), Some(0)],
        Some(0),
    ));
    let report = dispatcher(&backend, 2).run(2, CancellationToken::new()).await;

    assert_eq!(
        backend.calls(),
        vec![
            Call::Observed(2),
            Call::Observed(2),
            Call::Observed(1),
            Call::Submitted(0),
            Call::Observed(0),
            Call::Submitted(1),
        ]
    );
    assert!(report.is_done());
    // Two waits at the ceiling before the first admission.
    assert!(report.elapsed >= POLL * 2);
}

#[tokio::test(start_paused = true)]
async fn every_submit_follows_a_fresh_observation_below_ceiling() {
    let ceiling = 3;
    let script = [3, 4, 2, 3, 3, 0, 5, 1, 2, 9, 2, 0]
        .into_iter()
        .map(Some)
        .chain([None, None, Some(1)]);
    let backend = Arc::new(ScriptedBackend::new(script, Some(2)));
    let report = dispatcher(&backend, ceiling)
        .run(8, CancellationToken::new())
        .await;
    assert!(report.is_done());

    let mut last_observed: Option<usize> = None;
    for call in backend.calls() {
        match call {
            Call::Observed(c) => last_observed = Some(c),
            Call::ObserveFailed => last_observed = None,
            Call::Submitted(i) | Call::SubmitFailed(i) => {
                let c = last_observed
                    .take()
                    .unwrap_or_else(|| panic!("unit {i} submitted without a fresh observation"));
                assert!(c < ceiling, "unit {i} submitted while {c} jobs were active");
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failed_submission_is_abandoned_and_run_continues() {
    let backend = Arc::new(ScriptedBackend::constant(0).failing_submit(3));
    let report = dispatcher(&backend, 10).run(5, CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(report.admissions, 5);
    assert_eq!(report.submitted_indices(), vec![0, 1, 2, 4]);
    assert_eq!(report.abandoned_indices(), vec![3]);

    let abandoned = &report.abandoned[0];
    assert_eq!(abandoned.name.as_ref().map(|n| n.as_str()), Some("job-3"));
    assert!(matches!(abandoned.error, SubmitError::Conflict { .. }));

    // Never retried.
    let attempts_for_3 = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::SubmitFailed(3) | Call::Submitted(3)))
        .count();
    assert_eq!(attempts_for_3, 1);
}

#[tokio::test(start_paused = true)]
async fn failing_observation_never_submits() {
    let backend = Arc::new(ScriptedBackend::blind());
    let dispatcher = dispatcher(&backend, 10);
    let cancel = CancellationToken::new();

    let (report, _) = tokio::join!(dispatcher.run(3, cancel.clone()), async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
    });

    assert!(report.cancelled);
    assert!(!report.is_done());
    assert_eq!(report.admissions, 0);
    assert!(report.submitted.is_empty());
    assert!(report.abandoned.is_empty());
    assert_eq!(backend.submit_calls(), 0);
    assert!(report.observations >= 10);
    assert_eq!(report.observations, report.observe_failures);
}

#[tokio::test(start_paused = true)]
async fn observation_failure_retries_after_poll_interval() {
    let backend = Arc::new(ScriptedBackend::new([None, None], Some(0)));
    let report = dispatcher(&backend, 1).run(1, CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(report.observe_failures, 2);
    assert_eq!(report.observations, 3);
    assert_eq!(report.submitted_indices(), vec![0]);
    assert!(report.elapsed >= POLL * 2);
}

#[tokio::test(start_paused = true)]
async fn hung_observation_times_out_as_observe_error() {
    let backend = Arc::new(ScriptedBackend::constant(0).slow_first_observe(Duration::from_secs(3600)));
    let config = DispatchConfig::default()
        .with_poll_interval(POLL)
        .with_call_timeout(Duration::from_secs(2));
    let dispatcher =
        Dispatcher::new(backend.clone(), JobTemplate::default(), config).unwrap();

    let report = dispatcher.run(1, CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(report.observe_failures, 1);
    assert_eq!(report.submitted_indices(), vec![0]);
    assert!(report.elapsed < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn watch_notification_ends_the_wait_early() {
    let (tx, rx) = tokio::sync::watch::channel(1usize);
    let backend = Arc::new(ScriptedBackend::new([Some(1)], Some(0)).with_watch(rx));
    let config = DispatchConfig::default()
        .with_ceiling(1)
        .with_poll_interval(Duration::from_secs(3600));
    let dispatcher =
        Dispatcher::new(backend.clone(), JobTemplate::default(), config).unwrap();

    let (report, _) = tokio::join!(dispatcher.run(1, CancellationToken::new()), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(0).unwrap();
    });

    assert!(report.is_done());
    assert_eq!(report.submitted_indices(), vec![0]);
    assert!(report.elapsed < Duration::from_secs(3600));
    // The notification only ends the wait; admission still comes from a fresh count.
    assert_eq!(
        backend.calls(),
        vec![Call::Observed(1), Call::Observed(0), Call::Submitted(0)]
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_at_the_gate_leaves_remaining_units_unattempted() {
    let backend = Arc::new(ScriptedBackend::new([Some(0)], Some(1)));
    let dispatcher = dispatcher(&backend, 1);
    let cancel = CancellationToken::new();

    let (report, _) = tokio::join!(dispatcher.run(4, cancel.clone()), async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
    });

    assert!(report.cancelled);
    assert_eq!(report.submitted_indices(), vec![0]);
    assert!(report.abandoned.is_empty());
    assert_eq!(report.skipped(), 3);
}

#[tokio::test(start_paused = true)]
async fn invalid_job_names_are_abandoned_without_calling_the_backend() {
    let backend = Arc::new(ScriptedBackend::constant(0));
    let dispatcher = Dispatcher::new(
        backend.clone(),
        JobTemplate::default().with_prefix("Not_A_Label"),
        DispatchConfig::default(),
    )
    .unwrap();

    let report = dispatcher.run(2, CancellationToken::new()).await;

    assert!(report.is_done());
    assert_eq!(report.abandoned_indices(), vec![0, 1]);
    assert!(report.abandoned.iter().all(|a| a.name.is_none()));
    assert!(
        report
            .abandoned
            .iter()
            .all(|a| matches!(a.error, SubmitError::InvalidSpec(_)))
    );
    assert_eq!(backend.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn submitted_payload_carries_the_unit_id() {
    let backend = Arc::new(ScriptedBackend::constant(0));
    dispatcher(&backend, 5).run(3, CancellationToken::new()).await;

    let specs = backend.specs();
    assert_eq!(specs.len(), 3);
    for (i, spec) in specs.iter().enumerate() {
        assert_eq!(spec.name.as_str(), format!("job-{i}"));
        let item = WorkItem::from_message(spec.message().unwrap()).unwrap();
        assert_eq!(item.id, format!("id_{i}"));
    }
}

#[test]
fn zero_ceiling_is_refused_up_front() {
    let backend = Arc::new(ScriptedBackend::constant(0));
    let config = DispatchConfig::default().with_ceiling(0);
    assert!(Dispatcher::new(backend, JobTemplate::default(), config).is_err());
}
