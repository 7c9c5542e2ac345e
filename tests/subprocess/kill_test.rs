//! Tests for user-initiated kill.

use std::time::Duration;

use subprocess_supervisor::subprocess::{output_channel, SubProcess, Termination};

use super::{drain_within, is_alive, sh};

#[tokio::test(flavor = "multi_thread")]
async fn kill_mid_run_closes_sink_promptly() {
    let (sink, output) = output_channel(4);
    let handle = SubProcess::new("sleep")
        .arg("10")
        .timeout(Duration::from_secs(30))
        .run(sink)
        .unwrap();
    let pid = handle.pid().unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.kill();

    let (units, elapsed) = drain_within(output, Duration::from_secs(2)).await;
    assert!(units.is_empty());
    assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");

    let outcome = handle.outcome().await.unwrap();
    assert_eq!(outcome.termination, Termination::Killed);
    assert_eq!(outcome.exit_code(), 130);
    assert!(!is_alive(pid));
}

#[tokio::test(flavor = "multi_thread")]
async fn kill_fabricates_no_units() {
    let (sink, mut output) = output_channel(4);
    let handle = sh("echo first; exec sleep 10").run(sink).unwrap();

    let first = output.recv().await.unwrap();
    assert_eq!(&first[..], b"first");

    handle.kill();
    let rest = tokio::time::timeout(Duration::from_secs(2), output.recv())
        .await
        .unwrap();
    assert_eq!(rest, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn kill_after_completion_is_harmless() {
    let (sink, output) = output_channel(4);
    let handle = SubProcess::new("true").run(sink).unwrap();

    drain_within(output, Duration::from_secs(5)).await;
    let outcome = handle.outcome().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        handle.kill();
        handle.kill();
    })
    .await
    .unwrap();

    // The recorded outcome is not rewritten by a late kill.
    assert_eq!(
        handle.outcome().await.unwrap().termination,
        outcome.termination
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn kill_right_after_natural_exit_reports_exited() {
    for _ in 0..20 {
        let (sink, output) = output_channel(4);
        let handle = SubProcess::new("true").run(sink).unwrap();

        // Streams are closed but the child may not be reaped yet.
        output.collect_all().await;
        handle.kill();

        let outcome = handle.outcome().await.unwrap();
        assert_eq!(outcome.termination, Termination::Exited);
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.success());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_kill_while_running() {
    let (sink, output) = output_channel(4);
    let handle = SubProcess::new("sleep").arg("10").run(sink).unwrap();
    let other = handle.clone();

    handle.kill();
    other.kill();

    drain_within(output, Duration::from_secs(2)).await;
    assert_eq!(
        handle.outcome().await.unwrap().termination,
        Termination::Killed
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn kill_reaches_child_that_closed_its_pipes() {
    let (sink, output) = output_channel(4);
    let handle = sh("exec >/dev/null 2>&1; exec sleep 10")
        .timeout(Duration::from_secs(30))
        .run(sink)
        .unwrap();

    // Both streams end while the child keeps running.
    drain_within(output, Duration::from_secs(2)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());

    handle.kill();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle.outcome())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.termination, Termination::Killed);
}
