//! Tests for the timeout race.

use std::time::Duration;

use subprocess_supervisor::subprocess::{output_channel, SubProcess, Termination};

use super::{as_strings, drain_within, is_alive, sh};

#[tokio::test(flavor = "multi_thread")]
async fn long_sleep_is_killed_at_timeout() {
    let (sink, output) = output_channel(4);
    let handle = SubProcess::new("sleep")
        .arg("10")
        .timeout(Duration::from_secs(1))
        .run(sink)
        .unwrap();
    let pid = handle.pid().unwrap();

    let (units, elapsed) = drain_within(output, Duration::from_secs(5)).await;
    assert!(units.is_empty());
    assert!(elapsed >= Duration::from_millis(900), "closed early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "closed late: {elapsed:?}");

    let outcome = handle.outcome().await.unwrap();
    assert_eq!(outcome.termination, Termination::TimedOut);
    assert_eq!(outcome.exit_code(), 124);
    assert!(!is_alive(pid));
}

#[tokio::test(flavor = "multi_thread")]
async fn output_before_timeout_is_delivered() {
    let (sink, output) = output_channel(4);
    let handle = sh("echo before; exec sleep 10")
        .timeout(Duration::from_millis(300))
        .run(sink)
        .unwrap();

    let (units, _) = drain_within(output, Duration::from_secs(5)).await;
    assert_eq!(as_strings(&units), ["before"]);
    assert_eq!(
        handle.outcome().await.unwrap().termination,
        Termination::TimedOut
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fast_process_beats_timeout() {
    let (sink, output) = output_channel(4);
    let handle = sh("echo quick")
        .timeout(Duration::from_millis(500))
        .run(sink)
        .unwrap();

    drain_within(output, Duration::from_secs(5)).await;
    let outcome = handle.outcome().await.unwrap();
    assert_eq!(outcome.termination, Termination::Exited);

    // The timer is gone; waiting past it changes nothing.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(
        handle.outcome().await.unwrap().termination,
        Termination::Exited
    );
}
