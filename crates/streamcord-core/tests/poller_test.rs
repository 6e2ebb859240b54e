#![allow(clippy::unwrap_used)]
// Scheduling, backoff and cancellation of the poll loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::{CATEGORY, FakeDirectory, FakeServer, RECENT_CHANNEL, STATUS_CHANNEL, Scripted};
use streamcord_core::format::NO_RECENT_MEDIA;
use streamcord_core::{
    CoreError, DisplayOptions, LibraryKind, LibrarySummary, MediaItem, PollConfig, Poller,
    ReconcileTargets, RecentKind,
};

fn targets() -> ReconcileTargets {
    ReconcileTargets {
        library_category: Some(CATEGORY),
        status_channel: STATUS_CHANNEL,
        recently_added_channel: RECENT_CHANNEL,
    }
}

fn poll(interval_secs: u64) -> PollConfig {
    PollConfig {
        interval: Duration::from_secs(interval_secs),
        ..PollConfig::default()
    }
}

fn poller(server: &Arc<FakeServer>, directory: &Arc<FakeDirectory>, display: DisplayOptions) -> Poller {
    Poller::new(
        server.clone(),
        directory.clone(),
        targets(),
        display,
        poll(15),
    )
}

/// Virtual time lands on millisecond ticks, so allow a little slack.
fn assert_gap(gap: Duration, secs: u64) {
    let expected = Duration::from_secs(secs);
    assert!(
        gap >= expected && gap < expected + Duration::from_millis(50),
        "expected ~{secs}s between cycles, got {gap:?}"
    );
}

/// Cancel `token` once the server has seen `cycles` session fetches.
fn cancel_after(server: &FakeServer, token: &CancellationToken, cycles: usize) {
    let token = token.clone();
    server.on_fetch(move |cycle| {
        if cycle >= cycles {
            token.cancel();
        }
    });
}

#[tokio::test(start_paused = true)]
async fn cycles_are_spaced_by_the_interval() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Ok(vec![])]));
    let directory = Arc::new(FakeDirectory::new());
    let cancel = CancellationToken::new();
    cancel_after(&server, &cancel, 3);

    poller(&server, &directory, DisplayOptions::default())
        .run(cancel)
        .await;

    let calls = server.calls();
    assert_eq!(calls.len(), 3);
    assert_gap(calls[1] - calls[0], 15);
    assert_gap(calls[2] - calls[1], 15);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_retries_after_short_backoff() {
    let server = Arc::new(FakeServer::new(vec![
        Scripted::Unreachable,
        Scripted::Ok(vec![]),
    ]));
    let directory = Arc::new(FakeDirectory::new());
    let cancel = CancellationToken::new();
    cancel_after(&server, &cancel, 3);

    poller(&server, &directory, DisplayOptions::default())
        .run(cancel)
        .await;

    let calls = server.calls();
    assert_gap(calls[1] - calls[0], 5);
    assert_gap(calls[2] - calls[1], 15);
    assert_eq!(directory.message_bodies(STATUS_CHANNEL).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_finishes_the_running_cycle() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Ok(vec![])]));
    let directory = Arc::new(FakeDirectory::new());
    let cancel = CancellationToken::new();
    cancel_after(&server, &cancel, 1);

    poller(&server, &directory, DisplayOptions::default())
        .run(cancel)
        .await;

    assert_eq!(server.calls().len(), 1);
    assert_eq!(directory.message_bodies(STATUS_CHANNEL).len(), 1);
    assert_eq!(
        directory.message_bodies(RECENT_CHANNEL),
        vec![NO_RECENT_MEDIA.to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_loop_runs_nothing() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Ok(vec![])]));
    let directory = Arc::new(FakeDirectory::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    poller(&server, &directory, DisplayOptions::default())
        .run(cancel)
        .await;

    assert!(server.calls().is_empty());
}

#[tokio::test]
async fn unreachable_server_fails_the_cycle_without_directory_calls() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Unreachable]));
    let directory = Arc::new(FakeDirectory::new());
    let mut poller = poller(&server, &directory, DisplayOptions::default());

    let err = poller.run_cycle().await.unwrap_err();

    assert!(matches!(err, CoreError::UpstreamUnavailable { .. }));
    assert!(err.is_cycle_level());
    assert!(directory.ops().is_empty());
}

#[tokio::test]
async fn library_channels_follow_the_display_switch() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Ok(vec![])]));
    server.set_libraries(vec![LibrarySummary::new("Movies", LibraryKind::Movies, 7)]);
    let directory = Arc::new(FakeDirectory::new());

    let mut off = poller(&server, &directory, DisplayOptions::default());
    let inputs = off.gather().await.unwrap();
    assert!(inputs.libraries.is_empty());
    off.run_cycle().await.unwrap();
    assert!(directory.channel_names(CATEGORY).is_empty());

    let display = DisplayOptions {
        show_library_counts: true,
        ..DisplayOptions::default()
    };
    let mut on = poller(&server, &directory, display);
    on.run_cycle().await.unwrap();
    assert_eq!(directory.channel_names(CATEGORY), vec!["🎬 Movies: 7".to_owned()]);
}

#[tokio::test]
async fn recently_added_failure_keeps_the_previous_message() {
    let server = Arc::new(FakeServer::new(vec![Scripted::Ok(vec![])]));
    server.set_recent(Some(vec![MediaItem {
        title: "Heat".into(),
        kind: RecentKind::Movie,
        added_label: "2h ago".into(),
    }]));
    let directory = Arc::new(FakeDirectory::new());
    let mut poller = poller(&server, &directory, DisplayOptions::default());

    poller.run_cycle().await.unwrap();
    let before = directory.message_bodies(RECENT_CHANNEL);
    assert_eq!(before, vec!["**🎬 Movies**\n• Heat (2h ago)".to_owned()]);

    server.set_recent(None);
    let inputs = poller.gather().await.unwrap();
    assert_eq!(inputs.recently_added, None);
    let report = poller.run_cycle().await.unwrap();

    assert_eq!(report.operations(), 0);
    assert_eq!(directory.message_bodies(RECENT_CHANNEL), before);
}
