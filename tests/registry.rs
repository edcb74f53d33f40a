//! End-to-end registry behavior driven through `StaticFeed`

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use courtside::feed::{RawAction, StaticFeed};
use courtside::registry::{Delivery, RegistryConfig, SessionRegistry, TeamLabels};

const INTERVAL: Duration = Duration::from_millis(100);

fn action(value: Value) -> RawAction {
    serde_json::from_value(value).unwrap()
}

fn shot(number: u64, time: &str, person: u64, team: &str, result: &str) -> RawAction {
    action(json!({
        "actionNumber": number,
        "clock": "PT07M41.00S",
        "timeActual": time,
        "period": 1,
        "teamTricode": team,
        "personId": person,
        "playerName": format!("Player {}", person),
        "playerNameI": format!("P. {}", person),
        "x": 12.5,
        "y": 40.1,
        "shotResult": result,
        "actionType": "2pt",
        "subType": "Jump Shot",
        "description": format!("P. {} 12' Jump Shot", person),
        "scoreHome": "10",
        "scoreAway": 8,
    }))
}

fn substitution(number: u64, time: &str, person: u64, team: &str, direction: &str) -> RawAction {
    action(json!({
        "actionNumber": number,
        "timeActual": time,
        "period": 1,
        "teamTricode": team,
        "personId": person,
        "actionType": "substitution",
        "subType": direction,
    }))
}

fn registry(feed: &Arc<StaticFeed>) -> SessionRegistry<StaticFeed> {
    SessionRegistry::with_config(
        Arc::clone(feed),
        RegistryConfig::default().poll_interval(INTERVAL),
    )
}

async fn next_poll() {
    tokio::time::sleep(INTERVAL).await;
}

fn sequence(delivery: &Delivery) -> Option<u64> {
    delivery.event().map(|event| event.sequence)
}

#[tokio::test(start_paused = true)]
async fn test_scenario_pop_in_order_across_polls() {
    let feed = Arc::new(StaticFeed::new());
    let registry = registry(&feed);

    registry.start("board", "0022400061", None).await.unwrap();
    tokio::time::sleep(INTERVAL / 2).await;

    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::Reset);
    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::NoContent);

    feed.set_actions(vec![
        shot(4, "2024-10-22T23:42:10.3Z", 1, "BOS", "Made"),
        shot(7, "2024-10-22T23:42:40.1Z", 2, "NYK", "Missed"),
        shot(9, "2024-10-22T23:43:05.7Z", 3, "BOS", "Made"),
    ]);
    next_poll().await;

    for expected in 1..=3 {
        let delivery = registry.pop("board", "tv").await.unwrap();
        assert_eq!(sequence(&delivery), Some(expected));
    }
    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::NoContent);

    feed.push_actions([shot(12, "2024-10-22T23:44:00.0Z", 4, "NYK", "Made")]);
    next_poll().await;

    let delivery = registry.pop("board", "tv").await.unwrap();
    let event = delivery.event().unwrap();
    assert_eq!(event.sequence, 4);
    assert_eq!(event.player, "P. 4");
    assert_eq!(event.score_home, "10");
    assert_eq!(event.score_away, "8");
    assert_eq!(event.clock, "07:41");
    assert_eq!(event.game_id, "0022400061");

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_snapshot_is_idempotent() {
    let feed = Arc::new(StaticFeed::with_actions(vec![
        shot(1, "2024-10-22T23:42:10.3Z", 1, "BOS", "Made"),
        substitution(2, "2024-10-22T23:42:20.0Z", 5, "BOS", "in"),
        shot(3, "2024-10-22T23:42:40.1Z", 2, "NYK", "Missed"),
    ]));
    let registry = registry(&feed);
    registry.start("board", "0022400061", None).await.unwrap();

    // Many polls over an unchanged snapshot
    for _ in 0..5 {
        next_poll().await;
    }

    let stats = registry.session_stats("board").await.unwrap();
    assert!(stats.polls >= 5);
    assert_eq!(stats.shots_ingested, 2);
    assert_eq!(stats.roster_changes, 1);
    assert_eq!(stats.duplicates_skipped, 2 * (stats.polls - 1));

    let mut seen = Vec::new();
    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::Reset);
    while let Some(seq) = sequence(&registry.pop("board", "tv").await.unwrap()) {
        seen.push(seq);
    }
    assert_eq!(seen, vec![1, 2]);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pop_order_strictly_increasing_with_interleaved_ingestion() {
    let feed = Arc::new(StaticFeed::new());
    let registry = registry(&feed);
    registry.start("board", "0022400061", None).await.unwrap();
    tokio::time::sleep(INTERVAL / 2).await;
    registry.pop("board", "a").await.unwrap();

    let mut last = 0;
    let mut delivered = 0;
    for round in 0..6u64 {
        feed.push_actions((0..3).map(|i| {
            let minute = round * 3 + i;
            shot(
                minute,
                &format!("2024-10-22T23:{:02}:00Z", minute),
                100 + i,
                "BOS",
                "Made",
            )
        }));

        // Consume a little between polls so reads interleave with ingestion
        if let Some(seq) = sequence(&registry.pop("board", "a").await.unwrap()) {
            assert!(seq > last);
            last = seq;
            delivered += 1;
        }
        next_poll().await;
    }

    while let Some(seq) = sequence(&registry.pop("board", "a").await.unwrap()) {
        assert!(seq > last);
        last = seq;
        delivered += 1;
    }
    assert_eq!(delivered, 18);
    assert_eq!(last, 18);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_leaves_one_poller() {
    let feed = Arc::new(StaticFeed::with_actions(vec![
        shot(1, "2024-10-22T23:42:10.3Z", 1, "BOS", "Made"),
        shot(2, "2024-10-22T23:42:40.1Z", 2, "NYK", "Missed"),
    ]));
    let registry = registry(&feed);

    registry.start("board", "0022400061", None).await.unwrap();
    registry.start("board", "0022400061", None).await.unwrap();
    assert_eq!(registry.poller_count().await, 1);

    tokio::time::sleep(INTERVAL / 2).await;
    let before = feed.fetch_count();
    for _ in 0..10 {
        next_poll().await;
    }
    // One poller means one fetch per interval
    assert_eq!(feed.fetch_count() - before, 10);

    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::Reset);
    let mut seen = Vec::new();
    while let Some(seq) = sequence(&registry.pop("board", "tv").await.unwrap()) {
        seen.push(seq);
    }
    assert_eq!(seen, vec![1, 2]);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_starts_leave_one_poller() {
    let feed = Arc::new(StaticFeed::new());
    let registry = Arc::new(registry(&feed));

    let starts: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .start("board", &format!("game-{}", i), None)
                    .await
                    .unwrap()
            })
        })
        .collect();
    for start in starts {
        start.await.unwrap();
    }

    assert_eq!(registry.session_count().await, 1);
    assert_eq!(registry.poller_count().await, 1);

    tokio::time::sleep(INTERVAL / 2).await;
    let before = feed.fetch_count();
    for _ in 0..5 {
        next_poll().await;
    }
    assert_eq!(feed.fetch_count() - before, 5);

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_skips_nothing() {
    let feed = Arc::new(StaticFeed::with_actions(vec![shot(
        1,
        "2024-10-22T23:42:10.3Z",
        1,
        "BOS",
        "Made",
    )]));
    let registry = registry(&feed);
    registry.start("board", "0022400061", None).await.unwrap();
    tokio::time::sleep(INTERVAL / 2).await;
    assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::Reset);

    registry.pause("board").await.unwrap();
    for i in 0..4u64 {
        feed.push_actions([shot(
            10 + i,
            &format!("2024-10-22T23:5{}:00Z", i),
            20 + i,
            "NYK",
            "Missed",
        )]);
        assert_eq!(registry.pop("board", "tv").await.unwrap(), Delivery::NoContent);
        assert_eq!(registry.peek("board", "tv").await.unwrap(), Delivery::NoContent);
        next_poll().await;
    }
    assert_eq!(registry.current_source("board").await.unwrap().shots, 5);

    registry.resume("board").await.unwrap();
    let delivery = registry.pop("board", "tv").await.unwrap();
    assert_eq!(sequence(&delivery), Some(1));

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_roster_snapshot_includes_substitute() {
    let feed = Arc::new(StaticFeed::with_actions(vec![
        substitution(1, "2024-10-22T23:41:00Z", 1627759, "BOS", "in"),
        shot(2, "2024-10-22T23:42:10.3Z", 1628369, "BOS", "Made"),
    ]));
    let registry = registry(&feed);
    registry
        .start("board", "0022400061", Some(TeamLabels::new("BOS", "NYK")))
        .await
        .unwrap();
    tokio::time::sleep(INTERVAL / 2).await;

    registry.pop("board", "tv").await.unwrap();
    let delivery = registry.pop("board", "tv").await.unwrap();
    let event = delivery.event().unwrap();

    assert_eq!(event.team, "BOS");
    assert!(event.on_court.home.iter().any(|player| player.id == 1627759));
    assert!(event.on_court.away.is_empty());

    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failures_do_not_lose_events() {
    let feed = Arc::new(StaticFeed::with_actions(vec![shot(
        1,
        "2024-10-22T23:42:10.3Z",
        1,
        "BOS",
        "Made",
    )]));
    feed.fail_next(3);
    let registry = registry(&feed);
    registry.start("board", "0022400061", None).await.unwrap();

    tokio::time::sleep(INTERVAL * 3 + INTERVAL / 2).await;

    let stats = registry.session_stats("board").await.unwrap();
    assert_eq!(stats.fetch_failures, 3);
    assert_eq!(stats.shots_ingested, 1);

    registry.pop("board", "tv").await.unwrap();
    assert_eq!(sequence(&registry.pop("board", "tv").await.unwrap()), Some(1));

    registry.shutdown().await;
}
