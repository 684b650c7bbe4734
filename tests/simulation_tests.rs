// Integration tests for full simulation runs

mod common;

use common::{create_continuous_config, create_test_config, create_test_venue, crypto_universe};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use venue_sim::{Direction, SimulationController, SimulationReport, TerminationReason};

fn run_batch(trades_per_venue: usize, seed: u64) -> SimulationReport {
    let mut controller = SimulationController::new(create_test_config(trades_per_venue, seed))
        .expect("Failed to build controller");
    controller.run_batch().expect("Batch run failed")
}

#[test]
fn test_two_venues_stop_exactly_at_target() {
    let report = run_batch(10, 42);

    assert_eq!(report.terminated_by, TerminationReason::TargetReached);
    assert_eq!(report.total_trades(), 20);
    assert_eq!(report.closed_trades.len(), 20);
    for venue in &report.venues {
        assert_eq!(venue.total_trades(), 10);
    }
}

#[test]
fn test_empty_universe_returns_zero_trade_report() {
    let mut config = create_test_config(10, 1);
    for venue in &mut config.venues {
        venue.instruments.clear();
    }

    let mut controller = SimulationController::new(config).expect("Empty universe must not error");
    let report = controller.run_batch().expect("Run must not error");

    assert_eq!(report.terminated_by, TerminationReason::NoInstruments);
    assert_eq!(report.ticks, 0);
    assert_eq!(report.total_trades(), 0);
    assert_eq!(report.aggregate.hit_rate, 0.0);
    assert!(report.closed_trades.is_empty());
    for venue in &report.venues {
        assert_eq!(venue.end_balance, venue.start_balance);
        assert_eq!(venue.best_instrument, None);
    }
}

#[test]
fn test_no_venues_returns_zero_trade_report() {
    let mut config = create_test_config(10, 1);
    config.venues.clear();

    let mut controller = SimulationController::new(config).expect("No venues must not error");
    let report = controller.run_batch().expect("Run must not error");
    assert_eq!(report.total_trades(), 0);
    assert!(report.venues.is_empty());
}

#[test]
fn test_empty_venue_does_not_count_towards_target() {
    let mut config = create_test_config(5, 8);
    config.venues[1].instruments.clear();

    let mut controller = SimulationController::new(config).expect("Failed to build controller");
    assert_eq!(controller.trade_target(), 5);

    let report = controller.run_batch().expect("Batch run failed");
    assert_eq!(report.total_trades(), 5);
    assert_eq!(report.venue("beta").map(|v| v.total_trades()), Some(0));
}

#[test]
fn test_same_seed_same_trades() {
    let a = run_batch(8, 2024);
    let b = run_batch(8, 2024);

    assert_eq!(a.closed_trades, b.closed_trades);
    let json_a = serde_json::to_string(&a.closed_trades).expect("serialize");
    let json_b = serde_json::to_string(&b.closed_trades).expect("serialize");
    assert_eq!(json_a, json_b);
    assert_eq!(a.ticks, b.ticks);
}

#[test]
fn test_different_seeds_diverge() {
    let a = run_batch(8, 1);
    let b = run_batch(8, 2);
    assert_ne!(a.closed_trades, b.closed_trades);
}

#[test]
fn test_invariants_hold_every_tick() {
    let mut config = create_test_config(25, 7);
    config.venues[0].max_concurrent_positions = 1;
    config.venues[1].max_concurrent_positions = 3;
    let limits: Vec<usize> = config.venues.iter().map(|v| v.max_concurrent_positions).collect();

    let mut controller = SimulationController::new(config).expect("Failed to build controller");
    // (venue, symbol, open_tick) -> (stop, take) as first seen
    let mut brackets: BTreeMap<(String, String, u64), (f64, f64)> = BTreeMap::new();

    for _ in 0..2_000 {
        controller.tick();

        for (venue, limit) in controller.venues().iter().zip(&limits) {
            assert!(venue.ledger().open_count() <= *limit);

            for position in venue.ledger().open_positions() {
                match position.direction {
                    Direction::Long => {
                        assert!(position.stop_loss < position.entry_price);
                        assert!(position.entry_price < position.take_profit);
                    }
                    Direction::Short => {
                        assert!(position.take_profit < position.entry_price);
                        assert!(position.entry_price < position.stop_loss);
                    }
                }

                let key = (venue.name().to_string(), position.symbol.clone(), position.open_tick);
                let levels = (position.stop_loss, position.take_profit);
                let first = brackets.entry(key).or_insert(levels);
                assert_eq!(*first, levels);
            }
        }
    }

    assert!(!controller.closed_trades().is_empty());
}

#[test]
fn test_balance_moves_exactly_by_realized_pnl() {
    let report = run_batch(15, 11);

    for venue in &report.venues {
        let mut balance = venue.start_balance;
        for trade in report.closed_trades.iter().filter(|t| t.venue == venue.name) {
            balance += trade.realized_pnl;
            assert_eq!(trade.balance_after, balance);
        }
        assert_eq!(venue.end_balance, balance);
    }
}

#[test]
fn test_hit_rate_matches_wins() {
    let report = run_batch(12, 5);

    for venue in &report.venues {
        assert!((0.0..=1.0).contains(&venue.hit_rate));
        let expected = venue.wins as f64 / (venue.wins + venue.losses) as f64;
        assert_eq!(venue.hit_rate, expected);
    }

    let wins = report.closed_trades.iter().filter(|t| t.realized_pnl > 0.0).count();
    assert_eq!(report.aggregate.wins, wins);
}

#[test]
fn test_report_serializes_to_json() {
    let report = run_batch(3, 9);
    let json = report.to_json().expect("Report must serialize");
    assert!(json.contains("\"terminated_by\": \"target_reached\""));
    assert!(json.contains("\"seed\": 9"));
}

#[tokio::test]
async fn test_run_dispatches_batch_mode() {
    let (_tx, rx) = watch::channel(false);
    let mut controller = SimulationController::new(create_test_config(4, 3))
        .expect("Failed to build controller");
    let report = controller.run(rx).await.expect("Run failed");
    assert_eq!(report.total_trades(), 8);
}

#[tokio::test]
async fn test_continuous_run_stops_on_signal() {
    let (tx, rx) = watch::channel(false);
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel(16);

    let mut controller = SimulationController::new(create_continuous_config(17, 5))
        .expect("Failed to build controller")
        .with_snapshot_sink(snapshot_tx);

    let handle = tokio::spawn(async move { controller.run_continuous(rx).await });

    let first = snapshot_rx.recv().await.expect("Expected a snapshot");
    assert_eq!(first.tick, 5);
    assert_eq!(first.venues.len(), 2);
    assert_eq!(first.venues[0].last_prices.len(), crypto_universe().len());

    tx.send(true).expect("Controller should still be listening");
    let report = handle
        .await
        .expect("Task panicked")
        .expect("Continuous run failed");

    assert_eq!(report.terminated_by, TerminationReason::Cancelled);
    assert_eq!(report.mode, "continuous");
    assert!(report.ticks >= 5);
}

#[tokio::test]
async fn test_unread_snapshot_sink_does_not_block_stop() {
    let (tx, rx) = watch::channel(false);
    // Receiver stays alive but is never read, so the sink fills after one snapshot
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);

    let mut controller = SimulationController::new(create_continuous_config(23, 1))
        .expect("Failed to build controller")
        .with_snapshot_sink(snapshot_tx);
    let handle = tokio::spawn(async move { controller.run_continuous(rx).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).expect("Controller should still be listening");

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("Run must return soon after the stop signal")
        .expect("Task panicked")
        .expect("Continuous run failed");

    assert_eq!(report.terminated_by, TerminationReason::Cancelled);
    assert!(report.ticks > 1);
    drop(snapshot_rx);
}

#[tokio::test]
async fn test_continuous_run_honours_max_ticks() {
    let mut config = create_continuous_config(4, 100);
    config.simulation.max_ticks = Some(12);

    let (_tx, rx) = watch::channel(false);
    let mut controller = SimulationController::new(config).expect("Failed to build controller");
    let report = controller.run(rx).await.expect("Run failed");

    assert_eq!(report.terminated_by, TerminationReason::MaxTicks);
    assert_eq!(report.ticks, 12);
}

#[tokio::test]
async fn test_continuous_run_already_cancelled() {
    let (tx, rx) = watch::channel(false);
    tx.send(true).expect("send");

    let mut controller = SimulationController::new(create_continuous_config(4, 10))
        .expect("Failed to build controller");
    let report = controller.run_continuous(rx).await.expect("Run failed");

    assert_eq!(report.terminated_by, TerminationReason::Cancelled);
    assert_eq!(report.ticks, 0);
}

#[tokio::test]
async fn test_continuous_empty_universe_returns_immediately() {
    let mut config = create_continuous_config(4, 10);
    config.venues = vec![create_test_venue("idle", Vec::new())];

    let (_tx, rx) = watch::channel(false);
    let mut controller = SimulationController::new(config).expect("Failed to build controller");
    let report = controller.run(rx).await.expect("Run failed");

    assert_eq!(report.terminated_by, TerminationReason::NoInstruments);
    assert_eq!(report.total_trades(), 0);
}
