//! Stockout risk estimation end to end

use crate::config::{RunConfig, SimulationConfig};
use crate::engine::simulate_stockout_risk;
use crate::model::StockItem;
use crate::scheduler::{Progress, Scheduler};

#[test]
fn test_well_stocked_item_has_low_risk() {
    // 30 days at 12.5/day is 375 expected against 500 on hand
    let run = RunConfig::new(SimulationConfig::new(1000, 30, 42).unwrap()).with_parallelism(4);
    let scheduler = run.scheduler().unwrap();
    let items = || vec![StockItem::new("SKU-1", 500.0, 12.5, 3.0).unwrap()];

    let first = simulate_stockout_risk(items(), &run.simulation, &scheduler, None).unwrap();
    let second = simulate_stockout_risk(items(), &run.simulation, &scheduler, None).unwrap();

    let estimate = first.get("SKU-1").unwrap();
    assert_eq!(estimate.trials, 1000);
    assert!(estimate.probability < 0.05);
    assert_eq!(
        estimate.probability,
        second.get("SKU-1").unwrap().probability
    );
    assert_eq!(first.above(0.05).count(), 0);
}

#[test]
fn test_understocked_item_always_stocks_out() {
    // 10/day with 100 on hand runs out around day 10, well inside 30
    let config = SimulationConfig::new(500, 30, 1).unwrap();
    let items = vec![StockItem::new("SKU-LOW", 100.0, 10.0, 2.0).unwrap()];
    let report = simulate_stockout_risk(items, &config, &Scheduler::default(), None).unwrap();

    let estimate = report.get("SKU-LOW").unwrap();
    assert_eq!(estimate.probability, 1.0);
    assert_eq!(estimate.stockouts, 500);
    assert_eq!(estimate.standard_error, 0.0);
    let day = estimate.mean_stockout_day.unwrap();
    assert!((8.0..=13.0).contains(&day), "mean stockout day {day}");
}

#[test]
fn test_one_estimate_per_item_ranked_by_risk() {
    let config = SimulationConfig::new(300, 20, 11).unwrap();
    let items = vec![
        StockItem::new("safe", 1_000.0, 5.0, 1.0).unwrap(),
        StockItem::new("doomed", 10.0, 5.0, 1.0).unwrap(),
        StockItem::new("borderline", 100.0, 5.0, 3.0).unwrap(),
    ];
    let report =
        simulate_stockout_risk(items, &config, &Scheduler::new(Some(2)).unwrap(), None).unwrap();

    assert_eq!(report.estimates.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_units(), 3);
    for estimate in &report.estimates {
        assert!((0.0..=1.0).contains(&estimate.probability));
        assert_eq!(estimate.trials, 300);
    }
    for pair in report.estimates.windows(2) {
        assert!(pair[0].probability >= pair[1].probability);
    }
    assert_eq!(report.estimates[0].item.id(), "doomed");
    assert_eq!(report.estimates[2].item.id(), "safe");
}

#[test]
fn test_equal_probabilities_ordered_by_id() {
    let config = SimulationConfig::new(50, 10, 3).unwrap();
    let items = vec![
        StockItem::new("zeta", 1_000.0, 1.0, 0.0).unwrap(),
        StockItem::new("alpha", 1_000.0, 1.0, 0.0).unwrap(),
        StockItem::new("mid", 1_000.0, 1.0, 0.0).unwrap(),
    ];
    let report = simulate_stockout_risk(items, &config, &Scheduler::default(), None).unwrap();

    let ids: Vec<&str> = report.estimates.iter().map(|e| e.item.id()).collect();
    assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_zero_horizon_never_stocks_out() {
    let config = SimulationConfig::new(100, 0, 3).unwrap();
    let items = vec![StockItem::new("empty", 0.0, 10.0, 1.0).unwrap()];
    let report = simulate_stockout_risk(items, &config, &Scheduler::default(), None).unwrap();

    let estimate = report.get("empty").unwrap();
    assert_eq!(estimate.probability, 0.0);
    assert_eq!(estimate.mean_stockout_day, None);
}

#[test]
fn test_empty_item_list_gives_empty_report() {
    let config = SimulationConfig::new(100, 30, 42).unwrap();
    let progress = Progress::new(5);
    let report =
        simulate_stockout_risk(Vec::new(), &config, &Scheduler::default(), Some(&progress))
            .unwrap();

    assert!(report.estimates.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(progress.total(), 0);
    assert_eq!(progress.fraction(), 1.0);
}

#[test]
fn test_progress_tracks_items() {
    let config = SimulationConfig::new(10, 5, 42).unwrap();
    let items: Vec<StockItem> = (0..12)
        .map(|i| StockItem::new(format!("SKU-{i}"), 50.0, 5.0, 1.0).unwrap())
        .collect();
    let progress = Progress::default();
    simulate_stockout_risk(items, &config, &Scheduler::new(Some(3)).unwrap(), Some(&progress))
        .unwrap();

    assert_eq!(progress.completed(), 12);
    assert_eq!(progress.total(), 12);
}
