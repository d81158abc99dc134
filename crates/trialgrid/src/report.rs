//! Plain-text rendering of simulation results

use std::fmt::{self, Write};

use trialgrid_core::model::FailedUnit;
use trialgrid_core::{GridSearchReport, PivotTable, RiskReport};

use crate::scenario::{GridOutcome, ScenarioOutcome};

/// Marker for pivot cells without a result
const MISSING: &str = "-";

fn render_failed(out: &mut impl Write, failed: &[FailedUnit]) -> fmt::Result {
    if failed.is_empty() {
        return Ok(());
    }
    writeln!(out, "Failed units ({}):", failed.len())?;
    for unit in failed {
        writeln!(out, "  {} (seed {}): {}", unit.unit_id, unit.seed, unit.error)?;
    }
    Ok(())
}

pub fn render_risk(out: &mut impl Write, report: &RiskReport, threshold: f64) -> fmt::Result {
    writeln!(out, "Stockout risk ({} items)", report.total_units())?;
    writeln!(
        out,
        "  {:<16} {:>8} {:>8} {:>10} {:>6}",
        "item", "p", "stderr", "mean day", "flag"
    )?;
    for estimate in &report.estimates {
        let mean_day = estimate
            .mean_stockout_day
            .map_or_else(|| MISSING.to_string(), |d| format!("{d:.1}"));
        let flag = if estimate.probability >= threshold { "!" } else { "" };
        writeln!(
            out,
            "  {:<16} {:>8.4} {:>8.4} {:>10} {:>6}",
            estimate.item.id(),
            estimate.probability,
            estimate.standard_error,
            mean_day,
            flag
        )?;
    }
    let flagged = report.above(threshold).count();
    writeln!(out, "  {flagged} item(s) at or above {threshold}")?;
    render_failed(out, &report.failed)
}

fn format_point(values: &[f64]) -> String {
    let coords: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("({})", coords.join(", "))
}

pub fn render_ranking(out: &mut impl Write, report: &GridSearchReport, top: usize) -> fmt::Result {
    writeln!(
        out,
        "Grid search over [{}] ({} points, goal {:?})",
        report.dimensions.join(", "),
        report.total_units(),
        report.goal
    )?;
    match report.best() {
        Some(best) => writeln!(
            out,
            "  best {} = {:.4} (sd {:.4})",
            format_point(best.point.values()),
            best.mean,
            best.std_dev
        )?,
        None => writeln!(out, "  no successful points")?,
    }
    for (rank, estimate) in report.top(top).iter().enumerate() {
        writeln!(
            out,
            "  {:>3}. {:<24} {:>12.4}",
            rank + 1,
            format_point(estimate.point.values()),
            estimate.mean
        )?;
    }
    render_failed(out, &report.failed)
}

/// Matrix with row labels down the left and column labels across the top
pub fn render_pivot(out: &mut impl Write, table: &PivotTable) -> fmt::Result {
    writeln!(
        out,
        "Pivot: {} (rows) x {} (columns)",
        table.row_dimension, table.column_dimension
    )?;
    write!(out, "{:>10}", "")?;
    for label in &table.column_values {
        write!(out, " {label:>10}")?;
    }
    writeln!(out)?;

    for (r, label) in table.row_values.iter().enumerate() {
        write!(out, "{label:>10}")?;
        for cell in table.row(r).unwrap_or_default() {
            match cell {
                Some(v) => write!(out, " {v:>10.3}")?,
                None => write!(out, " {MISSING:>10}")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_grid(out: &mut impl Write, grid: &GridOutcome) -> fmt::Result {
    render_ranking(out, &grid.report, grid.top)?;
    if let Some(table) = &grid.pivot {
        writeln!(out)?;
        render_pivot(out, table)?;
    }
    Ok(())
}

/// Render every section present in `outcome`
pub fn render(outcome: &ScenarioOutcome) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if let Some(risk) = &outcome.risk {
        render_risk(&mut out, risk, outcome.threshold)?;
    }
    if let Some(grid) = &outcome.grid {
        if outcome.risk.is_some() {
            writeln!(out)?;
        }
        render_grid(&mut out, grid)?;
    }
    Ok(out)
}
