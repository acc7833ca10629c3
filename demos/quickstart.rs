//! Forecast two monthly series through their temporal hierarchy.
//!
//! Run with `RUST_LOG=debug cargo run --example quickstart` to see the
//! orchestration logs.

use temporal_reconcile::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pattern = [8.0, 7.0, 9.0, 10.0, 12.0, 15.0, 18.0, 17.0, 13.0, 11.0, 10.0, 14.0];
    let table = PeriodTable::from_rows(
        vec!["north".to_string(), "south".to_string()],
        vec![
            (0..60).map(|i| pattern[i % 12] * 10.0 + i as f64).collect(),
            (0..60).map(|i| pattern[(i + 6) % 12] * 4.0).collect(),
        ],
    )?;

    let mut thief = Thief::new(HierarchyConfig::from_frequency(Frequency::Monthly))?;
    println!("factors: {:?}", thief.hierarchy().factors());
    println!("horizons: {:?}", thief.hierarchy().fhs());

    // Evaluate on the last year, three rolling origins.
    thief.fit(&table, FitMode::holdout(3))?;
    let base = thief.predict(&ModelSelection::uniform("SeasonalNaive"))?;
    let reconciled = thief.reconcile(ReconciliationMethod::Structural)?;

    let mut base_err = 0.0;
    let mut rec_err = 0.0;
    for r in &reconciled {
        let truth = base
            .iter()
            .find(|b| {
                b.unique_id == r.unique_id
                    && b.temporal_level == r.temporal_level
                    && b.fh == r.fh
                    && b.cv == r.cv
            })
            .and_then(|b| b.y_true);
        if let Some(truth) = truth {
            base_err += (truth - r.y_base).abs();
            rec_err += (truth - r.y).abs();
        }
    }
    println!("holdout abs error  base: {:.3}  reconciled: {:.3}", base_err, rec_err);

    // Refit on everything and forecast the next year.
    thief.fit(&table, FitMode::NoHoldout)?;
    thief.predict(&ModelSelection::uniform("SeasonalNaive"))?;
    for r in thief
        .reconcile(ReconciliationMethod::Structural)?
        .iter()
        .filter(|r| r.unique_id == "north" && r.temporal_level == 3)
    {
        println!("north Q{}: {:.1} (base {:.1})", r.fh, r.y, r.y_base);
    }

    Ok(())
}
