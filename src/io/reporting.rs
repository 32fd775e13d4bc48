// src/io/reporting.rs

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::plan::ProductionPlan;
use crate::planning::engine::FrontierRecord;

/// Writes the frontier dataset to a CSV file.
///
/// Missing numbers are written as empty cells.
pub fn write_frontier(file_path: impl AsRef<Path>, data: &[FrontierRecord]) -> Result<()> {
    write_rows(file_path.as_ref(), data)
}

/// Writes a production plan as `Product,Period,Production` rows.
pub fn write_production_plan(file_path: impl AsRef<Path>, plan: &ProductionPlan) -> Result<()> {
    write_rows(file_path.as_ref(), plan.entries())
}

fn write_rows<T: Serialize>(path: &Path, data: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in data {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    info!(rows = data.len(), path = %path.display(), "exported csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dataset::{Period, Sku};
    use crate::planning::engine::RunStatus;

    #[test]
    fn frontier_rows_leave_missing_numbers_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pareto_results.csv");
        let rows = vec![
            FrontierRecord {
                model_name: "lexicographic".to_string(),
                parameter: None,
                cost: Some(20.0),
                service_level: Some(1.0),
                shortfall: Some(0.0),
                status: RunStatus::Ok,
            },
            FrontierRecord {
                model_name: "goal-programming".to_string(),
                parameter: None,
                cost: None,
                service_level: None,
                shortfall: None,
                status: RunStatus::Skipped,
            },
        ];

        write_frontier(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "model_name,parameter,cost,service_level,shortfall,status"
        );
        assert_eq!(lines[1], "lexicographic,,20.0,1.0,0.0,ok");
        assert_eq!(lines[2], "goal-programming,,,,,skipped");
    }

    #[test]
    fn plan_uses_product_period_production_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.csv");
        let plan = ProductionPlan::from_quantities(vec![(Sku::from("A"), Period::from("t0"), 10.0)]);

        write_production_plan(&path, &plan).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Product,Period,Production\nA,t0,10.0\n");
    }
}
