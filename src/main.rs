use std::env;
use std::process;

use production_planner::analysis::DegeneracyAnalyzer;
use production_planner::io::demand::{self, SyntheticProfile};
use production_planner::io::reporting;
use production_planner::logging;
use production_planner::planning::config::RunConfig;
use production_planner::planning::engine::FrontierRunner;
use production_planner::solver::backend::MicrolpSolver;
use production_planner::Result;

fn main() {
    logging::init();
    println!("=== Multi-Objective Production Planning ===");

    if let Err(e) = run() {
        eprintln!("Planning run failed: {}", e);
        process::exit(1);
    }

    println!("\nPlanning Complete.");
}

fn run() -> Result<()> {
    // 1. SETUP CONFIGURATION
    // Optional JSON file as the first argument; demo defaults otherwise.
    let config = match env::args().nth(1) {
        Some(path) => {
            println!("Loading configuration from '{}'", path);
            RunConfig::from_json_file(&path)?
        }
        None => RunConfig::default(),
    };

    // 2. GENERATE DATASET
    // Three SKUs over six periods, normally distributed demand.
    let profile = SyntheticProfile::default();
    let dataset = demand::generate_dataset(&profile, Some(42))?;
    println!(
        "Dataset generated: {} SKUs x {} periods, total demand {:.0}",
        dataset.products().len(),
        dataset.periods().len(),
        dataset.total_demand()
    );

    // 3. RUN FRONTIER
    // Lexicographic baseline, weighted-sum sweep, then goal programming.
    let solver = MicrolpSolver::new();
    let runner = FrontierRunner::new(&dataset, &config.planning, &config.frontier, &solver)
        .with_baseline_reduced_costs();
    let frontier = runner.run()?;

    println!("\n=== Cost vs Service Frontier ===");
    for row in &frontier.records {
        let fmt = |v: Option<f64>, p: usize| match v {
            Some(v) => format!("{:.*}", p, v),
            None => "-".to_string(),
        };
        println!(
            "{:<17} param {:>7} | cost {:>10} | service {:>6} | {:?}",
            row.model_name,
            fmt(row.parameter, 2),
            fmt(row.cost, 2),
            fmt(row.service_level, 3),
            row.status
        );
    }
    println!(
        "{} of {} points are Pareto-efficient",
        frontier.pareto_efficient().len(),
        frontier.records.len()
    );

    // 4. EXPORT RESULTS
    let output_file = "pareto_results.csv";
    match reporting::write_frontier(output_file, &frontier.records) {
        Ok(_) => println!("Success! Frontier written to ./{}", output_file),
        Err(e) => eprintln!("Error writing CSV: {}", e),
    }

    let Some(baseline) = &frontier.baseline else {
        println!("Lexicographic baseline failed; no plan to export.");
        return Ok(());
    };
    let plan_file = "production_plan_lexicographic.csv";
    match reporting::write_production_plan(plan_file, &baseline.record.production_plan) {
        Ok(_) => println!("Success! Plan written to ./{}", plan_file),
        Err(e) => eprintln!("Error writing CSV: {}", e),
    }

    // 5. POST-OPTIMALITY ANALYSIS
    println!("\n=== Optimal Face Analysis ===");
    let analyzer = DegeneracyAnalyzer::new(&solver, config.analysis.clone())
        .with_timeout(config.planning.solve_timeout());
    match analyzer.analyze(&baseline.solved) {
        Ok(report) if report.unique => println!("Unique optimum."),
        Ok(report) => {
            println!("Alternate optima through: {:?}", report.free_variable_names());
            println!(
                "{} extreme points, {} sampled vertices, {} inconclusive directions",
                report.extreme_points.len(),
                report.samples.len(),
                report.inconclusive.len()
            );
        }
        // Integer runs carry no reduced costs.
        Err(e) => println!("Analysis skipped: {}", e),
    }

    // 6. PRINT COST ANALYSIS
    println!("\n=== Cost Analysis ===");
    println!("Lexicographic Cost: ${:.2}", baseline.record.cost);
    println!("Service Level: {:.1}%", baseline.record.service_level * 100.0);
    println!("Planned Units: {:.0}", baseline.record.production_plan.total());
    for notice in &frontier.notices {
        println!("Notice: {:?}", notice);
    }
    Ok(())
}
