use production_planner::analysis::DegeneracyAnalyzer;
use production_planner::io::reporting;
use production_planner::logging;
use production_planner::model::constraints::{BuildNotice, ConstraintBuilder};
use production_planner::model::dataset::{Period, PlanningDataset, Sku};
use production_planner::planning::config::{
    AnalysisSettings, CostParameters, FrontierConfig, PlanningConfig, RunConfig,
};
use production_planner::planning::engine::{FrontierRunner, RunStatus};
use production_planner::solver::backend::MicrolpSolver;
use production_planner::solver::traits::SolveStatus;
use production_planner::strategy::implementations::{GoalProgramming, Lexicographic};
use production_planner::strategy::traits::{OutcomeDetail, PlanningContext, Scalarizer};
use production_planner::PlanningError;

const EPS: f64 = 1e-6;

fn single_sku(capacity: Option<f64>) -> PlanningDataset {
    let mut data = PlanningDataset::new(["A"], ["t0", "t1"]);
    for t in ["t0", "t1"] {
        data.set_demand("A", t, 10.0)
            .set_safety_stock("A", t, 0.0)
            .set_excess_inventory("A", t, 0.0);
        if let Some(cap) = capacity {
            data.set_capacity(t, cap);
        }
    }
    data
}

fn unit_costs(skus: &[&str], alpha: f64) -> PlanningConfig {
    PlanningConfig {
        alpha,
        ..PlanningConfig::with_costs(CostParameters::uniform(skus.iter().copied(), 1.0, 0.0, 0.0))
    }
}

/// Two SKUs with identical costs; the late period cannot serve both.
fn interchangeable_skus() -> PlanningDataset {
    let mut data = PlanningDataset::new(["A", "B"], ["t0", "t1"]);
    for p in ["A", "B"] {
        for t in ["t0", "t1"] {
            data.set_demand(p, t, 5.0)
                .set_safety_stock(p, t, 0.0)
                .set_excess_inventory(p, t, 0.0);
        }
    }
    data.set_capacity("t0", 20.0).set_capacity("t1", 5.0);
    data
}

#[test]
fn two_period_single_sku_plan() {
    logging::init_test();
    let data = single_sku(Some(20.0));
    let config = unit_costs(&["A"], 1.0);
    let solver = MicrolpSolver::new();
    let ctx = PlanningContext::new(&data, &config, &solver);

    let out = Lexicographic::new().scalarize(&ctx).unwrap();

    let OutcomeDetail::Lexicographic { phase1_cost } = out.detail else {
        panic!("expected lexicographic detail");
    };
    assert!((phase1_cost - 20.0).abs() < EPS);
    assert!(out.record.shortfall.abs() < EPS);
    assert!((out.record.cost - 20.0).abs() < EPS);
    assert!((out.record.production_plan.total() - 20.0).abs() < EPS);

    // holding is free, so any split covering t0 is optimal; the even split
    // must be among them
    let t0 = out
        .record
        .production_plan
        .get(&Sku::from("A"), &Period::from("t0"))
        .unwrap_or_default();
    assert!(t0 >= 10.0 - EPS);
    // x[A,t0], x[A,t1], I[A,t0], I[A,t1], shortfall
    let even_split = [10.0, 10.0, 0.0, 0.0, 0.0];
    assert!(out.solved.model.is_feasible(&even_split, EPS));
}

#[test]
fn missing_capacity_is_filled_from_demand_and_safety_stock() {
    logging::init_test();
    let data = single_sku(None);

    let f = ConstraintBuilder::new(&data).build("fallback").unwrap();
    assert_eq!(f.capacity(), &[10.0, 10.0]);
    assert_eq!(
        f.notices(),
        &[
            BuildNotice::CapacityFallbackApplied {
                period: Period::from("t0"),
                capacity: 10.0
            },
            BuildNotice::CapacityFallbackApplied {
                period: Period::from("t1"),
                capacity: 10.0
            },
        ]
    );

    // the notices travel with the strategy outcome, and the plan is forced
    let config = unit_costs(&["A"], 1.0);
    let solver = MicrolpSolver::new();
    let out = Lexicographic::new()
        .scalarize(&PlanningContext::new(&data, &config, &solver))
        .unwrap();
    assert_eq!(out.notices.len(), 2);
    for t in ["t0", "t1"] {
        let q = out
            .record
            .production_plan
            .get(&Sku::from("A"), &Period::from(t))
            .unwrap_or_default();
        assert!((q - 10.0).abs() < EPS);
    }
}

#[test]
fn infeasible_cost_phase_never_reaches_phase_two() {
    let data = single_sku(Some(5.0));
    let config = unit_costs(&["A"], 1.0);
    let solver = MicrolpSolver::new();

    let err = Lexicographic::new()
        .scalarize(&PlanningContext::new(&data, &config, &solver))
        .unwrap_err();

    match err {
        PlanningError::PhaseInfeasible {
            strategy,
            phase,
            status,
        } => {
            assert_eq!(strategy, "lexicographic");
            assert_eq!(phase, 1);
            assert_eq!(status, SolveStatus::Infeasible);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_demand_is_a_data_error() {
    let mut data = single_sku(Some(20.0));
    data.set_demand("A", "t2", 4.0);
    let config = unit_costs(&["A"], 1.0);
    let solver = MicrolpSolver::new();

    let err = Lexicographic::new()
        .scalarize(&PlanningContext::new(&data, &config, &solver))
        .unwrap_err();
    assert!(matches!(err, PlanningError::DataInconsistency(_)));
}

#[test]
fn interchangeable_skus_have_alternate_optima() {
    logging::init_test();
    let data = interchangeable_skus();
    let config = unit_costs(&["A", "B"], 0.9);
    let solver = MicrolpSolver::new();
    let ctx = PlanningContext::new(&data, &config, &solver).with_reduced_costs();
    let solved = Lexicographic::new().cost_minimum(&ctx).unwrap();
    assert!((solved.solution.objective - 20.0).abs() < EPS);
    assert!(solved.solution.reduced_costs.is_some());

    let analyzer = DegeneracyAnalyzer::new(&solver, AnalysisSettings::default());
    let free = analyzer.free_variables(&solved).unwrap();
    assert!(!free.is_empty());

    let extreme = analyzer.extreme_points(&solved, &free);
    assert!(extreme.vertices.len() >= 2);

    // which SKU absorbs the shared early capacity differs between vertices
    let layout = ctx.build("layout").unwrap();
    let spread = |p: usize| {
        let x = layout.production(p, 0).index();
        let (lo, hi) = extreme
            .vertices
            .iter()
            .map(|v| v.values[x])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        hi - lo
    };
    assert!(spread(0) > EPS || spread(1) > EPS);

    // every vertex stays on the optimal face
    let locked = analyzer.lock_optimum(&solved);
    for v in &extreme.vertices {
        assert!(locked.is_feasible(&v.values, EPS));
    }
}

#[test]
fn analysis_report_flags_the_degenerate_face() {
    let data = interchangeable_skus();
    let config = unit_costs(&["A", "B"], 0.9);
    let solver = MicrolpSolver::new();
    let ctx = PlanningContext::new(&data, &config, &solver).with_reduced_costs();
    let solved = Lexicographic::new().cost_minimum(&ctx).unwrap();

    let settings = AnalysisSettings {
        seed: Some(2024),
        samples: 20,
        ..AnalysisSettings::default()
    };
    let analyzer = DegeneracyAnalyzer::new(&solver, settings);
    let first = analyzer.analyze(&solved).unwrap();
    let second = analyzer.analyze(&solved).unwrap();

    assert!(!first.unique);
    assert!(!first.free_variable_names().is_empty());
    assert!(!first.samples.is_empty());
    // seeded sampling is reproducible
    assert_eq!(first.samples, second.samples);
    assert!(first.inconclusive.is_empty());
}

#[test]
fn integer_runs_report_no_reduced_costs() {
    let data = interchangeable_skus();
    let config = PlanningConfig {
        integer_production: true,
        ..unit_costs(&["A", "B"], 0.9)
    };
    let solver = MicrolpSolver::new();
    let ctx = PlanningContext::new(&data, &config, &solver);
    let solved = Lexicographic::new().cost_minimum(&ctx).unwrap();
    assert!(solved.solution.values.iter().all(|v| (v - v.round()).abs() < EPS));

    let err = DegeneracyAnalyzer::new(&solver, AnalysisSettings::default())
        .free_variables(&solved)
        .unwrap_err();
    assert!(matches!(err, PlanningError::ReducedCostsUnavailable(_)));
}

#[test]
fn goal_programming_reconstructs_cost_and_service() {
    let data = single_sku(Some(20.0));
    let config = unit_costs(&["A"], 0.9);
    let solver = MicrolpSolver::new();
    let ctx = PlanningContext::new(&data, &config, &solver);

    // unreachable target: cost cannot drop below 20
    let out = GoalProgramming::new(1.0, 1.0, 15.0).scalarize(&ctx).unwrap();
    let OutcomeDetail::GoalProgramming(dev) = out.detail else {
        panic!("expected goal deviations");
    };
    assert!((dev.cost_over - 5.0).abs() < EPS);
    assert!((out.record.cost - 20.0).abs() < EPS);
    // coverage overshoots the 18 unit goal by 2
    assert!((dev.coverage_over - 2.0).abs() < EPS);
    assert!((out.record.service_level - 1.0).abs() < EPS);
    assert!(out.record.shortfall.abs() < EPS);
}

#[test]
fn frontier_exports_to_csv() {
    logging::init_test();
    let data = single_sku(Some(20.0));
    let config = unit_costs(&["A"], 0.9);
    let frontier = FrontierConfig {
        shortfall_weights: vec![0.1, 1.0, 10.0],
        ..FrontierConfig::default()
    };
    let solver = MicrolpSolver::new();

    let result = FrontierRunner::new(&data, &config, &frontier, &solver)
        .run()
        .unwrap();
    assert_eq!(result.records.len(), 5);
    assert!(result.records.iter().all(|r| r.status == RunStatus::Ok));

    let dir = tempfile::tempdir().unwrap();
    let frontier_path = dir.path().join("pareto_results.csv");
    reporting::write_frontier(&frontier_path, &result.records).unwrap();
    let text = std::fs::read_to_string(&frontier_path).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert!(text.starts_with("model_name,parameter,cost,service_level,shortfall,status"));

    let plan_path = dir.path().join("plan.csv");
    let baseline = result.baseline.as_ref().unwrap();
    reporting::write_production_plan(&plan_path, &baseline.record.production_plan).unwrap();
    let plan = std::fs::read_to_string(&plan_path).unwrap();
    assert!(plan.starts_with("Product,Period,Production\n"));
}

#[test]
fn run_config_loads_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(
        &path,
        r#"{
            "planning": { "alpha": 0.95, "costs": { "production": { "A": 2.0 }, "holding": { "A": 0.1 }, "excess": { "A": 0.0 } } },
            "frontier": { "shortfall_weights": [1.0, 3.0], "parallel": false },
            "analysis": { "seed": 9 }
        }"#,
    )
    .unwrap();

    let config = RunConfig::from_json_file(&path).unwrap();
    assert_eq!(config.planning.alpha, 0.95);
    assert_eq!(config.frontier.shortfall_weights, vec![1.0, 3.0]);
    assert!(config.frontier.goal.is_some());
    assert_eq!(config.analysis.seed, Some(9));
    assert_eq!(config.analysis.samples, 60);

    std::fs::write(&path, r#"{ "planning": { "alpha": 1.5 } }"#).unwrap();
    assert!(matches!(
        RunConfig::from_json_file(&path),
        Err(PlanningError::DataInconsistency(_))
    ));
}
