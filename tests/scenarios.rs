//! End-to-end runs on small problems with known optima.

use u_swarm::problem::{Constraint, Objective, Problem, Variable};
use u_swarm::pso::{
    AdaptiveMode, IterationStats, PsoConfig, PsoRunner, RunHooks, RunObserver, Swarm, Termination,
};

fn maximize_x() -> Problem {
    Problem::new("max-x")
        .with_variable(Variable::continuous("x", 0.0, 100.0))
        .with_objective(Objective::maximize("x").with_term("x", 1.0))
}

fn scenario_config() -> PsoConfig {
    PsoConfig::default()
        .with_swarm_size(20)
        .with_max_iterations(50)
        .with_time_limit_ms(60_000)
        .with_convergence_threshold(1.0)
        .with_seed(42)
}

#[test]
fn test_unconstrained_maximum_at_upper_bound() {
    let result = PsoRunner::run(&maximize_x(), &scenario_config()).unwrap();

    let x = result.best_values[0].1;
    assert!((x - 100.0).abs() < 0.5, "expected x near 100, got {x}");
    assert!(result.best.feasible);

    for w in result.history.windows(2) {
        if !w[1].restarted {
            assert!(
                w[1].global_best_fitness >= w[0].global_best_fitness,
                "global best decreased at iteration {}: {} -> {}",
                w[1].iteration,
                w[0].global_best_fitness,
                w[1].global_best_fitness
            );
        }
    }
    for w in result.fitness_history.windows(2) {
        assert!(w[1] >= w[0]);
    }
}

#[test]
fn test_unconstrained_with_all_refinements() {
    let config = scenario_config()
        .with_adaptive(AdaptiveMode::FULL)
        .with_local_search(true);
    let result = PsoRunner::run(&maximize_x(), &config).unwrap();
    let x = result.best_values[0].1;
    assert!((x - 100.0).abs() < 0.5, "expected x near 100, got {x}");
}

fn equality_problem(x: Variable) -> Problem {
    Problem::new("x-equals-50")
        .with_variable(x)
        .with_objective(Objective::maximize("x").with_term("x", 1.0))
        .with_constraint(
            Constraint::equality("fifty", 50.0)
                .with_term("x", 1.0)
                .with_penalty_weight(10.0),
        )
}

#[test]
fn test_equality_constraint_integer_hits_bound() {
    let problem = equality_problem(Variable::integer("x", 0, 100));
    let config = scenario_config()
        .with_max_iterations(100)
        .with_local_search(true);
    let result = PsoRunner::run(&problem, &config).unwrap();

    assert!(result.best.feasible, "violations: {:?}", result.best.violations);
    assert_eq!(result.best.position[0], 50.0);
    assert!((result.best_fitness - 5000.0).abs() < 1e-9);
}

#[test]
fn test_equality_constraint_continuous() {
    let problem = equality_problem(Variable::continuous("x", 0.0, 100.0));
    let config = scenario_config().with_local_search(true);
    let result = PsoRunner::run(&problem, &config).unwrap();

    let x = result.best.position[0];
    assert!(result.best.feasible, "violations: {:?}", result.best.violations);
    assert!((x - 50.0).abs() <= 0.001, "expected x within 0.001 of 50, got {x}");
    for p in &result.swarm.particles {
        if p.feasible {
            assert!((p.position[0] - 50.0).abs() <= 0.001);
        }
    }
}

#[test]
fn test_zero_threshold_converges_in_one_iteration() {
    let problems = [
        maximize_x(),
        Problem::new("min-x")
            .with_variable(Variable::continuous("x", 0.0, 100.0))
            .with_objective(Objective::minimize("x").with_term("x", 1.0)),
        Problem::new("max-x-symmetric")
            .with_variable(Variable::continuous("x", -100.0, 100.0))
            .with_objective(Objective::maximize("x").with_term("x", 1.0)),
    ];
    for problem in &problems {
        for seed in 0..5 {
            let config = PsoConfig::default()
                .with_swarm_size(20)
                .with_convergence_threshold(0.0)
                .with_seed(seed);
            let result = PsoRunner::run(problem, &config).unwrap();

            assert_eq!(
                result.summary.termination,
                Termination::Converged,
                "{} seed {seed}",
                problem.name
            );
            assert_eq!(result.summary.iterations, 1, "{} seed {seed}", problem.name);
            assert!((0.0..=1.0).contains(&result.summary.final_convergence));
        }
    }
}

#[derive(Default)]
struct RestartWatcher {
    before_restart: Option<(usize, Vec<Vec<f64>>)>,
    after_restart: Option<(usize, Vec<Vec<f64>>)>,
}

fn positions(swarm: &Swarm) -> Vec<Vec<f64>> {
    swarm.particles.iter().map(|p| p.position.clone()).collect()
}

impl RunObserver for RestartWatcher {
    fn on_restart(&mut self, iteration: usize, swarm: &Swarm) {
        self.before_restart = Some((iteration, positions(swarm)));
    }

    fn on_iteration(&mut self, stats: &IterationStats, swarm: &Swarm) {
        if stats.restarted && self.after_restart.is_none() {
            self.after_restart = Some((stats.iteration, positions(swarm)));
        }
    }
}

#[test]
fn test_stagnation_triggers_restart() {
    // No objectives: every position scores 0, so best == average each iteration.
    let problem = Problem::new("flat").with_variable(Variable::continuous("x", 0.0, 100.0));
    let config = PsoConfig::default()
        .with_swarm_size(10)
        .with_max_iterations(11)
        .with_convergence_threshold(1.0)
        .with_stagnation_limit(10)
        .with_seed(3);

    let mut watcher = RestartWatcher::default();
    let result = PsoRunner::run_with_hooks(
        &problem,
        &config,
        RunHooks {
            observer: Some(&mut watcher),
            ..RunHooks::default()
        },
    )
    .unwrap();

    assert_eq!(result.summary.restarts, 1);
    assert!(result.history[..10].iter().all(|s| !s.restarted));
    assert!(result.history[10].restarted);

    let (before_iter, before) = watcher.before_restart.expect("restart observed");
    let (after_iter, after) = watcher.after_restart.expect("restarted swarm observed");
    assert_eq!(before_iter, 11);
    assert_eq!(after_iter, 11);
    assert_ne!(before, after);
}

#[test]
fn test_restart_disabled() {
    let problem = Problem::new("flat").with_variable(Variable::continuous("x", 0.0, 1.0));
    let config = PsoConfig::default()
        .with_swarm_size(5)
        .with_max_iterations(30)
        .with_convergence_threshold(1.0)
        .with_stagnation_limit(0)
        .with_seed(3);
    let result = PsoRunner::run(&problem, &config).unwrap();
    assert_eq!(result.summary.restarts, 0);
    assert_eq!(result.summary.iterations, 30);
}

#[test]
fn test_same_seed_same_run() {
    let problem = Problem::new("mixed")
        .with_variable(Variable::continuous("a", -10.0, 10.0))
        .with_variable(Variable::discrete("b", 0.0, 5.0, 0.25))
        .with_variable(Variable::integer("c", -20, 20))
        .with_variable(Variable::binary("d"))
        .with_objective(Objective::minimize("dist").with_term("a", 1.0).with_term("c", 0.5))
        .with_objective(Objective::maximize("gain").with_term("b", 2.0).with_term("d", 1.0))
        .with_constraint(Constraint::inequality("budget", 6.0).with_term("b", 1.0).with_term("d", 3.0));
    let config = PsoConfig::default()
        .with_swarm_size(15)
        .with_max_iterations(40)
        .with_adaptive(AdaptiveMode::FULL)
        .with_local_search(true)
        .with_seed(2024);

    let a = PsoRunner::run(&problem, &config).unwrap();
    let b = PsoRunner::run(&problem, &config).unwrap();

    assert_eq!(a.seed, b.seed);
    assert_eq!(a.best, b.best);
    assert_eq!(a.swarm, b.swarm);
    assert_eq!(a.history, b.history);
    assert_eq!(a.fitness_history, b.fitness_history);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    let config = scenario_config().with_local_search(true);
    let sequential = PsoRunner::run(&maximize_x(), &config.clone().with_parallel(false)).unwrap();
    let parallel = PsoRunner::run(&maximize_x(), &config.with_parallel(true)).unwrap();

    assert_eq!(sequential.swarm, parallel.swarm);
    assert_eq!(sequential.history, parallel.history);
}

#[test]
fn test_zero_variables_reaches_done() {
    let problem = Problem::new("empty").with_objective(Objective::maximize("nothing"));
    let result = PsoRunner::run(&problem, &PsoConfig::fast().with_seed(1)).unwrap();

    assert!(result.best.position.is_empty());
    assert_eq!(result.best_fitness, 0.0);
    assert!(result.best_values.is_empty());
    assert!(result.summary.iterations >= 1);
}

#[test]
fn test_result_report_populated() {
    let problem = maximize_x().with_constraint(
        Constraint::inequality("cap", 10.0)
            .with_term("x", 1.0)
            .with_penalty_weight(0.5),
    );
    let result = PsoRunner::run(&problem, &scenario_config()).unwrap();

    let m = &result.metrics;
    assert!((0.0..=1.0).contains(&m.coverage));
    assert_eq!(m.stability, result.swarm.stability);
    assert_eq!(result.summary.final_convergence, result.summary.final_stability);
    assert!(result.summary.improvement_rate >= 0.0 && result.summary.improvement_rate <= 1.0);
    assert!(result.summary.improving_iterations <= result.summary.iterations);
    for w in result.recommendations.windows(2) {
        assert!(w[0].tier <= w[1].tier);
    }
}
