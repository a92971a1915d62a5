//! Relaxation Controller
//!
//! Drives the relaxing engine through scripted solver outcomes.

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use blend_optimizer::{
    fixtures::Fixture,
    prelude::*,
    solvers::milp::Formulation,
};
use testresult::TestResult;

/// Replays scripted statuses, then hands every later solve to the real backend.
#[derive(Debug)]
struct Scripted {
    script: Mutex<VecDeque<SolveStatus>>,
    calls: Mutex<u32>,
}

impl Scripted {
    fn new(statuses: impl IntoIterator<Item = SolveStatus>) -> Self {
        Self {
            script: Mutex::new(statuses.into_iter().collect()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.lock().map(|calls| *calls).unwrap_or_default()
    }
}

impl MilpBackend for Scripted {
    fn solve(
        &self,
        formulation: Formulation,
        budget: Duration,
    ) -> Result<SolveOutcome, SolverError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }

        let scripted = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match scripted {
            Some(status) => Ok(SolveOutcome::without_solution(status)),
            None => GoodLpBackend.solve(formulation, budget),
        }
    }
}

fn house_blend() -> Result<(Fixture, BlendTarget), Box<dyn std::error::Error>> {
    let fixture = Fixture::from_set("robusta")?;
    let target = fixture.target("house_blend")?.clone();

    Ok((fixture, target))
}

#[test]
fn recovers_after_a_timeout_and_an_infeasible_attempt() -> TestResult {
    initialise()?;

    let (fixture, target) = house_blend()?;
    let backend = Scripted::new([SolveStatus::Timeout, SolveStatus::Infeasible]);
    let engine = BlendEngine::new(SmartRelaxation, &backend);

    let result = engine.optimize(fixture.batches(), &target, &OptimizerParams::default());

    assert!(result.feasible);
    assert_eq!(result.retry_count, 2);
    assert!(!result.exhausted);
    assert_eq!(backend.calls(), 3);
    assert_eq!(
        result.relaxation_trace,
        "Start: standard constraints.\n\
         Retry #1: Relaxed flavor tolerance (+0.5).\n\
         Retry #2: Increased price tolerance (+5%)."
    );
    assert_eq!(result.status_label(), result.status.to_string());

    Ok(())
}

#[test]
fn first_acceptable_attempt_never_retries() -> TestResult {
    initialise()?;

    let (fixture, target) = house_blend()?;
    let backend = Scripted::new([]);
    let engine = BlendEngine::new(SmartRelaxation, &backend);

    let result = engine.optimize(fixture.batches(), &target, &OptimizerParams::default());

    assert!(result.feasible);
    assert_eq!(result.retry_count, 0);
    assert_eq!(backend.calls(), 1);

    Ok(())
}

#[test]
fn retry_count_grows_with_each_failed_attempt() -> TestResult {
    initialise()?;

    let (fixture, target) = house_blend()?;

    for failures in 0..=3 {
        let backend = Scripted::new(std::iter::repeat_n(SolveStatus::Abnormal, failures));
        let engine = BlendEngine::new(SmartRelaxation, &backend);

        let result = engine.optimize(fixture.batches(), &target, &OptimizerParams::default());

        let expected = u32::try_from(failures)?;

        assert!(result.feasible, "{failures} failures");
        assert_eq!(result.retry_count, expected);
        assert_eq!(backend.calls(), expected + 1);
    }

    Ok(())
}

#[test]
fn flavour_bounds_accumulate_across_price_driven_retries() -> TestResult {
    initialise()?;

    let fixture = Fixture::from_set("robusta")?;
    let target = fixture.target("budget_espresso")?;
    let params = OptimizerParams::mass_market();

    let backend = Scripted::new([SolveStatus::Infeasible, SolveStatus::Infeasible]);
    let engine = BlendEngine::new(SmartRelaxation, &backend);
    let mut bounds = DeviationBounds::default();

    let result = engine.optimize_with_observer(fixture.batches(), target, &params, &mut bounds);

    assert!(result.feasible);
    assert_eq!(result.retry_count, 2);

    // Bounds are from the last attempt: 1.5 base + 1.0 from the first relaxation.
    assert_eq!(bounds.bound(Attribute::Acid), Some(Some(2.5)));
    assert_eq!(bounds.bound(Attribute::Caffeine), Some(Some(0.5)));
    assert_eq!(bounds.bound(Attribute::Price), Some(None));

    Ok(())
}

#[test]
fn feasible_but_overpriced_blends_exhaust_retries() -> TestResult {
    initialise()?;

    // One Arabica lot, priced far above the target but inside a very wide tolerance.
    let batch = Batch::new(
        "B03_ARA_DL",
        "Arabica Cau Dat",
        AttributeProfile::new(220_000.0, 8.0, 3.0, 7.0, 1.2),
        500.0,
        200,
    );
    let target = BlendTarget::new(
        OptimizationMode::Balanced,
        AttributeProfile::new(150_000.0, 8.0, 3.0, 7.0, 1.2),
        100.0,
    );
    let params = OptimizerParams::balanced_market().with_price_tolerance(100_000.0);

    let result = BlendEngine::relaxing().optimize(&[batch], &target, &params);

    assert!(result.feasible);
    assert_eq!(result.retry_count, 3);
    assert!(result.exhausted);
    assert!(!target.accepts_price(result.predicted.price));
    assert_eq!(result.status_label(), "OPTIMAL (Relaxed 3 times)");

    Ok(())
}

#[test]
fn single_solve_engine_reports_the_first_outcome() -> TestResult {
    initialise()?;

    let (fixture, target) = house_blend()?;
    let backend = Scripted::new([SolveStatus::Timeout]);
    let engine = BlendEngine::new(NoRelaxation, &backend);

    let result = engine.optimize(fixture.batches(), &target, &OptimizerParams::default());

    assert_eq!(result.status, BlendStatus::Timeout);
    assert_eq!(result.retry_count, 0);
    assert!(!result.exhausted);
    assert_eq!(result.status_label(), "TIMEOUT");
    assert_eq!(backend.calls(), 1);

    Ok(())
}
