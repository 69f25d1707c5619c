//! Overlap maximization over the template merger time and phase
//!
//! The overlap is maximized in two stages, both with [argmin] solvers minimizing
//! the negated overlap:
//!  1. a simulated annealing global search within the bounds,
//!  2. a Nelder-Mead polish started from the best annealing point.
//!
//! The merger time is clamped to its bounds while the merger phase is wrapped
//! into its 2π period.

use std::{sync::Mutex, time::Duration};

use argmin::{
    core::{
        CostFunction, Error as ArgminError, Executor, IterState, State, TerminationReason,
        TerminationStatus,
    },
    solver::{
        neldermead::NelderMead,
        simulatedannealing::{Anneal, SATempFunc, SimulatedAnnealing},
    },
};
use rand::{distributions::Uniform, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{overlap::OverlapIntegral, params::DomainError, Error, Result};

/// Search interval of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
    /// values are wrapped into the interval instead of clamped
    pub periodic: bool,
}
impl Interval {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            periodic: false,
        }
    }
    pub fn periodic(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            periodic: true,
        }
    }
    pub fn span(&self) -> f64 {
        self.high - self.low
    }
    pub fn center(&self) -> f64 {
        0.5 * (self.low + self.high)
    }
    /// Checks that the interval is finite and not empty
    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        if self.low.is_finite() && self.high.is_finite() && self.low < self.high {
            Ok(())
        } else {
            Err(DomainError::Interval {
                low: self.low,
                high: self.high,
            })
        }
    }
    /// Brings `x` back into a valid interval
    pub fn project(&self, x: f64) -> f64 {
        if self.periodic {
            self.low + (x - self.low).rem_euclid(self.span())
        } else {
            x.max(self.low).min(self.high)
        }
    }
    pub fn contains(&self, x: f64) -> bool {
        (self.low..=self.high).contains(&x)
    }
}

/// Bounds of the template merger time [s] and phase [rd]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub t_c: Interval,
    pub phi_c: Interval,
}
impl Default for Bounds {
    fn default() -> Self {
        Self {
            t_c: Interval::new(-0.2, 0.2),
            phi_c: Interval::periodic(-std::f64::consts::PI, std::f64::consts::PI),
        }
    }
}
impl Bounds {
    pub fn t_c(self, low: f64, high: f64) -> Self {
        Self {
            t_c: Interval::new(low, high),
            ..self
        }
    }
    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        self.t_c.validate()?;
        self.phi_c.validate()
    }
    /// Projects (t_c,φ_c) into the bounds
    pub fn project(&self, t_c: f64, phi_c: f64) -> (f64, f64) {
        (self.t_c.project(t_c), self.phi_c.project(phi_c))
    }
}

/// Optimizer settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingConfig {
    /// random generator seed, `None` seeds from the system entropy
    pub seed: Option<u64>,
    pub initial_temperature: f64,
    /// annealing iteration budget
    pub max_iters: u64,
    /// annealing stops after that many iterations without a new best
    pub stall_best: u64,
    /// the temperature is reset after that many iterations without a new best
    pub reanneal_best: u64,
    /// Nelder-Mead iteration budget
    pub polish_iters: u64,
    /// Nelder-Mead convergence tolerance on the simplex costs
    pub polish_tolerance: f64,
    /// wall clock budget of each stage
    pub timeout: Option<Duration>,
}
impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            seed: None,
            initial_temperature: 1f64,
            max_iters: 2000,
            stall_best: 400,
            reanneal_best: 150,
            polish_iters: 200,
            polish_tolerance: 1e-10,
            timeout: None,
        }
    }
}
impl AnnealingConfig {
    pub fn seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }
    pub fn initial_temperature(self, initial_temperature: f64) -> Self {
        Self {
            initial_temperature,
            ..self
        }
    }
    pub fn max_iters(self, max_iters: u64) -> Self {
        Self { max_iters, ..self }
    }
    pub fn stall_best(self, stall_best: u64) -> Self {
        Self { stall_best, ..self }
    }
    pub fn reanneal_best(self, reanneal_best: u64) -> Self {
        Self {
            reanneal_best,
            ..self
        }
    }
    pub fn polish_iters(self, polish_iters: u64) -> Self {
        Self {
            polish_iters,
            ..self
        }
    }
    pub fn polish_tolerance(self, polish_tolerance: f64) -> Self {
        Self {
            polish_tolerance,
            ..self
        }
    }
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }
}

/// Maximum overlap and where it is reached
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub overlap: f64,
    /// template merger time [s]
    pub t_c: f64,
    /// template merger phase [rd]
    pub phi_c: f64,
    /// # of overlap evaluations
    pub evaluations: u64,
    /// # of annealing and polishing iterations
    pub iterations: u64,
    /// # of integrals with an error above the warning tolerance
    pub integration_warnings: usize,
    /// false if either stage ran out of budget before settling on its best value
    pub converged: bool,
    /// termination reasons of the annealing and polishing stages
    pub termination: String,
}
impl OptimizationResult {
    /// Negated overlap
    pub fn cost(&self) -> f64 {
        -self.overlap
    }
}

/// argmin problem: the negated overlap within the bounds
struct OverlapCost<'a> {
    integral: &'a OverlapIntegral,
    bounds: &'a Bounds,
    initial_temperature: f64,
    rng: Mutex<Xoshiro256PlusPlus>,
}
impl CostFunction for OverlapCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let (t_c, phi_c) = self.bounds.project(param[0], param[1]);
        let cost = self.integral.cost(t_c, phi_c)?;
        if !cost.is_finite() {
            return Err(Error::Optimizer(format!(
                "non-finite overlap at t_c={t_c}, phi_c={phi_c}"
            ))
            .into());
        }
        Ok(cost)
    }
}
impl Anneal for OverlapCost<'_> {
    type Param = Vec<f64>;
    type Output = Vec<f64>;
    type Float = f64;

    /// Uniform step in each parameter, the step width shrinks with the temperature
    fn anneal(
        &self,
        param: &Self::Param,
        temperature: f64,
    ) -> std::result::Result<Vec<f64>, ArgminError> {
        let scale = 0.5 * (temperature / self.initial_temperature).clamp(0.02, 1f64);
        let step = Uniform::new_inclusive(-1f64, 1f64);
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Optimizer("annealing random generator poisoned".into()))?;
        let (t_c, phi_c) = self.bounds.project(
            param[0] + scale * self.bounds.t_c.span() * rng.sample(step),
            param[1] + scale * self.bounds.phi_c.span() * rng.sample(step),
        );
        Ok(vec![t_c, phi_c])
    }
}

fn cost_count<I: State>(state: &I) -> u64 {
    state.get_func_counts().get("cost_count").copied().unwrap_or_default()
}

fn settled(status: &TerminationStatus) -> bool {
    matches!(
        status,
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
            | TerminationStatus::Terminated(TerminationReason::SolverExit(_))
    )
}

/// Maximizes the overlap over the template merger time and phase
///
/// The annealing starts from the center of the bounds.
pub fn maximize_overlap(
    integral: &OverlapIntegral,
    bounds: &Bounds,
    config: &AnnealingConfig,
) -> Result<OptimizationResult> {
    bounds.validate()?;
    let mut seeder = match config.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    };
    let problem = OverlapCost {
        integral,
        bounds,
        initial_temperature: config.initial_temperature,
        rng: Mutex::new(Xoshiro256PlusPlus::seed_from_u64(seeder.gen())),
    };
    let solver = SimulatedAnnealing::new_with_rng(
        config.initial_temperature,
        Xoshiro256PlusPlus::seed_from_u64(seeder.gen()),
    )
    .map_err(Error::from_argmin)?
    .with_temp_func(SATempFunc::Boltzmann)
    .with_stall_best(config.stall_best)
    .with_reannealing_best(config.reanneal_best);
    let start = vec![bounds.t_c.center(), bounds.phi_c.center()];
    let mut executor = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(config.max_iters));
    if let Some(timeout) = config.timeout {
        executor = executor.timeout(timeout);
    }
    let annealing = executor.run().map_err(Error::from_argmin)?;
    let annealing_state: &IterState<Vec<f64>, (), (), (), (), f64> = annealing.state();
    let best = annealing_state
        .get_best_param()
        .cloned()
        .ok_or_else(|| Error::Optimizer("simulated annealing returned no parameters".into()))?;
    let annealing_cost = annealing_state.get_best_cost();
    let annealing_status = annealing_state.get_termination_status().clone();
    let mut evaluations = cost_count(annealing_state);
    let mut iterations = annealing_state.get_iter();
    log::debug!(
        "annealing: overlap {:.6} at {:?} after {} iterations ({:?})",
        -annealing_cost,
        best,
        iterations,
        annealing_status
    );

    let simplex = vec![
        best.clone(),
        vec![best[0] + 1e-3, best[1]],
        vec![best[0], best[1] + 1e-2],
    ];
    let problem = OverlapCost {
        integral,
        bounds,
        initial_temperature: config.initial_temperature,
        rng: Mutex::new(Xoshiro256PlusPlus::seed_from_u64(seeder.gen())),
    };
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(config.polish_tolerance)
        .map_err(Error::from_argmin)?;
    let mut executor =
        Executor::new(problem, solver).configure(|state| state.max_iters(config.polish_iters));
    if let Some(timeout) = config.timeout {
        executor = executor.timeout(timeout);
    }
    let polish = executor.run().map_err(Error::from_argmin)?;
    let polish_state: &IterState<Vec<f64>, (), (), (), (), f64> = polish.state();
    evaluations += cost_count(polish_state);
    iterations += polish_state.get_iter();
    let polish_status = polish_state.get_termination_status().clone();
    let (param, cost) = match polish_state.get_best_param() {
        Some(param) if polish_state.get_best_cost() <= annealing_cost => {
            (param.clone(), polish_state.get_best_cost())
        }
        _ => (best, annealing_cost),
    };
    let (t_c, phi_c) = bounds.project(param[0], param[1]);
    let converged = settled(&annealing_status) && settled(&polish_status);
    let result = OptimizationResult {
        overlap: -cost,
        t_c,
        phi_c,
        evaluations,
        iterations,
        integration_warnings: integral.warnings(),
        converged,
        termination: format!("annealing: {annealing_status:?}, polish: {polish_status:?}"),
    };
    if !converged {
        log::warn!(
            "overlap maximization did not converge ({}), best overlap: {:.6}",
            result.termination,
            result.overlap
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BinaryParameters, SourceParameters, TemplateParameters};
    use std::f64::consts::PI;

    fn unlensed(t0: f64, phi0: f64) -> OverlapIntegral {
        let source = SourceParameters::new(BinaryParameters::default()).with_merger(t0, phi0);
        OverlapIntegral::new(
            &source,
            &TemplateParameters::matching(&source),
            Default::default(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn interval_projection() {
        let t_c = Interval::new(-0.2, 0.2);
        assert_eq!(t_c.project(0.5), 0.2);
        assert_eq!(t_c.project(-0.5), -0.2);
        assert_eq!(t_c.project(0.1), 0.1);
        let phi_c = Interval::periodic(-PI, PI);
        assert!((phi_c.project(PI + 0.5) - (-PI + 0.5)).abs() < 1e-12);
        assert!((phi_c.project(-PI - 0.5) - (PI - 0.5)).abs() < 1e-12);
        assert!((phi_c.project(1f64 + 4f64 * PI) - 1f64).abs() < 1e-12);
        assert!(phi_c.contains(phi_c.project(123.4)));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let integral = unlensed(0f64, 0f64);
        let config = AnnealingConfig::default().seed(5).max_iters(10).polish_iters(5);
        for bounds in [
            Bounds::default().t_c(0.1, -0.1),
            Bounds::default().t_c(0.1, 0.1),
            Bounds::default().t_c(f64::NEG_INFINITY, 0.1),
            Bounds {
                phi_c: Interval::periodic(1f64, 1f64),
                ..Default::default()
            },
            Bounds {
                phi_c: Interval::periodic(f64::NAN, PI),
                ..Default::default()
            },
        ] {
            assert!(
                matches!(
                    maximize_overlap(&integral, &bounds, &config),
                    Err(Error::Domain(DomainError::Interval { .. }))
                ),
                "{bounds:?}"
            );
        }
        assert!(Bounds::default().validate().is_ok());
        // out of order bounds project without panicking
        assert_eq!(Interval::new(0.1, -0.1).project(0.5), -0.1);
    }

    #[test]
    fn recovers_the_source_merger() {
        let (t0, phi0) = (0.0123, 1.1);
        let integral = unlensed(t0, phi0);
        let result =
            maximize_overlap(&integral, &Bounds::default(), &AnnealingConfig::default().seed(7))
                .unwrap();
        assert!((result.overlap - 1f64).abs() < 1e-3, "{result:?}");
        assert!((result.t_c - t0).abs() < 1e-3, "{result:?}");
        let dphi = Interval::periodic(-PI, PI).project(result.phi_c - phi0);
        assert!(dphi.abs() < 1e-2, "{result:?}");
        assert!(result.evaluations > result.iterations);
        assert_eq!(result.cost(), -result.overlap);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let integral = unlensed(0f64, -0.4);
        let config = AnnealingConfig::default().seed(42).max_iters(300).polish_iters(50);
        let a = maximize_overlap(&integral, &Bounds::default(), &config).unwrap();
        let b = maximize_overlap(&integral, &Bounds::default(), &config).unwrap();
        assert_eq!(a.overlap, b.overlap);
        assert_eq!((a.t_c, a.phi_c), (b.t_c, b.phi_c));
    }

    #[test]
    fn results_stay_within_bounds() {
        let integral = unlensed(0.15, 3f64);
        let bounds = Bounds::default().t_c(-0.05, 0.05);
        let config = AnnealingConfig::default().seed(3).max_iters(200).polish_iters(50);
        let result = maximize_overlap(&integral, &bounds, &config).unwrap();
        assert!(bounds.t_c.contains(result.t_c), "{result:?}");
        assert!(bounds.phi_c.contains(result.phi_c), "{result:?}");
        assert!(result.overlap < 1f64);
    }

    #[test]
    fn iteration_budget() {
        let integral = unlensed(0f64, 0f64);
        let config = AnnealingConfig::default()
            .seed(1)
            .max_iters(5)
            .stall_best(1000)
            .polish_iters(2);
        let result = maximize_overlap(&integral, &Bounds::default(), &config).unwrap();
        assert!(!result.converged, "{result:?}");
        assert!(result.iterations <= 7);
        assert!(result.overlap.is_finite());
    }
}
