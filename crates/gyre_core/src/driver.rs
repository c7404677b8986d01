use crate::error_norm::relative_error;
use crate::track::{FieldTrack, MAX_COMPONENTS};
use crate::traits::{EquationOfMotion, Stepper};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A grown step never exceeds five times the accepted one.
const MAX_STEPPING_INCREASE: f64 = 5.0;
/// A shrunk retrial step never drops below a tenth of the rejected one.
const MAX_STEPPING_DECREASE: f64 = 0.1;
/// Bound on the retry loop of a single trial step.
const MAX_TRIALS: usize = 100;
/// The step budget is this base divided by the stepper's order.
const MAX_STEP_BASE: usize = 250;

const PER_MILLION: f64 = 1e-6;
const PER_THOUSAND: f64 = 1e-3;

/// Conditions the driver cannot recover from locally.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The enclosing operation must be aborted; a negative interval has
    /// no meaning for a forward arc-length integration.
    #[error("proposed step is negative (hstep = {0}); requested step cannot be negative")]
    NegativeProposedStep(f64),

    /// The equation of motion and the stepper disagree on how many
    /// state components are active.
    #[error("equation of motion has {equation} components but the stepper integrates {stepper}")]
    DimensionMismatch { equation: usize, stepper: usize },
}

/// Tunable configuration of an [`IntegrationDriver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverParameters {
    /// Steps at or below this length are taken once, without retry.
    pub minimum_step: f64,
    /// Once the remaining distance falls below this fraction of the
    /// starting curve length the advance stops, avoiding arbitrarily
    /// many vanishing final steps.
    pub smallest_fraction: f64,
    /// Safety factor applied to every grow/shrink adjustment.
    pub safety: f64,
    /// Divided by the stepper's order to give the step budget.
    pub max_step_base: usize,
}

impl DriverParameters {
    pub fn new(minimum_step: f64) -> Self {
        Self {
            minimum_step,
            smallest_fraction: 1e-12,
            safety: 0.9,
            max_step_base: MAX_STEP_BASE,
        }
    }
}

/// Adaptive Runge-Kutta driver: advances one track at a time across a
/// requested arc-length interval, retrying and resizing trial steps so
/// the local error stays within the caller's tolerance.
///
/// Owns its equation of motion and stepper; scratch buffers and the
/// diagnostic counters are mutated per call, so one driver serves one
/// concurrently-integrating track. Counters are per instance, reset at
/// construction, and never influence the accept/reject decisions.
pub struct IntegrationDriver<E, S> {
    equation: E,
    stepper: S,
    params: DriverParameters,

    // Derived from the stepper's order.
    pshrink: f64,
    pgrow: f64,
    errcon: f64,
    max_no_steps: usize,

    // Diagnostics only.
    total_steps: u64,
    bad_steps: u64,
    severe_bad_steps: u64,
    small_steps: u64,
}

impl<E, S> IntegrationDriver<E, S>
where
    E: EquationOfMotion<f64>,
    S: Stepper<f64>,
{
    /// Builds a driver around an equation/stepper pair, rejecting a
    /// mismatch in their active component counts.
    pub fn new(minimum_step: f64, equation: E, stepper: S) -> Result<Self, DriverError> {
        if equation.dimension() != stepper.num_variables() {
            return Err(DriverError::DimensionMismatch {
                equation: equation.dimension(),
                stepper: stepper.num_variables(),
            });
        }

        let mut driver = Self {
            equation,
            stepper,
            params: DriverParameters::new(minimum_step),
            pshrink: 0.0,
            pgrow: 0.0,
            errcon: 0.0,
            max_no_steps: 0,
            total_steps: 0,
            bad_steps: 0,
            severe_bad_steps: 0,
            small_steps: 0,
        };
        driver.reset_parameters();
        Ok(driver)
    }

    /// Recomputes the step-size exponents and the step budget from the
    /// stepper's formal order.
    fn reset_parameters(&mut self) {
        let order = self.stepper.integrator_order();
        self.pshrink = -1.0 / order as f64;
        self.pgrow = -1.0 / (order as f64 + 1.0);
        // Largest error score for which the full 5x growth still applies.
        self.errcon = (MAX_STEPPING_INCREASE / self.params.safety).powf(1.0 / self.pgrow);
        self.max_no_steps = self.params.max_step_base / order;
    }

    /// Advances the track from its current curve length by `hstep`,
    /// keeping each accepted step's relative error within `eps`.
    ///
    /// `hinitial` proposes the first trial step; it is honored only when
    /// it lies strictly between a millionth of `hstep` and `hstep`.
    ///
    /// Returns `Ok(true)` when the target was reached, `Ok(false)` when
    /// the step budget ran out first — the track is then left at its
    /// best-effort position, not rolled back. A zero `hstep` is a
    /// warned no-op; a negative one is fatal for the caller.
    pub fn accurate_advance(
        &mut self,
        track: &mut FieldTrack<f64>,
        hstep: f64,
        eps: f64,
        hinitial: Option<f64>,
    ) -> Result<bool, DriverError> {
        if hstep == 0.0 {
            eprintln!("accurate_advance: proposed step is zero; nothing to do");
            return Ok(true);
        }
        if hstep < 0.0 {
            return Err(DriverError::NegativeProposedStep(hstep));
        }

        let mut y = [0.0; MAX_COMPONENTS];
        let mut dydx = [0.0; MAX_COMPONENTS];
        track.dump_to_array(&mut y);

        let start_curve_length = track.curve_length();
        let x1 = start_curve_length;
        let x2 = x1 + hstep;
        let mut x = x1;

        let mut h = hstep;
        if let Some(hinit) = hinitial {
            if hinit > PER_MILLION * hstep && hinit < hstep {
                h = hinit;
            }
        }

        let mut last_step = false;
        let mut nstp = 1usize;

        loop {
            let start_pos = Vector3::new(y[0], y[1], y[2]);

            self.equation.evaluate(&y, &mut dydx);
            self.total_steps += 1;

            let (hdid, hnext) = if h > self.params.minimum_step {
                self.one_good_step(&mut y, &dydx, &mut x, h, eps)
            } else {
                // Steps at or below the minimum are assumed acceptable;
                // retrying them could loop forever.
                let mut ytemp = [0.0; MAX_COMPONENTS];
                let mut yerr = [0.0; MAX_COMPONENTS];
                self.stepper.step(&self.equation, &y, &dydx, h, &mut ytemp, &mut yerr);
                let n = self.stepper.num_variables();
                y[..n].copy_from_slice(&ytemp[..n]);
                let dyerr = relative_error(&y, &yerr, h, eps);
                x += h;
                self.small_steps += 1;
                (h, self.compute_new_step_size(dyerr, h))
            };

            // Chord-vs-curve-length sanity counters; purely diagnostic.
            let end_pos = Vector3::new(y[0], y[1], y[2]);
            let end_point_dist = (end_pos - start_pos).norm();
            if end_point_dist >= hdid * (1.0 + PER_MILLION) {
                self.bad_steps += 1;
                if end_point_dist >= hdid * (1.0 + PER_THOUSAND) {
                    self.severe_bad_steps += 1;
                }
            }

            // Avoid numerous vanishingly small last steps.
            if h < eps * hstep || h < self.params.smallest_fraction * start_curve_length {
                last_step = true;
            } else {
                h = hnext.max(self.params.minimum_step);

                // Never overshoot the requested end point.
                if x + h > x2 {
                    h = x2 - x;
                }

                if h == 0.0 {
                    // Cannot progress; accept this as the last step.
                    last_step = true;
                }
            }

            let within_budget = nstp <= self.max_no_steps;
            nstp += 1;
            if !(within_budget && x < x2 && !last_step) {
                break;
            }
        }

        let mut succeeded = x >= x2;

        track.load_from_array(&y, self.stepper.num_variables());
        track.set_curve_length(x);

        if nstp > self.max_no_steps {
            succeeded = false;
        }

        Ok(succeeded)
    }

    /// One trial step with retry, after Numerical Recipes' `rkqs`:
    /// shrink and retry while the error score exceeds 1, then suggest a
    /// grown step for the next trial. Returns `(hdid, hnext)` and
    /// advances `curve_length` by `hdid`.
    ///
    /// If `MAX_TRIALS` shrinks never reach an acceptable score the last
    /// attempt is accepted anyway; only the outer step budget can turn
    /// that into a reported failure.
    pub fn one_good_step(
        &mut self,
        y: &mut [f64; MAX_COMPONENTS],
        dydx: &[f64; MAX_COMPONENTS],
        curve_length: &mut f64,
        htry: f64,
        eps: f64,
    ) -> (f64, f64) {
        let mut ytemp = [0.0; MAX_COMPONENTS];
        let mut yerr = [0.0; MAX_COMPONENTS];

        let mut h = htry;
        let mut trials = 0;

        let error = loop {
            self.stepper
                .step(&self.equation, &y[..], &dydx[..], h, &mut ytemp, &mut yerr);
            let error = relative_error(&y[..], &yerr, h, eps);

            trials += 1;
            if error <= 1.0 || trials >= MAX_TRIALS {
                break error;
            }

            h = self.shrink_step_size(h, error);
        };

        let hnext = self.grow_step_size(h, error);
        *curve_length += h;

        let n = self.stepper.num_variables();
        y[..n].copy_from_slice(&ytemp[..n]);

        (h, hnext)
    }

    /// Exactly one stepper call, no retry and no step-size management;
    /// writes the result into the track and hands the chord deviation
    /// and the raw (tolerance-free) error score to the caller, which
    /// runs its own stepping policy.
    pub fn quick_advance(
        &mut self,
        track: &mut FieldTrack<f64>,
        dydx: &[f64; MAX_COMPONENTS],
        hstep: f64,
    ) -> (f64, f64) {
        let mut y_in = [0.0; MAX_COMPONENTS];
        let mut y_out = [0.0; MAX_COMPONENTS];
        let mut yerr = [0.0; MAX_COMPONENTS];

        track.dump_to_array(&mut y_in);
        let s_start = track.curve_length();

        self.stepper
            .step(&self.equation, &y_in, &dydx[..], hstep, &mut y_out, &mut yerr);
        let dchord = self.stepper.dist_chord(&self.equation);

        track.load_from_array(&y_out, self.stepper.num_variables());
        track.set_curve_length(s_start + hstep);

        let dyerr = relative_error(&y_out, &yerr, hstep, 1.0);

        (dchord, dyerr)
    }

    /// Derivative of the track's current state, without mutating the
    /// track.
    pub fn get_derivatives(&self, track: &FieldTrack<f64>, dydx: &mut [f64; MAX_COMPONENTS]) {
        let mut y = [0.0; MAX_COMPONENTS];
        track.dump_to_array(&mut y);
        self.equation.evaluate(&y, &mut dydx[..]);
    }

    /// Step-size suggestion without the grow/shrink clamping guarantees
    /// of the retry loop; used after unconditionally accepted steps.
    pub fn compute_new_step_size(&self, error: f64, h: f64) -> f64 {
        if error > 1.0 {
            return self.shrink_step_size(h, error);
        } else if error >= 0.0 {
            return self.grow_step_size(h, error);
        }

        // A negative error estimate is dubious; grow at the cap.
        MAX_STEPPING_INCREASE * h
    }

    /// Retrial step after a failure; shrinks by at most a factor of 10.
    fn shrink_step_size(&self, h: f64, error: f64) -> f64 {
        let htemp = self.params.safety * h * error.powf(self.pshrink);
        htemp.max(MAX_STEPPING_DECREASE * h)
    }

    /// Suggested next step after an acceptance; grows by at most a
    /// factor of 5.
    fn grow_step_size(&self, h: f64, error: f64) -> f64 {
        if error > self.errcon {
            return self.params.safety * h * error.powf(self.pgrow);
        }
        MAX_STEPPING_INCREASE * h
    }

    /// Accepted only inside (1e-16, 1e-8); out-of-range proposals are
    /// warned about and the previous value retained.
    pub fn set_smallest_fraction(&mut self, fraction: f64) {
        if fraction > 1e-16 && fraction < 1e-8 {
            self.params.smallest_fraction = fraction;
        } else {
            eprintln!(
                "set_smallest_fraction: proposed value {fraction:e} is outside (1e-16, 1e-8); keeping {:e}",
                self.params.smallest_fraction
            );
        }
    }

    pub fn set_minimum_step(&mut self, minimum_step: f64) {
        self.params.minimum_step = minimum_step;
    }

    pub fn set_max_step_base(&mut self, max_step_base: usize) {
        self.params.max_step_base = max_step_base;
        self.max_no_steps = max_step_base / self.stepper.integrator_order();
    }

    pub fn smallest_fraction(&self) -> f64 {
        self.params.smallest_fraction
    }

    pub fn minimum_step(&self) -> f64 {
        self.params.minimum_step
    }

    pub fn parameters(&self) -> &DriverParameters {
        &self.params
    }

    /// Derivative evaluations begun by the advance loop.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Steps whose endpoint distance exceeded the accepted step length
    /// by more than one part per million.
    pub fn bad_steps(&self) -> u64 {
        self.bad_steps
    }

    /// Steps whose endpoint distance exceeded the accepted step length
    /// by more than one part per thousand.
    pub fn severe_bad_steps(&self) -> u64 {
        self.severe_bad_steps
    }

    /// Steps taken through the unconditional below-minimum path.
    pub fn small_steps(&self) -> u64 {
        self.small_steps
    }
}

#[cfg(test)]
mod tests {
    use super::{DriverError, IntegrationDriver};
    use crate::steppers::{CashKarp45, ClassicalRk4, DormandPrince56};
    use crate::track::{FieldTrack, MAX_COMPONENTS};
    use crate::traits::EquationOfMotion;

    /// Uniform field along z: momentum turns at rate `kappa` per unit
    /// arc length; the position traces a circle of radius 1/kappa.
    struct UniformField {
        kappa: f64,
    }

    impl EquationOfMotion<f64> for UniformField {
        fn dimension(&self) -> usize {
            6
        }

        fn evaluate(&self, y: &[f64], dydx: &mut [f64]) {
            let p = (y[3] * y[3] + y[4] * y[4] + y[5] * y[5]).sqrt();
            dydx[0] = y[3] / p;
            dydx[1] = y[4] / p;
            dydx[2] = y[5] / p;
            dydx[3] = self.kappa * y[4];
            dydx[4] = -self.kappa * y[3];
            dydx[5] = 0.0;
        }
    }

    struct StraightLine;

    impl EquationOfMotion<f64> for StraightLine {
        fn dimension(&self) -> usize {
            6
        }

        fn evaluate(&self, y: &[f64], dydx: &mut [f64]) {
            let p = (y[3] * y[3] + y[4] * y[4] + y[5] * y[5]).sqrt();
            dydx[0] = y[3] / p;
            dydx[1] = y[4] / p;
            dydx[2] = y[5] / p;
            dydx[3] = 0.0;
            dydx[4] = 0.0;
            dydx[5] = 0.0;
        }
    }

    fn circle_solution(kappa: f64, s: f64) -> [f64; 6] {
        let theta = kappa * s;
        [
            theta.sin() / kappa,
            (theta.cos() - 1.0) / kappa,
            0.0,
            theta.cos(),
            -theta.sin(),
            0.0,
        ]
    }

    fn fresh_track() -> FieldTrack<f64> {
        FieldTrack::new(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.0)
    }

    fn circle_driver(
        kappa: f64,
    ) -> IntegrationDriver<UniformField, DormandPrince56<f64>> {
        IntegrationDriver::new(1e-10, UniformField { kappa }, DormandPrince56::new(6))
            .expect("dimensions agree")
    }

    #[test]
    fn construction_rejects_dimension_mismatch() {
        let result = IntegrationDriver::new(1e-10, UniformField { kappa: 0.1 }, CashKarp45::new(8));
        assert!(matches!(
            result,
            Err(DriverError::DimensionMismatch {
                equation: 6,
                stepper: 8
            })
        ));
    }

    #[test]
    fn accurate_advance_matches_the_analytic_circle() {
        let kappa = 0.05;
        let hstep = 30.0; // 1.5 radians of turning
        let eps = 1e-7;

        let mut driver = circle_driver(kappa);
        let mut track = fresh_track();

        let reached = driver
            .accurate_advance(&mut track, hstep, eps, None)
            .expect("forward advance");
        assert!(reached);
        assert!((track.curve_length() - hstep).abs() < 1e-9);

        let expected = circle_solution(kappa, hstep);
        let mut y = [0.0; MAX_COMPONENTS];
        track.dump_to_array(&mut y);
        for i in 0..6 {
            assert!(
                (y[i] - expected[i]).abs() < 1e-5,
                "component {i}: {} vs {}",
                y[i],
                expected[i]
            );
        }
    }

    #[test]
    fn result_is_independent_of_the_initial_trial_step() {
        let kappa = 0.05;
        let hstep = 20.0;
        let eps = 1e-8;

        let mut defaulted = fresh_track();
        circle_driver(kappa)
            .accurate_advance(&mut defaulted, hstep, eps, None)
            .unwrap();

        let mut hinted = fresh_track();
        circle_driver(kappa)
            .accurate_advance(&mut hinted, hstep, eps, Some(0.01))
            .unwrap();

        let (mut a, mut b) = ([0.0; MAX_COMPONENTS], [0.0; MAX_COMPONENTS]);
        defaulted.dump_to_array(&mut a);
        hinted.dump_to_array(&mut b);
        for i in 0..6 {
            assert!((a[i] - b[i]).abs() < 1e-6, "component {i}");
        }
    }

    #[test]
    fn zero_hstep_is_a_successful_no_op() {
        let mut driver = circle_driver(0.1);
        let mut track = fresh_track();
        let before = track.clone();

        let reached = driver
            .accurate_advance(&mut track, 0.0, 1e-6, None)
            .expect("zero step is not an error");
        assert!(reached);
        assert_eq!(track, before);
        assert_eq!(driver.total_steps(), 0);
    }

    #[test]
    fn negative_hstep_is_fatal() {
        let mut driver = circle_driver(0.1);
        let mut track = fresh_track();

        let result = driver.accurate_advance(&mut track, -1.0, 1e-6, None);
        assert!(matches!(
            result,
            Err(DriverError::NegativeProposedStep(h)) if h == -1.0
        ));
    }

    #[test]
    fn split_intervals_agree_with_a_single_advance() {
        let kappa = 0.02;
        let eps = 1e-8;
        let total = 40.0;

        let mut whole = fresh_track();
        circle_driver(kappa)
            .accurate_advance(&mut whole, total, eps, None)
            .unwrap();

        let mut split = fresh_track();
        let mut driver = circle_driver(kappa);
        driver.accurate_advance(&mut split, 15.0, eps, None).unwrap();
        driver.accurate_advance(&mut split, 25.0, eps, None).unwrap();

        assert!((whole.curve_length() - split.curve_length()).abs() < 1e-9);
        let (mut a, mut b) = ([0.0; MAX_COMPONENTS], [0.0; MAX_COMPONENTS]);
        whole.dump_to_array(&mut a);
        split.dump_to_array(&mut b);
        for i in 0..6 {
            assert!((a[i] - b[i]).abs() < 1e-5, "component {i}");
        }
    }

    #[test]
    fn exhausted_step_budget_reports_failure_but_keeps_progress() {
        let kappa = 1.0;
        let mut driver =
            IntegrationDriver::new(1e-12, UniformField { kappa }, CashKarp45::new(6)).unwrap();
        driver.set_max_step_base(8); // budget of two steps for an order-4 pair

        let mut track = fresh_track();
        let reached = driver
            .accurate_advance(&mut track, 1000.0, 1e-10, Some(1e-2))
            .expect("budget exhaustion is not fatal");
        assert!(!reached);
        assert!(track.curve_length() > 0.0);
        assert!(track.curve_length() < 1000.0);
    }

    #[test]
    fn one_good_step_accepts_within_tolerance() {
        let kappa = 0.1;
        let eps = 1e-6;
        let mut driver = circle_driver(kappa);

        let mut y = [0.0; MAX_COMPONENTS];
        y[3] = 1.0;
        let mut dydx = [0.0; MAX_COMPONENTS];
        driver.equation.evaluate(&y, &mut dydx);

        let mut s = 0.0;
        let (hdid, hnext) = driver.one_good_step(&mut y, &dydx, &mut s, 1.0, eps);

        assert!(hdid > 0.0 && hdid <= 1.0);
        assert_eq!(s, hdid);
        assert!(hnext <= 5.0 * hdid + 1e-12);
        // The accepted state moved along the arc.
        assert!(y[0] > 0.0);
    }

    #[test]
    fn shrink_and_grow_respect_their_clamps() {
        let driver = circle_driver(0.1);

        // Even an enormous error shrinks by no more than a factor of 10.
        assert!((driver.shrink_step_size(1.0, 1e12) - 0.1).abs() < 1e-15);
        // A moderate failure shrinks by the safety-weighted power law.
        let shrunk = driver.shrink_step_size(1.0, 2.0);
        assert!(shrunk < 1.0 && shrunk > 0.1);

        // A tiny error grows by exactly the cap.
        assert!((driver.grow_step_size(1.0, 1e-12) - 5.0).abs() < 1e-15);
        // A borderline error grows by less than the cap.
        let grown = driver.grow_step_size(1.0, 0.5);
        assert!(grown > 1.0 && grown < 5.0);

        // compute_new_step_size covers the dubious negative estimate.
        assert_eq!(driver.compute_new_step_size(-1.0, 2.0), 10.0);
    }

    #[test]
    fn quick_advance_reports_chord_and_error() {
        let kappa = 0.1;
        let mut driver = circle_driver(kappa);
        let mut track = fresh_track();

        let mut dydx = [0.0; MAX_COMPONENTS];
        driver.get_derivatives(&track, &mut dydx);

        let h = 2.0;
        let (dchord, dyerr) = driver.quick_advance(&mut track, &dydx, h);

        assert_eq!(track.curve_length(), h);
        let sagitta = (1.0 / kappa) * (1.0 - (kappa * h / 2.0).cos());
        assert!(dchord > 0.0);
        assert!((dchord - sagitta).abs() < 0.2 * sagitta);
        assert!(dyerr.is_finite() && dyerr >= 0.0);
    }

    #[test]
    fn quick_advance_on_a_straight_track_has_zero_chord() {
        let mut driver =
            IntegrationDriver::new(1e-10, StraightLine, DormandPrince56::new(6)).unwrap();
        let mut track = fresh_track();

        let mut dydx = [0.0; MAX_COMPONENTS];
        driver.get_derivatives(&track, &mut dydx);
        let (dchord, _) = driver.quick_advance(&mut track, &dydx, 3.0);
        assert!(dchord < 1e-14);
        assert!((track.position().x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn get_derivatives_does_not_mutate_the_track() {
        let driver = circle_driver(0.3);
        let track = fresh_track();
        let before = track.clone();

        let mut dydx = [0.0; MAX_COMPONENTS];
        driver.get_derivatives(&track, &mut dydx);

        assert_eq!(track, before);
        assert!((dydx[0] - 1.0).abs() < 1e-15);
        assert!((dydx[4] + 0.3).abs() < 1e-15);
    }

    #[test]
    fn counters_accumulate_across_advances() {
        let mut driver = circle_driver(0.05);
        let mut track = fresh_track();

        driver.accurate_advance(&mut track, 10.0, 1e-7, None).unwrap();
        let after_first = driver.total_steps();
        assert!(after_first > 0);

        driver.accurate_advance(&mut track, 10.0, 1e-7, None).unwrap();
        assert!(driver.total_steps() > after_first);
    }

    #[test]
    fn below_minimum_steps_take_the_unconditional_path() {
        let mut driver =
            IntegrationDriver::new(0.5, UniformField { kappa: 0.1 }, CashKarp45::new(6)).unwrap();
        let mut track = fresh_track();

        // The whole interval sits below the minimum step, so the first
        // trial goes through the no-retry branch.
        driver.accurate_advance(&mut track, 0.25, 1e-6, None).unwrap();
        assert!(driver.small_steps() > 0);
    }

    #[test]
    fn smallest_fraction_setter_rejects_out_of_range_values() {
        let mut driver = circle_driver(0.1);
        let initial = driver.smallest_fraction();

        driver.set_smallest_fraction(1e-3);
        assert_eq!(driver.smallest_fraction(), initial);

        driver.set_smallest_fraction(1e-17);
        assert_eq!(driver.smallest_fraction(), initial);

        driver.set_smallest_fraction(1e-10);
        assert_eq!(driver.smallest_fraction(), 1e-10);
    }

    #[test]
    fn works_with_the_classical_rk4_variant() {
        let kappa = 0.05;
        let hstep = 10.0;
        let mut driver =
            IntegrationDriver::new(1e-10, UniformField { kappa }, ClassicalRk4::new(6)).unwrap();
        let mut track = fresh_track();

        let reached = driver
            .accurate_advance(&mut track, hstep, 1e-6, None)
            .unwrap();
        assert!(reached);

        let expected = circle_solution(kappa, hstep);
        let mut y = [0.0; MAX_COMPONENTS];
        track.dump_to_array(&mut y);
        for i in 0..6 {
            assert!((y[i] - expected[i]).abs() < 1e-4, "component {i}");
        }
    }
}
