use crate::traits::{DynamicalSystem, EmbeddedStepper, Scalar};

fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Dormand-Prince 5(4) pair with first-same-as-last stage reuse.
///
/// The fifth-order solution is propagated; the difference to the embedded
/// fourth-order solution is the error estimate.
pub struct DormandPrince54<T: Scalar> {
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    next: Vec<T>,
    error: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> DormandPrince54<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            next: vec![z; dim],
            error: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> EmbeddedStepper<T> for DormandPrince54<T> {
    fn error_order(&self) -> usize {
        4
    }

    fn attempt(&mut self, system: &impl DynamicalSystem<T>, t: T, state: &[T], deriv: &[T], dt: T) {
        let k1 = deriv;

        let c2 = constant::<T>(1.0 / 5.0);
        let c3 = constant::<T>(3.0 / 10.0);
        let c4 = constant::<T>(4.0 / 5.0);
        let c5 = constant::<T>(8.0 / 9.0);

        let a21 = constant::<T>(1.0 / 5.0);

        let a31 = constant::<T>(3.0 / 40.0);
        let a32 = constant::<T>(9.0 / 40.0);

        let a41 = constant::<T>(44.0 / 45.0);
        let a42 = constant::<T>(-56.0 / 15.0);
        let a43 = constant::<T>(32.0 / 9.0);

        let a51 = constant::<T>(19372.0 / 6561.0);
        let a52 = constant::<T>(-25360.0 / 2187.0);
        let a53 = constant::<T>(64448.0 / 6561.0);
        let a54 = constant::<T>(-212.0 / 729.0);

        let a61 = constant::<T>(9017.0 / 3168.0);
        let a62 = constant::<T>(-355.0 / 33.0);
        let a63 = constant::<T>(46732.0 / 5247.0);
        let a64 = constant::<T>(49.0 / 176.0);
        let a65 = constant::<T>(-5103.0 / 18656.0);

        // b coefficients (5th order); b2 = 0
        let b1 = constant::<T>(35.0 / 384.0);
        let b3 = constant::<T>(500.0 / 1113.0);
        let b4 = constant::<T>(125.0 / 192.0);
        let b5 = constant::<T>(-2187.0 / 6784.0);
        let b6 = constant::<T>(11.0 / 84.0);

        // e = b - b_hat (5th minus embedded 4th order); e2 = 0
        let e1 = constant::<T>(71.0 / 57600.0);
        let e3 = constant::<T>(-71.0 / 16695.0);
        let e4 = constant::<T>(71.0 / 1920.0);
        let e5 = constant::<T>(-17253.0 / 339200.0);
        let e6 = constant::<T>(22.0 / 525.0);
        let e7 = constant::<T>(-1.0 / 40.0);

        let n = state.len();

        // k2
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a21 * k1[i]);
        }
        system.apply(t + c2 * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a31 * k1[i] + a32 * self.k2[i]);
        }
        system.apply(t + c3 * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a41 * k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t + c4 * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a51 * k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t + c5 * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a61 * k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t + dt, &self.tmp, &mut self.k6);

        // Proposed state
        for i in 0..n {
            self.next[i] = state[i]
                + dt * (b1 * k1[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }

        // k7 = f(t + dt, next), reused as k1 of the following step
        system.apply(t + dt, &self.next, &mut self.k7);

        for i in 0..n {
            self.error[i] = dt
                * (e1 * k1[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
        }
    }

    fn proposal(&self) -> &[T] {
        &self.next
    }

    fn proposal_derivative(&self) -> &[T] {
        &self.k7
    }

    fn error_estimate(&self) -> &[T] {
        &self.error
    }
}

#[cfg(test)]
mod tests {
    use super::DormandPrince54;
    use crate::traits::{DynamicalSystem, EmbeddedStepper};

    struct Decay;

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[0];
        }
    }

    struct Polynomial;

    impl DynamicalSystem<f64> for Polynomial {
        fn dimension(&self) -> usize {
            1
        }

        // x' = 4 t^3, exact for a fourth-order method
        fn apply(&self, t: f64, _x: &[f64], out: &mut [f64]) {
            out[0] = 4.0 * t * t * t;
        }
    }

    #[test]
    fn single_step_matches_exponential_decay() {
        let mut stepper = DormandPrince54::<f64>::new(1);
        let dt = 0.1;
        stepper.attempt(&Decay, 0.0, &[1.0], &[-1.0], dt);
        let expected = (-dt).exp();
        assert!((stepper.proposal()[0] - expected).abs() < 1e-9);
        assert!((stepper.proposal_derivative()[0] + stepper.proposal()[0]).abs() < 1e-15);
        assert!(stepper.error_estimate()[0].abs() < 1e-6);
    }

    #[test]
    fn quartic_quadrature_has_vanishing_error_estimate() {
        let mut stepper = DormandPrince54::<f64>::new(1);
        stepper.attempt(&Polynomial, 0.0, &[0.0], &[0.0], 1.0);
        assert!((stepper.proposal()[0] - 1.0).abs() < 1e-12);
        assert!(stepper.error_estimate()[0].abs() < 1e-12);
    }

    #[test]
    fn stepper_works_with_single_precision() {
        struct DecayF32;
        impl DynamicalSystem<f32> for DecayF32 {
            fn dimension(&self) -> usize {
                1
            }
            fn apply(&self, _t: f32, x: &[f32], out: &mut [f32]) {
                out[0] = -x[0];
            }
        }

        let mut stepper = DormandPrince54::<f32>::new(1);
        stepper.attempt(&DecayF32, 0.0, &[1.0], &[-1.0], 0.1);
        assert!((stepper.proposal()[0] - (-0.1f32).exp()).abs() < 1e-5);
    }
}
