/// First order lowpass filter with time constant `tau`.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lowpass {
    alpha: f32,
    output: Option<f32>,
}

impl Lowpass {
    pub fn new(tau: f32, dt: f32) -> Self {
        Self {
            alpha: dt / (tau + dt),
            output: None,
        }
    }

    /// Feed a new sample through the filter. The first sample initializes
    /// the filter state directly to avoid a startup transient.
    pub fn update(&mut self, input: f32) -> f32 {
        let next = match self.output {
            Some(prev) => prev + self.alpha * (input - prev),
            None => input,
        };
        self.output = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.output = None;
    }

    pub fn get(&self) -> Option<f32> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_sample_passes_through() {
        let mut lp = Lowpass::new(1.0, 0.01);
        assert_abs_diff_eq!(lp.update(5.0), 5.0);
    }

    #[test]
    fn converges_to_constant_input() {
        let mut lp = Lowpass::new(0.1, 0.01);
        lp.update(0.0);
        let mut out = 0.0;
        for _ in 0..1000 {
            out = lp.update(1.0);
        }
        assert_abs_diff_eq!(out, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = Lowpass::new(0.1, 0.01);
        lp.update(10.0);
        lp.reset();
        assert_abs_diff_eq!(lp.update(2.0), 2.0);
    }
}
