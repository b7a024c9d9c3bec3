//! Synthetic data helpers shared by the fake card factories.

use rand::Rng;

/// Returns `n` random integers between `min` and `max`, biased towards
/// `min`, with smooth transitions between consecutive values.
pub fn smooth_random_values(n: usize, min: i32, max: i32) -> Vec<i32> {
    let mut rng = rand::thread_rng();
    let mut values: Vec<i32> = Vec::with_capacity(n);

    for i in 0..n {
        // Prefer lower values.
        let bias: f64 = rng.gen();
        let target = min + (bias.powi(4) * f64::from(max - min)) as i32;

        let mut next = target;
        if i > 0 {
            // Smooth the change from one value to the next.
            let step = rng.gen_range(0..10) - 5;
            next = values[i - 1] + step;
            next = (next * 3 + target) / 4;
        }

        values.push(next.clamp(min, max));
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_within_bounds() {
        for (min, max) in [(0, 250), (10, 100), (-20, 30)] {
            let values = smooth_random_values(24, min, max);
            assert_eq!(values.len(), 24);
            assert!(values.iter().all(|v| (min..=max).contains(v)));
        }
    }

    #[test]
    fn empty_series_is_allowed() {
        assert!(smooth_random_values(0, 0, 100).is_empty());
    }
}
