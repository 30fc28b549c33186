//! Explicit categorical distributions.
//!
//! A pool is an array of (value, weight) pairs. Selection walks the
//! cumulative weights once; no duplicated entries are ever allocated.

use crate::{
    error::{GenError, GenResult},
    rng::StreamRng,
};

#[derive(Debug, Clone)]
pub struct Categorical<T> {
    entries: Vec<(T, f64)>,
    total: f64,
}

impl<T> Categorical<T> {
    /// Build a distribution. Rejects empty pools, negative or
    /// non-finite weights, and pools whose weights sum to zero.
    pub fn new(entries: Vec<(T, f64)>) -> GenResult<Self> {
        if entries.is_empty() {
            return Err(GenError::config("categorical pool is empty"));
        }
        let mut total = 0.0;
        for (_, w) in &entries {
            if !w.is_finite() || *w < 0.0 {
                return Err(GenError::config(format!("invalid weight {w}")));
            }
            total += w;
        }
        if total <= 0.0 {
            return Err(GenError::config("categorical weights sum to zero"));
        }
        Ok(Self { entries, total })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    /// Index of the sampled entry.
    pub fn choose_index(&self, rng: &mut StreamRng) -> usize {
        pick_index(self.entries.iter().map(|(_, w)| *w), self.total, rng)
    }

    pub fn choose(&self, rng: &mut StreamRng) -> &T {
        &self.entries[self.choose_index(rng)].0
    }

    /// Copy of this pool with each weight passed through `f`.
    pub fn reweighted(&self, f: impl Fn(&T, f64) -> f64) -> GenResult<Self>
    where
        T: Clone,
    {
        Self::new(
            self.entries
                .iter()
                .map(|(v, w)| (v.clone(), f(v, *w)))
                .collect(),
        )
    }
}

/// Weighted pick over an iterator of weights with a known total.
/// Falls back to the last positively weighted entry when float rounding
/// leaves a remainder.
pub fn pick_index(
    weights: impl Iterator<Item = f64>,
    total: f64,
    rng: &mut StreamRng,
) -> usize {
    let mut roll = rng.next_f64() * total;
    let mut last = 0;
    for (i, w) in weights.enumerate() {
        if w <= 0.0 {
            continue;
        }
        last = i;
        if roll < w {
            return i;
        }
        roll -= w;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_pools() {
        assert!(Categorical::<u8>::new(vec![]).is_err());
        assert!(Categorical::new(vec![(1u8, 0.0), (2, 0.0)]).is_err());
        assert!(Categorical::new(vec![(1u8, -1.0)]).is_err());
        assert!(Categorical::new(vec![(1u8, f64::NAN)]).is_err());
    }

    #[test]
    fn zero_weight_entries_are_never_chosen() {
        let pool = Categorical::new(vec![("a", 0.0), ("b", 1.0), ("c", 0.0)]).unwrap();
        let mut rng = StreamRng::new(3, 0);
        for _ in 0..500 {
            assert_eq!(*pool.choose(&mut rng), "b");
        }
    }

    #[test]
    fn rounding_remainder_skips_trailing_zero_weights() {
        // A total larger than the weight sum leaves a remainder after the walk.
        let weights = [0.0, 0.4, 0.6, 0.0, 0.0];
        let mut rng = StreamRng::new(5, 0);
        for _ in 0..500 {
            let idx = pick_index(weights.iter().copied(), 10.0, &mut rng);
            assert!(weights[idx] > 0.0, "picked zero-weight index {idx}");
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        let pool = Categorical::new(vec![("sms", 0.7), ("wa", 0.2), ("rcs", 0.1)]).unwrap();
        let mut rng = StreamRng::new(11, 0);
        let mut counts = [0usize; 3];
        for _ in 0..20_000 {
            counts[pool.choose_index(&mut rng)] += 1;
        }
        assert!(counts[0] > counts[1] && counts[1] > counts[2], "{counts:?}");
        let sms_share = counts[0] as f64 / 20_000.0;
        assert!((sms_share - 0.7).abs() < 0.03, "sms share {sms_share}");
    }
}
