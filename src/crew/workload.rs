/*!
 * Workloads
 *
 * What a worker runs on each item: takes the item, returns its scalar
 * contribution to the crew total. Always runs outside the crew mutex.
 */

use super::work::WorkItem;
use rand::Rng;

/// Per-item computation run by crew workers
pub trait Workload: Send + Sync + 'static {
    fn process(&self, item: &WorkItem) -> f64;
}

impl<F> Workload for F
where
    F: Fn(&WorkItem) -> f64 + Send + Sync + 'static,
{
    fn process(&self, item: &WorkItem) -> f64 {
        self(item)
    }
}

/// CPU-bound floating-point churn whose result equals the item's data sum
///
/// Each data point gets `iterations` rounds of adding and then subtracting
/// a random value, so the contribution only drifts by rounding error.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticWorkload {
    pub iterations: u64,
}

impl SyntheticWorkload {
    pub fn new(iterations: u64) -> Self {
        Self { iterations }
    }
}

impl Workload for SyntheticWorkload {
    fn process(&self, item: &WorkItem) -> f64 {
        let mut rng = rand::thread_rng();
        let mut total = 0.0;
        for &value in &item.data {
            let mut acc = value;
            for _ in 0..self.iterations {
                let noise: f64 = rng.gen_range(0.0..1.0);
                acc += noise;
                acc -= noise;
            }
            total += acc;
        }
        total
    }
}

/// Deterministic workload: data sum plus a fixed delta
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWorkload {
    pub delta: f64,
}

impl FixedWorkload {
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }
}

impl Workload for FixedWorkload {
    fn process(&self, item: &WorkItem) -> f64 {
        item.sum() + self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_workload() {
        let item = WorkItem::new(vec![1.0, 2.5]);
        assert_eq!(FixedWorkload::new(0.0).process(&item), 3.5);
        assert_eq!(FixedWorkload::new(1.0).process(&item), 4.5);
    }

    #[test]
    fn test_synthetic_workload_returns_data_sum() {
        let item = WorkItem::single(10.0);
        let result = SyntheticWorkload::new(1000).process(&item);
        assert!((result - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_closure_workload() {
        let double = |item: &WorkItem| item.sum() * 2.0;
        assert_eq!(double.process(&WorkItem::single(4.0)), 8.0);
    }
}
