use crate::tuple::CompareOp;

/// Per-bucket state: a count plus the value bounds used for
/// interpolation.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u64,
    lo: i32,
    hi: i32,
}

/// Equi-width histogram over a single integer column, used for selectivity
/// estimation. Updates are constant space and constant time: only bucket
/// counts and bounds are kept, never the values themselves.
#[derive(Debug)]
pub struct IntHistogram {
    min: i32,
    max: i32,
    width: i32,
    buckets: Vec<Bucket>,
    total: u64,
}

impl IntHistogram {
    /// Creates a histogram with `buckets` equal-width bins covering
    /// `[min, max]`.
    ///
    /// # Panics
    /// Panics if `buckets` is zero or `min > max`.
    pub fn new(buckets: usize, min: i32, max: i32) -> Self {
        assert!(buckets > 0, "A histogram needs at least one bucket");
        assert!(min <= max, "Histogram bounds out of order");

        let width = (max - min) / buckets as i32 + 1;
        let buckets = (0..buckets as i32)
            .map(|i| Bucket {
                count: 0,
                lo: min + width * i,
                hi: min + width * (i + 1),
            })
            .collect();

        Self {
            min,
            max,
            width,
            buckets,
            total: 0,
        }
    }

    fn bucket_index(&self, v: i32) -> usize {
        ((v - self.min) / self.width) as usize
    }

    fn bucket_width(&self, idx: usize) -> f64 {
        (self.buckets[idx].hi - self.buckets[idx].lo + 1) as f64
    }

    /// Records one value. The value must lie within `[min, max]`.
    pub fn add_value(&mut self, v: i32) {
        let idx = self.bucket_index(v);
        let bucket = &mut self.buckets[idx];
        bucket.count += 1;
        bucket.lo = bucket.lo.min(v);
        bucket.hi = bucket.hi.max(v);
        self.total += 1;
    }

    /// Estimates the fraction of recorded values satisfying `v' op v`.
    /// Always within `[0, 1]`; for an in-range `v`, the EQUALS and
    /// NOT_EQUALS estimates sum to one.
    pub fn estimate_selectivity(&self, op: CompareOp, v: i32) -> f64 {
        if self.total == 0 {
            return match op {
                CompareOp::NotEquals | CompareOp::Like => 1.0,
                _ => 0.0,
            };
        }

        if v < self.min {
            return match op {
                CompareOp::GreaterThan | CompareOp::GreaterThanOrEq | CompareOp::NotEquals => 1.0,
                CompareOp::Like => 1.0,
                _ => 0.0,
            };
        }
        if v > self.max {
            return match op {
                CompareOp::LessThan | CompareOp::LessThanOrEq | CompareOp::NotEquals => 1.0,
                CompareOp::Like => 1.0,
                _ => 0.0,
            };
        }

        let idx = self.bucket_index(v);
        let total = self.total as f64;
        let in_bucket = self.buckets[idx].count as f64;

        let estimate = match op {
            CompareOp::Equals => in_bucket / total,
            CompareOp::NotEquals => 1.0 - in_bucket / total,
            CompareOp::Like => 1.0,
            CompareOp::LessThan | CompareOp::LessThanOrEq => {
                let below: u64 = self.buckets[..idx].iter().map(|b| b.count).sum();
                let fraction = (v - self.buckets[idx].lo) as f64 / self.bucket_width(idx);
                let mut res = below as f64 + fraction * in_bucket;
                if op == CompareOp::LessThanOrEq {
                    res += in_bucket / self.bucket_width(idx);
                }
                res / total
            }
            CompareOp::GreaterThan | CompareOp::GreaterThanOrEq => {
                let above: u64 = self.buckets[idx + 1..].iter().map(|b| b.count).sum();
                let fraction = (self.buckets[idx].hi - v) as f64 / self.bucket_width(idx);
                let mut res = above as f64 + fraction * in_bucket;
                if op == CompareOp::GreaterThanOrEq {
                    res += in_bucket / self.bucket_width(idx);
                }
                res / total
            }
        };

        estimate.clamp(0.0, 1.0)
    }
}
