//! Percentage share of each bucket within its chart

use crate::assemble::Bucket;

/// `round(100 · count / total, 1)` formatted with one decimal; `"0.0"` when `total` is zero
pub fn percentage(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    let share = (count as f64 * 100.0 / total as f64 * 10.0).round() / 10.0;
    format!("{share:.1}")
}

/// Fill in `percentage` on every bucket from the buckets' own total
pub fn annotate(buckets: &mut [Bucket]) -> u64 {
    let total: u64 = buckets.iter().map(|b| b.count).sum();
    for bucket in buckets.iter_mut() {
        bucket.percentage = percentage(bucket.count, total);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total() {
        assert_eq!(percentage(0, 0), "0.0");
        assert_eq!(percentage(5, 0), "0.0");
    }

    #[test]
    fn test_one_decimal_rounding() {
        assert_eq!(percentage(1, 23), "4.3");
        assert_eq!(percentage(1, 3), "33.3");
        assert_eq!(percentage(2, 3), "66.7");
        assert_eq!(percentage(1, 8), "12.5");
        assert_eq!(percentage(4, 4), "100.0");
        assert_eq!(percentage(0, 4), "0.0");
    }

    #[test]
    fn test_annotated_shares_sum_to_about_100() {
        let mut buckets: Vec<Bucket> = [3u64, 7, 11, 0, 1]
            .iter()
            .enumerate()
            .map(|(i, count)| Bucket::test_bucket(&i.to_string(), *count))
            .collect();
        let total = annotate(&mut buckets);
        assert_eq!(total, 22);

        let sum: f64 = buckets
            .iter()
            .map(|b| b.percentage.parse::<f64>().expect("numeric"))
            .sum();
        assert!((sum - 100.0).abs() <= 0.05 * buckets.len() as f64, "sum {sum}");
        assert_eq!(buckets[3].percentage, "0.0");
    }
}
