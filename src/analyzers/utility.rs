/// Scales values so they sum to 100. Returns all zeros when the total is 0.
pub fn shares(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total * 100.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_sum_to_hundred() {
        let s = shares(&[15.0, 7.0, 3.0]);
        let sum: f64 = s.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((s[0] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_shares_of_zero_total() {
        assert_eq!(shares(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(shares(&[]).is_empty());
    }
}
