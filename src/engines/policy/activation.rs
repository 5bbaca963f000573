pub fn tanh_in_place(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = v.tanh();
    }
}

/// Numerically stable softmax; the result sums to 1 and every entry is non-negative.
pub fn softmax_in_place(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 && sum.is_finite() {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Index of the largest entry; the lowest index wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let mut v = vec![1.0, 2.0, 3.0];
        softmax_in_place(&mut v);
        assert!((v.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(v[2] > v[1] && v[1] > v[0]);
    }

    #[test]
    fn test_softmax_large_inputs() {
        let mut v = vec![1000.0, 1000.0, -1000.0];
        softmax_in_place(&mut v);
        assert!((v[0] - 0.5).abs() < 1e-12);
        assert!(v[2] >= 0.0);
    }

    #[test]
    fn test_argmax_ties_pick_lowest() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[1.0 / 3.0; 3]), 0);
    }
}
