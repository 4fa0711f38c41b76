use ndarray::{Array2, ArrayView1};
use sprs::CsVec;

/// Sparse TF-IDF row, one column per vocabulary term.
pub type FeatureVector = CsVec<f64>;

/// Scales the values to unit Euclidean length. A zero vector stays zero.
pub(crate) fn normalize_vector(values: &mut [f64]) {
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 1e-12 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}

/// Builds a feature vector from `(column, value)` pairs in any order.
///
/// Out-of-range columns and zero values are dropped.
pub(crate) fn feature_vector(dim: usize, mut entries: Vec<(usize, f64)>) -> FeatureVector {
    entries.retain(|&(idx, value)| idx < dim && value != 0.0);
    entries.sort_by_key(|&(idx, _)| idx);
    entries.dedup_by_key(|&mut (idx, _)| idx);
    let (indices, data): (Vec<usize>, Vec<f64>) = entries.into_iter().unzip();
    CsVec::new(dim, indices, data)
}

/// Dot product against a dense row, e.g. a weight vector.
pub(crate) fn sparse_dot(x: &FeatureVector, dense: &ArrayView1<f64>) -> f64 {
    x.iter()
        .filter_map(|(idx, &v)| dense.get(idx).map(|w| w * v))
        .sum()
}

/// Stacks the rows into a dense `(n, dim)` matrix.
pub(crate) fn to_dense(vectors: &[FeatureVector], dim: usize) -> Array2<f64> {
    let mut dense = Array2::zeros((vectors.len(), dim));
    for (mut row, x) in dense.rows_mut().into_iter().zip(vectors) {
        for (idx, &v) in x.iter().filter(|(idx, _)| *idx < dim) {
            row[idx] = v;
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_entries_are_sorted_and_zeros_dropped() {
        let v = feature_vector(5, vec![(3, 1.0), (1, 0.0), (0, 2.0), (9, 4.0)]);
        assert_eq!(v.indices(), &[0, 3]);
        assert_eq!(v.data(), &[2.0, 1.0]);
        assert_eq!(v.get(3), Some(&1.0));
        assert_eq!(v.get(1), None);
        assert_eq!(v.dim(), 5);
    }

    #[test]
    fn test_normalize_vector() {
        let mut values = vec![3.0, 4.0];
        normalize_vector(&mut values);
        assert!((values[0] - 0.6).abs() < 1e-12);
        assert!((values[1] - 0.8).abs() < 1e-12);

        let mut zero = vec![0.0, 0.0];
        normalize_vector(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_dot() {
        let v = feature_vector(3, vec![(0, 1.0), (2, 2.0)]);
        let w = array![0.5, 10.0, 0.25];
        assert!((sparse_dot(&v, &w.view()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_to_dense() {
        let rows = vec![feature_vector(3, vec![(1, 2.0)]), feature_vector(3, vec![])];
        assert_eq!(to_dense(&rows, 3), array![[0.0, 2.0, 0.0], [0.0, 0.0, 0.0]]);
    }
}
