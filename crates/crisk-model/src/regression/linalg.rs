//! Small dense linear algebra for Newton steps.

/// Pivots below this magnitude (relative to the largest diagonal) are singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Solves `a x = b` for a row-major `p × p` matrix by Gaussian elimination
/// with partial pivoting.
///
/// Returns the index of the offending column when the matrix is singular.
pub(crate) fn solve(a: &[f64], b: &[f64]) -> Result<Vec<f64>, usize> {
    let p = b.len();
    debug_assert_eq!(a.len(), p * p);

    let scale = (0..p)
        .map(|i| a[i * p + i].abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut m = a.to_vec();
    let mut x = b.to_vec();

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&r1, &r2| m[r1 * p + col].abs().total_cmp(&m[r2 * p + col].abs()))
            .unwrap_or(col);
        let pivot = m[pivot_row * p + col];
        if !pivot.is_finite() || pivot.abs() < SINGULAR_EPS * scale {
            return Err(col);
        }
        if pivot_row != col {
            for k in 0..p {
                m.swap(col * p + k, pivot_row * p + k);
            }
            x.swap(col, pivot_row);
        }

        for row in (col + 1)..p {
            let factor = m[row * p + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..p {
                m[row * p + k] -= factor * m[col * p + k];
            }
            x[row] -= factor * x[col];
        }
    }

    for col in (0..p).rev() {
        let tail = ((col + 1)..p)
            .map(|k| m[col * p + k] * x[k])
            .sum::<f64>();
        x[col] = (x[col] - tail) / m[col * p + col];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_2x2() {
        let a = [4.0, 1.0, 1.0, 3.0];
        let x = solve(&a, &[1.0, 2.0]).unwrap();
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-12);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let a = [0.0, 1.0, 1.0, 0.0];
        assert_eq!(solve(&a, &[2.0, 3.0]).unwrap(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_singular() {
        let a = [1.0, 2.0, 2.0, 4.0];
        assert_eq!(solve(&a, &[1.0, 1.0]), Err(1));
    }
}
