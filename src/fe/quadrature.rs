//! Tensor-product Gauss-Legendre quadrature on `[-1, 1]^dim`.

use crate::geometry::point::Point;
use itertools::iproduct;

/// Largest tabulated 1D rule.
pub const MAX_GAUSS_POINTS: usize = 5;

/// Quadrature points and weights on a reference domain.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadratureRule {
    pub dim: usize,
    pub points: Vec<Point>,
    pub weights: Vec<f64>,
}

impl QuadratureRule {
    /// Gauss rule of `dim` dimensions exact for polynomials of degree `order`
    /// in each variable.
    ///
    /// Uses `ceil((order + 1) / 2)` points per direction. Orders above 9 are
    /// clamped to the five-point rule.
    pub fn gauss(dim: usize, order: u32) -> Self {
        let wanted = (order as usize + 2) / 2;
        let n = wanted.clamp(1, MAX_GAUSS_POINTS);
        if wanted > MAX_GAUSS_POINTS {
            log::warn!(
                "Gauss rule of order {order} requested; using {MAX_GAUSS_POINTS} points per direction"
            );
        }
        let (x, w) = gauss_legendre_1d(n);
        match dim {
            0 => Self {
                dim,
                points: vec![Point::zero()],
                weights: vec![1.0],
            },
            1 => Self {
                dim,
                points: x.iter().map(|&a| Point::new(a, 0.0, 0.0)).collect(),
                weights: w.to_vec(),
            },
            2 => {
                // first direction varies fastest
                let (points, weights) = iproduct!(0..n, 0..n)
                    .map(|(j, i)| (Point::new(x[i], x[j], 0.0), w[i] * w[j]))
                    .unzip();
                Self { dim, points, weights }
            }
            _ => {
                let (points, weights) = iproduct!(0..n, 0..n, 0..n)
                    .map(|(k, j, i)| (Point::new(x[i], x[j], x[k]), w[i] * w[j] * w[k]))
                    .unzip();
                Self {
                    dim: 3,
                    points,
                    weights,
                }
            }
        }
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Sum of the weights, i.e. the measure of the reference domain.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Gauss-Legendre abscissae and weights on `[-1, 1]` for `1..=5` points.
fn gauss_legendre_1d(n: usize) -> (&'static [f64], &'static [f64]) {
    match n {
        1 => (&[0.0], &[2.0]),
        2 => (
            &[-0.577_350_269_189_625_8, 0.577_350_269_189_625_8],
            &[1.0, 1.0],
        ),
        3 => (
            &[-0.774_596_669_241_483_4, 0.0, 0.774_596_669_241_483_4],
            &[
                0.555_555_555_555_555_6,
                0.888_888_888_888_888_9,
                0.555_555_555_555_555_6,
            ],
        ),
        4 => (
            &[
                -0.861_136_311_594_052_6,
                -0.339_981_043_584_856_3,
                0.339_981_043_584_856_3,
                0.861_136_311_594_052_6,
            ],
            &[
                0.347_854_845_137_453_9,
                0.652_145_154_862_546_1,
                0.652_145_154_862_546_1,
                0.347_854_845_137_453_9,
            ],
        ),
        _ => (
            &[
                -0.906_179_845_938_664,
                -0.538_469_310_105_683_1,
                0.0,
                0.538_469_310_105_683_1,
                0.906_179_845_938_664,
            ],
            &[
                0.236_926_885_056_189_1,
                0.478_628_670_499_366_5,
                0.568_888_888_888_888_9,
                0.478_628_670_499_366_5,
                0.236_926_885_056_189_1,
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_reference_measure() {
        for order in 0..=9 {
            assert!((QuadratureRule::gauss(1, order).total_weight() - 2.0).abs() < 1e-14);
            assert!((QuadratureRule::gauss(2, order).total_weight() - 4.0).abs() < 1e-14);
            assert!((QuadratureRule::gauss(3, order).total_weight() - 8.0).abs() < 1e-13);
        }
    }

    #[test]
    fn point_counts_follow_order() {
        assert_eq!(QuadratureRule::gauss(1, 0).n_points(), 1);
        assert_eq!(QuadratureRule::gauss(1, 3).n_points(), 2);
        assert_eq!(QuadratureRule::gauss(2, 5).n_points(), 9);
        assert_eq!(QuadratureRule::gauss(3, 5).n_points(), 27);
        assert_eq!(QuadratureRule::gauss(1, 20).n_points(), MAX_GAUSS_POINTS);
    }

    #[test]
    fn integrates_polynomials_of_rule_order_exactly() {
        // int_{-1}^{1} x^k dx = 2/(k+1) for even k, 0 for odd k
        for order in 1..=9u32 {
            let rule = QuadratureRule::gauss(1, order);
            for k in 0..=order {
                let approx: f64 = rule
                    .points
                    .iter()
                    .zip(&rule.weights)
                    .map(|(p, w)| w * p.x.powi(k as i32))
                    .sum();
                let exact = if k % 2 == 0 { 2.0 / (k as f64 + 1.0) } else { 0.0 };
                assert!((approx - exact).abs() < 1e-12, "order {order}, degree {k}");
            }
        }
        let rule = QuadratureRule::gauss(3, 5);
        let approx: f64 = rule
            .points
            .iter()
            .zip(&rule.weights)
            .map(|(p, w)| w * p.x.powi(4) * p.y.powi(2) * p.z.powi(2))
            .sum();
        let exact = (2.0 / 5.0) * (2.0 / 3.0) * (2.0 / 3.0);
        assert!((approx - exact).abs() < 1e-12);
    }
}
