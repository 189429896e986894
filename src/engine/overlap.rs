//! Moment basis of grouped clusters and the closed-form overlap sums.
//!
//! A cluster over region `X` carries `L_0` (mean concentration per
//! composition) and one `L_{1+a}` per grouped axis `a`. The concentration of
//! composition `x` is reconstructed as
//!
//! ```text
//! c(x) = L_0 + sum_a L_{1+a} d_a(x_a),   d_a(t) = (t - center_a) / half_a
//! ```
//!
//! which maps the axis range onto `[-1, 1]`. A flux density `f(x)` is
//! projected back with the dual weights `w_0 = 1/|X|` and
//! `w_{1+a} = d_a / S_a`, where `S_a = sum_x d_a(x)^2`. The basis is
//! orthogonal, so the projection preserves every first moment exactly.

use nalgebra::{SMatrix, SVector};

use crate::core::spatial::{Point, Region, MAX_AXES};

/// Basis size: one zeroth moment plus one first moment per axis.
pub const MOMENTS: usize = 1 + MAX_AXES;

pub type MomentMatrix = SMatrix<f64, MOMENTS, MOMENTS>;
pub type MomentVector = SVector<f64, MOMENTS>;

/// `alpha + beta * t`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    alpha: f64,
    beta: f64,
}

impl Affine {
    const ONE: Affine = Affine {
        alpha: 1.0,
        beta: 0.0,
    };

    fn shifted(self, by: i64) -> Affine {
        Affine {
            alpha: self.alpha + self.beta * by as f64,
            beta: self.beta,
        }
    }
}

/// `sum_{t = lo}^{hi - 1} f(t) g(t)` without enumerating `t`.
///
/// Uses `S0 = n`, `S1 = n mu` and `S2 = n mu^2 + n (n^2 - 1) / 12` with
/// `mu` the interval midpoint, which holds for negative coordinates too.
fn axis_sum(lo: i64, hi: i64, f: Affine, g: Affine) -> f64 {
    let n = (hi - lo) as f64;
    if n <= 0.0 {
        return 0.0;
    }
    let mu = (lo + hi - 1) as f64 * 0.5;
    let s0 = n;
    let s1 = n * mu;
    let s2 = n * mu * mu + n * (n * n - 1.0) / 12.0;
    f.alpha * g.alpha * s0 + (f.alpha * g.beta + f.beta * g.alpha) * s1 + f.beta * g.beta * s2
}

/// Moment basis of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentBasis {
    region: Region,
    volume: f64,
    center: [f64; MAX_AXES],
    half: [f64; MAX_AXES],
    norm: [f64; MAX_AXES],
}

impl MomentBasis {
    pub fn new(region: &Region) -> Self {
        let volume = region.volume() as f64;
        let mut center = [0.0; MAX_AXES];
        let mut half = [0.0; MAX_AXES];
        let mut norm = [0.0; MAX_AXES];
        for a in 0..MAX_AXES {
            let w = region.width(a);
            center[a] = (region.lo[a] + region.hi[a] - 1) as f64 * 0.5;
            if w > 1 {
                let w = w as f64;
                half[a] = (w - 1.0) * 0.5;
                // S_a = |X| / W * sum_t d(t)^2 = |X| (W + 1) / (3 (W - 1))
                norm[a] = volume * (w + 1.0) / (3.0 * (w - 1.0));
            }
        }
        Self {
            region: *region,
            volume,
            center,
            half,
            norm,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Axis `a` carries a moment.
    #[inline]
    pub fn is_grouped(&self, axis: usize) -> bool {
        self.half[axis] > 0.0
    }

    /// Mean coordinate along `axis`.
    pub fn center(&self, axis: usize) -> f64 {
        self.center[axis]
    }

    /// Half-width along `axis` (0 when not grouped).
    pub fn half_width(&self, axis: usize) -> f64 {
        self.half[axis]
    }

    /// `S_a`, the squared norm of moment `a` over the region.
    pub fn norm(&self, axis: usize) -> f64 {
        self.norm[axis]
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    fn direction(&self, axis: usize) -> Affine {
        Affine {
            alpha: -self.center[axis] / self.half[axis],
            beta: 1.0 / self.half[axis],
        }
    }

    /// Factor of basis function `j` along `axis`.
    fn basis_factor(&self, j: usize, axis: usize) -> Affine {
        if j == axis + 1 {
            self.direction(axis)
        } else {
            Affine::ONE
        }
    }

    /// Constant prefactor of weight `k`.
    fn weight_scale(&self, k: usize) -> f64 {
        if k == 0 {
            1.0 / self.volume
        } else {
            1.0 / self.norm[k - 1]
        }
    }

    /// Basis indices in use: 0 plus one per grouped axis.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(0).chain((0..MAX_AXES).filter(|&a| self.is_grouped(a)).map(|a| a + 1))
    }

    /// `phi_j(x)`; used by tests and diagnostics, never on the hot path.
    pub fn phi(&self, j: usize, x: &Point) -> f64 {
        if j == 0 {
            1.0
        } else if self.is_grouped(j - 1) {
            let a = j - 1;
            (x[a] as f64 - self.center[a]) / self.half[a]
        } else {
            0.0
        }
    }

    /// Projection weight `w_k(x)`.
    pub fn weight(&self, k: usize, x: &Point) -> f64 {
        if k == 0 {
            1.0 / self.volume
        } else if self.is_grouped(k - 1) {
            self.phi(k, x) / self.norm[k - 1]
        } else {
            0.0
        }
    }
}

/// Overlap coefficients for one reaction piece.
///
/// Entry `(k, j)` is `sum_{x in q} w_k^self(x + shift) phi_j^grouped(x)`:
/// how much of the grouped operand's basis function `j` feeds row `k` of
/// `this` when every composition `x` of `q` reacts. A unit `this` has
/// weight 1 and only row 0.
pub fn coefficients(
    this: &MomentBasis,
    shift: &Point,
    grouped: &MomentBasis,
    q: &Region,
) -> MomentMatrix {
    let mut coefs = MomentMatrix::zeros();
    for k in this.indices() {
        let scale = this.weight_scale(k);
        for j in grouped.indices() {
            let mut product = scale;
            for a in 0..MAX_AXES {
                let f = this.basis_factor(k, a).shifted(shift[a]);
                let g = grouped.basis_factor(j, a);
                product *= axis_sum(q.lo[a], q.hi[a], f, g);
                if product == 0.0 {
                    break;
                }
            }
            coefs[(k, j)] = product;
        }
    }
    coefs
}
