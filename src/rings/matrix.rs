use super::{
    errors::{RingError, RingResult},
    ntt::NttContext,
};
use rayon::prelude::*;
use std::{
    fmt, ptr,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard},
};

/// A `rows x cols` grid of polynomials over one [`NttContext`].
///
/// Cells are stored row-major behind a reader/writer lock. Every cell has
/// length `N` and all cells share the `is_ntt` domain flag. Only [`set`]
/// mutates in place; every other operation returns a new matrix and holds
/// read locks on its operands for the duration of the computation.
///
/// [`set`]: PolyMatrix::set
pub struct PolyMatrix {
    cells: RwLock<Vec<Vec<u64>>>,
    context: Arc<NttContext>,
    rows: usize,
    cols: usize,
    is_ntt: bool,
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl PolyMatrix {
    /// Zero matrix in the coefficient domain.
    pub fn zeros(context: Arc<NttContext>, rows: usize, cols: usize) -> RingResult<Self> {
        let cells = vec![vec![0u64; context.degree()]; cell_count(rows, cols)?];
        Ok(Self::new_unchecked(cells, context, rows, cols, false))
    }

    /// Builds a matrix from `rows * cols` row-major polynomials.
    ///
    /// Every polynomial must have length `N`; coefficients are reduced mod `Q`.
    pub fn from_polys(
        context: Arc<NttContext>,
        rows: usize,
        cols: usize,
        mut polys: Vec<Vec<u64>>,
        is_ntt: bool,
    ) -> RingResult<Self> {
        let expected = cell_count(rows, cols)?;
        if polys.len() != expected {
            return Err(RingError::LengthMismatch {
                expected,
                actual: polys.len(),
            });
        }
        let q = context.modulus();
        for poly in polys.iter_mut() {
            context.check_len(poly)?;
            poly.iter_mut().for_each(|c| *c %= q);
        }
        Ok(Self::new_unchecked(polys, context, rows, cols, is_ntt))
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(
        context: Arc<NttContext>,
        rows: Vec<Vec<Vec<u64>>>,
        is_ntt: bool,
    ) -> RingResult<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != col_count) {
            return Err(RingError::DimensionMismatch {
                operation: "from_rows",
                left: (row_count, col_count),
                right: (1, bad.len()),
            });
        }
        let polys = rows.into_iter().flatten().collect();
        Self::from_polys(context, row_count, col_count, polys, is_ntt)
    }

    // Skips validation; only for cells produced by this crate.
    pub(crate) fn new_unchecked(
        cells: Vec<Vec<u64>>,
        context: Arc<NttContext>,
        rows: usize,
        cols: usize,
        is_ntt: bool,
    ) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self {
            cells: RwLock::new(cells),
            context,
            rows,
            cols,
            is_ntt,
        }
    }

    fn derived(&self, cells: Vec<Vec<u64>>, rows: usize, cols: usize, is_ntt: bool) -> Self {
        Self::new_unchecked(cells, Arc::clone(&self.context), rows, cols, is_ntt)
    }
}

/// `rows * cols`, or [`RingError::InvalidParameter`] when it overflows `usize`.
pub(crate) fn cell_count(rows: usize, cols: usize) -> RingResult<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| RingError::InvalidParameter {
            message: format!("matrix dimensions {rows}x{cols} overflow the cell count"),
        })
}

// ─── Accessors ────────────────────────────────────────────────────────────────

impl PolyMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn context(&self) -> &Arc<NttContext> {
        &self.context
    }

    /// Copy of the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> RingResult<Vec<u64>> {
        let index = self.index(row, col)?;
        Ok(self.read()[index].clone())
    }

    /// Overwrites the cell at `(row, col)` with `poly` reduced mod `Q`.
    pub fn set(&self, row: usize, col: usize, poly: &[u64]) -> RingResult<()> {
        let index = self.index(row, col)?;
        self.context.check_len(poly)?;
        let q = self.context.modulus();
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        for (dst, &src) in cells[index].iter_mut().zip(poly) {
            *dst = src % q;
        }
        Ok(())
    }

    /// Row-major snapshot of every cell.
    pub fn to_polys(&self) -> Vec<Vec<u64>> {
        self.read().clone()
    }

    fn index(&self, row: usize, col: usize) -> RingResult<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(RingError::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    // Cells are plain coefficients, so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Vec<u64>>> {
        self.cells.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with both operands read-locked, as `f(self, other)`.
    ///
    /// Locks are taken in address order; a single guard is taken when `other`
    /// is `self`.
    fn with_pair<R>(&self, other: &Self, f: impl FnOnce(&[Vec<u64>], &[Vec<u64>]) -> R) -> R {
        if ptr::eq(self, other) {
            let cells = self.read();
            return f(cells.as_slice(), cells.as_slice());
        }
        if (self as *const Self) < (other as *const Self) {
            let left = self.read();
            let right = other.read();
            f(left.as_slice(), right.as_slice())
        } else {
            let right = other.read();
            let left = self.read();
            f(left.as_slice(), right.as_slice())
        }
    }
}

impl Clone for PolyMatrix {
    fn clone(&self) -> Self {
        self.derived(self.to_polys(), self.rows, self.cols, self.is_ntt)
    }
}

impl fmt::Debug for PolyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyMatrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("is_ntt", &self.is_ntt)
            .field("degree", &self.context.degree())
            .field("modulus", &self.context.modulus())
            .finish_non_exhaustive()
    }
}

// ─── Domain conversion ────────────────────────────────────────────────────────

impl PolyMatrix {
    /// NTT-domain copy; a clone if already there.
    pub fn to_ntt(&self) -> RingResult<Self> {
        self.context.ensure_ready()?;
        if self.is_ntt {
            return Ok(self.clone());
        }
        let cells = self.context.forward(self.read().as_slice())?;
        Ok(self.derived(cells, self.rows, self.cols, true))
    }

    /// Coefficient-domain copy; a clone if already there.
    pub fn from_ntt(&self) -> RingResult<Self> {
        self.context.ensure_ready()?;
        if !self.is_ntt {
            return Ok(self.clone());
        }
        let cells = self.context.inverse(self.read().as_slice())?;
        Ok(self.derived(cells, self.rows, self.cols, false))
    }
}

// ─── Linear algebra ───────────────────────────────────────────────────────────

impl PolyMatrix {
    /// Cell-wise product of two NTT-domain matrices of the same shape.
    pub fn hadamard(&self, other: &Self) -> RingResult<Self> {
        self.context.ensure_ready()?;
        self.check_binary("hadamard", other)?;
        self.require_ntt("hadamard")?;
        other.require_ntt("hadamard")?;
        let ctx = &self.context;
        let cells = self.with_pair(other, |a, b| {
            a.par_iter()
                .zip(b.par_iter())
                .map(|(x, y)| ctx.pointwise_mul(x, y))
                .collect::<RingResult<Vec<_>>>()
        })?;
        Ok(self.derived(cells, self.rows, self.cols, true))
    }

    /// `M · v` for an NTT-domain matrix and a vector of `cols` polynomials.
    ///
    /// Row `i` of the result is `Σ_j M[i][j] ⊙ v[j]`; rows are computed in
    /// parallel.
    pub fn mul_vec<P>(&self, v: &[P]) -> RingResult<Vec<Vec<u64>>>
    where
        P: AsRef<[u64]> + Sync,
    {
        self.context.ensure_ready()?;
        self.require_ntt("mul_vec")?;
        if v.len() != self.cols {
            return Err(RingError::DimensionMismatch {
                operation: "mul_vec",
                left: (self.rows, self.cols),
                right: (v.len(), 1),
            });
        }
        for poly in v {
            self.context.check_len(poly.as_ref())?;
        }

        let ctx = &self.context;
        let cols = self.cols;
        let cells = self.read();
        let cells: &[Vec<u64>] = &cells;
        Ok((0..self.rows)
            .into_par_iter()
            .map(|row| {
                let mut acc = vec![0u64; ctx.degree()];
                for (cell, entry) in cells[row * cols..(row + 1) * cols].iter().zip(v) {
                    ctx.mul_acc(&mut acc, cell, entry.as_ref());
                }
                acc
            })
            .collect())
    }

    /// [`mul_vec`](Self::mul_vec) over a flat buffer of `cols * N` values,
    /// returning `rows * N` values.
    pub fn mul_vec_flat(&self, v: &[u64]) -> RingResult<Vec<u64>> {
        self.context.ensure_ready()?;
        let degree = self.context.degree();
        let expected = cell_count(self.cols, degree)?;
        if v.len() != expected {
            return Err(RingError::LengthMismatch {
                expected,
                actual: v.len(),
            });
        }
        let entries: Vec<&[u64]> = v.chunks(degree.max(1)).collect();
        Ok(self.mul_vec(&entries)?.concat())
    }

    /// `C[i][j] = Σ_k A[i][k] ⊙ B[k][j]` over NTT-domain operands, one task
    /// per output cell.
    pub fn mul_mat(&self, other: &Self) -> RingResult<Self> {
        self.context.ensure_ready()?;
        self.check_context(other)?;
        if self.cols != other.rows {
            return Err(self.dimension_error("mul_mat", other));
        }
        self.require_ntt("mul_mat")?;
        other.require_ntt("mul_mat")?;

        let ctx = &self.context;
        let (rows, inner, cols) = (self.rows, self.cols, other.cols);
        let count = cell_count(rows, cols)?;
        let cells = self.with_pair(other, |a, b| {
            (0..count)
                .into_par_iter()
                .map(|index| {
                    let (i, j) = (index / cols, index % cols);
                    let mut acc = vec![0u64; ctx.degree()];
                    for k in 0..inner {
                        ctx.mul_acc(&mut acc, &a[i * inner + k], &b[k * cols + j]);
                    }
                    acc
                })
                .collect::<Vec<_>>()
        });
        Ok(self.derived(cells, rows, cols, true))
    }

    pub fn add(&self, other: &Self) -> RingResult<Self> {
        self.cellwise("add", other, NttContext::poly_add)
    }

    pub fn sub(&self, other: &Self) -> RingResult<Self> {
        self.cellwise("sub", other, NttContext::poly_sub)
    }

    /// Multiplies every cell by the NTT-domain polynomial `scalar`.
    pub fn scalar_mul(&self, scalar: &[u64]) -> RingResult<Self> {
        self.context.ensure_ready()?;
        self.require_ntt("scalar_mul")?;
        self.context.check_len(scalar)?;
        let ctx = &self.context;
        let cells = self
            .read()
            .par_iter()
            .map(|cell| ctx.pointwise_mul(cell, scalar))
            .collect::<RingResult<Vec<_>>>()?;
        Ok(self.derived(cells, self.rows, self.cols, true))
    }

    /// `cols x rows` matrix with `T[j][i] = M[i][j]`, same domain.
    pub fn transpose(&self) -> RingResult<Self> {
        self.context.ensure_ready()?;
        let cells = self.read();
        let mut out = Vec::with_capacity(cells.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                out.push(cells[i * self.cols + j].clone());
            }
        }
        Ok(self.derived(out, self.cols, self.rows, self.is_ntt))
    }

    fn cellwise(
        &self,
        operation: &'static str,
        other: &Self,
        op: fn(&NttContext, &[u64], &[u64]) -> RingResult<Vec<u64>>,
    ) -> RingResult<Self> {
        self.context.ensure_ready()?;
        self.check_binary(operation, other)?;
        if self.is_ntt != other.is_ntt {
            return Err(RingError::DomainMismatch {
                operation,
                expected_ntt: self.is_ntt,
            });
        }
        let ctx: &NttContext = &self.context;
        let cells = self.with_pair(other, |a, b| {
            a.par_iter()
                .zip(b.par_iter())
                .map(|(x, y)| op(ctx, x, y))
                .collect::<RingResult<Vec<_>>>()
        })?;
        Ok(self.derived(cells, self.rows, self.cols, self.is_ntt))
    }

    fn check_context(&self, other: &Self) -> RingResult<()> {
        if Arc::ptr_eq(&self.context, &other.context) {
            Ok(())
        } else {
            Err(RingError::ContextMismatch)
        }
    }

    fn check_binary(&self, operation: &'static str, other: &Self) -> RingResult<()> {
        self.check_context(other)?;
        if (self.rows, self.cols) != (other.rows, other.cols) {
            return Err(self.dimension_error(operation, other));
        }
        Ok(())
    }

    fn require_ntt(&self, operation: &'static str) -> RingResult<()> {
        if self.is_ntt {
            Ok(())
        } else {
            Err(RingError::DomainMismatch {
                operation,
                expected_ntt: true,
            })
        }
    }

    fn dimension_error(&self, operation: &'static str, other: &Self) -> RingError {
        RingError::DimensionMismatch {
            operation,
            left: (self.rows, self.cols),
            right: (other.rows, other.cols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{SIGNATURE_Q, UniformModQ, sample_poly};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const N: usize = 8;
    const Q: u64 = 17;

    fn context() -> Arc<NttContext> {
        Arc::new(NttContext::new(N, Q).unwrap())
    }

    fn constant(c: u64) -> Vec<u64> {
        let mut p = vec![0u64; N];
        p[0] = c;
        p
    }

    fn counting(start: u64) -> Vec<u64> {
        (0..N as u64).map(|i| (start + i) % Q).collect()
    }

    #[test]
    fn zeros_has_shape_and_domain() {
        let m = PolyMatrix::zeros(context(), 2, 3).unwrap();
        assert_eq!((m.rows(), m.cols(), m.is_ntt()), (2, 3, false));
        assert_eq!(m.get(1, 2).unwrap(), vec![0; N]);
    }

    #[test]
    fn from_polys_validates_and_reduces() {
        let ctx = context();
        let m = PolyMatrix::from_polys(
            Arc::clone(&ctx),
            1,
            2,
            vec![vec![18; N], vec![3; N]],
            false,
        )
        .unwrap();
        assert_eq!(m.get(0, 0).unwrap(), vec![1; N]);

        assert_eq!(
            PolyMatrix::from_polys(Arc::clone(&ctx), 2, 2, vec![vec![0; N]; 3], false)
                .unwrap_err(),
            RingError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
        assert!(PolyMatrix::from_polys(ctx, 1, 1, vec![vec![0; N - 1]], false).is_err());
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let ctx = context();
        let ragged = vec![vec![constant(1), constant(2)], vec![constant(3)]];
        assert!(matches!(
            PolyMatrix::from_rows(Arc::clone(&ctx), ragged, true).unwrap_err(),
            RingError::DimensionMismatch { .. }
        ));
        let m = PolyMatrix::from_rows(ctx, vec![vec![constant(1)], vec![constant(2)]], true)
            .unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 1));
        assert_eq!(m.get(1, 0).unwrap(), constant(2));
    }

    #[test]
    fn get_and_set_are_bounds_checked() {
        let m = PolyMatrix::zeros(context(), 2, 2).unwrap();
        m.set(1, 0, &counting(3)).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), counting(3));

        let out_of_range = RingError::IndexOutOfBounds {
            row: 2,
            col: 0,
            rows: 2,
            cols: 2,
        };
        assert_eq!(m.get(2, 0).unwrap_err(), out_of_range);
        assert_eq!(m.set(2, 0, &counting(0)).unwrap_err(), out_of_range);
        assert!(m.set(0, 0, &[1, 2]).is_err());
    }

    #[test]
    fn domain_conversion_returns_new_matrix() {
        let m = PolyMatrix::from_polys(context(), 1, 2, vec![counting(1), counting(5)], false)
            .unwrap();
        let ntt = m.to_ntt().unwrap();
        assert!(ntt.is_ntt());
        assert!(!m.is_ntt());
        assert_eq!(m.get(0, 0).unwrap(), counting(1));

        let again = ntt.to_ntt().unwrap();
        assert_eq!(again.to_polys(), ntt.to_polys());

        let back = ntt.from_ntt().unwrap();
        assert!(!back.is_ntt());
        assert_eq!(back.to_polys(), m.to_polys());
    }

    #[test]
    fn identity_mul_vec_returns_vector() {
        let ctx = Arc::new(NttContext::new(256, SIGNATURE_Q).unwrap());
        let m = PolyMatrix::zeros(Arc::clone(&ctx), 2, 2).unwrap();
        let mut one = vec![0u64; 256];
        one[0] = 1;
        m.set(0, 0, &one).unwrap();
        m.set(1, 1, &one).unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(77);
        let dist = UniformModQ::new(SIGNATURE_Q).unwrap();
        let v: Vec<Vec<u64>> = (0..2).map(|_| sample_poly(&dist, 256, &mut rng)).collect();

        let v_ntt = ctx.forward(&v).unwrap();
        let product = m.to_ntt().unwrap().mul_vec(&v_ntt).unwrap();
        assert_eq!(ctx.inverse(&product).unwrap(), v);
    }

    #[test]
    fn mul_vec_accumulates_rows() {
        let ctx = context();
        let m = PolyMatrix::from_polys(
            Arc::clone(&ctx),
            2,
            2,
            vec![constant(1), constant(2), constant(3), constant(4)],
            false,
        )
        .unwrap()
        .to_ntt()
        .unwrap();
        let v = ctx.forward(&[counting(0), counting(1)]).unwrap();
        let out = ctx.inverse(&m.mul_vec(&v).unwrap()).unwrap();

        let expect_row0: Vec<u64> = (0..N as u64).map(|i| (i + 2 * (i + 1)) % Q).collect();
        let expect_row1: Vec<u64> = (0..N as u64).map(|i| (3 * i + 4 * (i + 1)) % Q).collect();
        assert_eq!(out, vec![expect_row0, expect_row1]);
    }

    #[test]
    fn mul_vec_flat_matches_mul_vec() {
        let ctx = context();
        let m = PolyMatrix::from_polys(
            Arc::clone(&ctx),
            2,
            2,
            vec![counting(0), counting(1), counting(2), counting(3)],
            true,
        )
        .unwrap();
        let v = vec![counting(4), counting(5)];
        let nested = m.mul_vec(&v).unwrap();
        let flat = m.mul_vec_flat(&v.concat()).unwrap();
        assert_eq!(flat, nested.concat());

        assert_eq!(
            m.mul_vec_flat(&[0; N]).unwrap_err(),
            RingError::LengthMismatch {
                expected: 2 * N,
                actual: N
            }
        );
    }

    #[test]
    fn mul_vec_rejects_bad_input() {
        let m = PolyMatrix::zeros(context(), 2, 2).unwrap();
        assert!(matches!(
            m.mul_vec(&[counting(0), counting(0)]).unwrap_err(),
            RingError::DomainMismatch { .. }
        ));
        let m = m.to_ntt().unwrap();
        assert_eq!(
            m.mul_vec(&[counting(0)]).unwrap_err(),
            RingError::DimensionMismatch {
                operation: "mul_vec",
                left: (2, 2),
                right: (1, 1)
            }
        );
        assert!(m.mul_vec(&[counting(0), vec![0; 3]]).is_err());
    }

    #[test]
    fn identity_mul_mat_keeps_operand() {
        let ctx = context();
        let id = PolyMatrix::from_polys(
            Arc::clone(&ctx),
            2,
            2,
            vec![constant(1), constant(0), constant(0), constant(1)],
            false,
        )
        .unwrap()
        .to_ntt()
        .unwrap();
        let b = PolyMatrix::from_polys(
            ctx,
            2,
            3,
            (0..6).map(counting).collect(),
            false,
        )
        .unwrap()
        .to_ntt()
        .unwrap();

        let product = id.mul_mat(&b).unwrap();
        assert_eq!((product.rows(), product.cols()), (2, 3));
        assert_eq!(product.to_polys(), b.to_polys());
    }

    #[test]
    fn mul_mat_with_itself() {
        let ctx = context();
        let m = PolyMatrix::from_polys(
            ctx,
            2,
            2,
            vec![constant(1), constant(2), constant(3), constant(4)],
            false,
        )
        .unwrap()
        .to_ntt()
        .unwrap();
        let square = m.mul_mat(&m).unwrap().from_ntt().unwrap();
        // [[1,2],[3,4]]^2 = [[7,10],[15,22]]
        assert_eq!(
            square.to_polys(),
            vec![constant(7), constant(10), constant(15), constant(22 % Q)]
        );
    }

    #[test]
    fn mul_mat_rejects_incompatible_shapes() {
        let ctx = context();
        let a = PolyMatrix::zeros(Arc::clone(&ctx), 2, 3).unwrap().to_ntt().unwrap();
        let b = PolyMatrix::zeros(ctx, 2, 3).unwrap().to_ntt().unwrap();
        assert_eq!(
            a.mul_mat(&b).unwrap_err(),
            RingError::DimensionMismatch {
                operation: "mul_mat",
                left: (2, 3),
                right: (2, 3)
            }
        );
    }

    #[test]
    fn hadamard_by_constant_scales() {
        let ctx = context();
        let mut a = vec![0u64; N];
        a[0] = 5;
        a[1] = 3;
        let m = PolyMatrix::from_polys(Arc::clone(&ctx), 1, 1, vec![a], false)
            .unwrap()
            .to_ntt()
            .unwrap();
        let two = PolyMatrix::from_polys(ctx, 1, 1, vec![constant(2)], false)
            .unwrap()
            .to_ntt()
            .unwrap();
        let out = m.hadamard(&two).unwrap().from_ntt().unwrap();
        let mut expected = vec![0u64; N];
        expected[0] = 10;
        expected[1] = 6;
        assert_eq!(out.get(0, 0).unwrap(), expected);
    }

    #[test]
    fn binary_ops_reject_mismatches() {
        let ctx = context();
        let a = PolyMatrix::zeros(Arc::clone(&ctx), 2, 2).unwrap().to_ntt().unwrap();
        let b = PolyMatrix::zeros(Arc::clone(&ctx), 2, 1).unwrap().to_ntt().unwrap();
        let foreign = PolyMatrix::zeros(context(), 2, 2).unwrap().to_ntt().unwrap();
        let coeff = PolyMatrix::zeros(ctx, 2, 2).unwrap();

        assert!(matches!(a.hadamard(&b), Err(RingError::DimensionMismatch { .. })));
        assert!(matches!(a.add(&b), Err(RingError::DimensionMismatch { .. })));
        assert!(matches!(a.sub(&b), Err(RingError::DimensionMismatch { .. })));
        assert_eq!(a.add(&foreign).unwrap_err(), RingError::ContextMismatch);
        assert_eq!(a.mul_mat(&foreign).unwrap_err(), RingError::ContextMismatch);
        assert_eq!(
            a.add(&coeff).unwrap_err(),
            RingError::DomainMismatch {
                operation: "add",
                expected_ntt: true
            }
        );
        assert!(matches!(
            coeff.hadamard(&coeff),
            Err(RingError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn add_then_sub_restores() {
        let ctx = context();
        let a = PolyMatrix::from_polys(Arc::clone(&ctx), 1, 2, vec![counting(3), counting(9)], false)
            .unwrap();
        let b = PolyMatrix::from_polys(ctx, 1, 2, vec![counting(16), counting(12)], false)
            .unwrap();
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.get(0, 0).unwrap(), (0..N as u64).map(|i| (19 + 2 * i) % Q).collect::<Vec<_>>());
        assert_eq!(sum.sub(&b).unwrap().to_polys(), a.to_polys());
        assert_eq!(a.sub(&a).unwrap().to_polys(), vec![vec![0; N]; 2]);
    }

    #[test]
    fn scalar_mul_requires_ntt_and_length() {
        let ctx = context();
        let m = PolyMatrix::from_polys(Arc::clone(&ctx), 1, 1, vec![counting(1)], false).unwrap();
        assert!(m.scalar_mul(&vec![3; N]).is_err());

        let ntt = m.to_ntt().unwrap();
        let three = ctx.forward_single(&constant(3)).unwrap();
        let out = ntt.scalar_mul(&three).unwrap().from_ntt().unwrap();
        assert_eq!(
            out.get(0, 0).unwrap(),
            counting(1).iter().map(|c| c * 3 % Q).collect::<Vec<_>>()
        );
        assert!(ntt.scalar_mul(&[1, 2]).is_err());
    }

    #[test]
    fn transpose_swaps_indices() {
        let m = PolyMatrix::from_polys(context(), 2, 3, (0..6).map(counting).collect(), true)
            .unwrap();
        let t = m.transpose().unwrap();
        assert_eq!((t.rows(), t.cols(), t.is_ntt()), (3, 2, true));
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(t.get(j, i).unwrap(), m.get(i, j).unwrap());
            }
        }
    }

    #[test]
    fn clone_is_deep() {
        let m = PolyMatrix::zeros(context(), 1, 1).unwrap();
        let copy = m.clone();
        m.set(0, 0, &counting(1)).unwrap();
        assert_eq!(copy.get(0, 0).unwrap(), vec![0; N]);
    }

    #[test]
    fn closed_context_fails_every_operation() {
        let ctx = context();
        let coeff = PolyMatrix::zeros(Arc::clone(&ctx), 2, 2).unwrap();
        let ntt = coeff.to_ntt().unwrap();
        let v = vec![constant(1); 2];
        ctx.close();

        let closed = RingError::NotInitialized;
        assert_eq!(coeff.to_ntt().unwrap_err(), closed);
        assert_eq!(ntt.to_ntt().unwrap_err(), closed);
        assert_eq!(ntt.from_ntt().unwrap_err(), closed);
        assert_eq!(ntt.hadamard(&ntt).unwrap_err(), closed);
        assert_eq!(ntt.mul_vec(&v).unwrap_err(), closed);
        assert_eq!(ntt.mul_vec_flat(&v.concat()).unwrap_err(), closed);
        assert_eq!(ntt.mul_mat(&ntt).unwrap_err(), closed);
        assert_eq!(ntt.add(&ntt).unwrap_err(), closed);
        assert_eq!(ntt.sub(&ntt).unwrap_err(), closed);
        assert_eq!(ntt.scalar_mul(&constant(1)).unwrap_err(), closed);
        assert_eq!(ntt.transpose().unwrap_err(), closed);
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let ctx = context();
        let huge = usize::MAX / 2 + 1;
        assert!(matches!(
            PolyMatrix::zeros(Arc::clone(&ctx), huge, 2).unwrap_err(),
            RingError::InvalidParameter { .. }
        ));
        assert!(matches!(
            PolyMatrix::from_polys(Arc::clone(&ctx), huge, 2, vec![], false).unwrap_err(),
            RingError::InvalidParameter { .. }
        ));

        // Zero rows keep the cell count at zero while `cols * N` overflows.
        let wide = PolyMatrix::zeros(Arc::clone(&ctx), 0, huge)
            .unwrap()
            .to_ntt()
            .unwrap();
        assert!(matches!(
            wide.mul_vec_flat(&[]).unwrap_err(),
            RingError::InvalidParameter { .. }
        ));

        let tall = PolyMatrix::zeros(Arc::clone(&ctx), huge, 0)
            .unwrap()
            .to_ntt()
            .unwrap();
        let flat = PolyMatrix::zeros(ctx, 0, 2).unwrap().to_ntt().unwrap();
        assert!(matches!(
            tall.mul_mat(&flat).unwrap_err(),
            RingError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn crossed_binary_ops_with_writers_finish() {
        let ctx = context();
        let a = Arc::new(PolyMatrix::zeros(Arc::clone(&ctx), 2, 2).unwrap());
        let b = Arc::new(PolyMatrix::zeros(ctx, 2, 2).unwrap());
        let handles: Vec<_> = (0..6)
            .map(|t| {
                let (a, b) = (Arc::clone(&a), Arc::clone(&b));
                std::thread::spawn(move || {
                    for i in 0..200u64 {
                        match t % 3 {
                            0 => assert!(a.add(&b).is_ok()),
                            1 => assert!(b.sub(&a).is_ok()),
                            _ => {
                                a.set(0, 0, &constant(i % Q)).unwrap();
                                b.set(1, 1, &constant(i % Q)).unwrap();
                            }
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
