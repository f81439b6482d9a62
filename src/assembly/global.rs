//! Distributed-style global sparse system.
use crate::error::AssemblyError;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::mem;
use std::ops::Range;

#[derive(Debug, Clone)]
enum MatrixState {
    /// Accumulating triplets; duplicates are summed on close.
    Open(CooMatrix<f64>),
    Closed(CsrMatrix<f64>),
}

/// Global matrix and rhs of one rank.
///
/// Contributions are accumulated while the system is *open* and compressed into CSR form by
/// [`close`](Self::close). Row operations that overwrite values (zeroing rows, setting rhs
/// entries) are only defined on a closed system.
///
/// The system accepts contributions only to rows in its owned range. Contributions to other
/// rows are silently skipped: they belong to another rank, which assembles them from its own
/// elements.
#[derive(Debug, Clone)]
pub struct GlobalSystem {
    state: MatrixState,
    rhs: DVector<f64>,
    owned: Range<usize>,
}

impl GlobalSystem {
    pub fn new(n: usize, owned: Range<usize>) -> Self {
        assert!(owned.end <= n, "Owned range exceeds the system size");
        Self {
            state: MatrixState::Open(CooMatrix::new(n, n)),
            rhs: DVector::zeros(n),
            owned,
        }
    }

    /// A system that owns every row.
    pub fn serial(n: usize) -> Self {
        Self::new(n, 0..n)
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }

    pub fn owned_range(&self) -> Range<usize> {
        self.owned.clone()
    }

    pub fn owns(&self, row: usize) -> bool {
        self.owned.contains(&row)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, MatrixState::Closed(_))
    }

    fn open_mut(&mut self) -> &mut CooMatrix<f64> {
        if let MatrixState::Closed(csr) = &self.state {
            let coo = CooMatrix::from(csr);
            self.state = MatrixState::Open(coo);
        }
        match &mut self.state {
            MatrixState::Open(coo) => coo,
            MatrixState::Closed(_) => unreachable!("system was reopened above"),
        }
    }

    /// Adds the dense `block` at the given global rows and columns.
    pub fn add_matrix(&mut self, block: &DMatrix<f64>, rows: &[usize], cols: &[usize]) {
        assert_eq!(block.shape(), (rows.len(), cols.len()), "Block shape must match index lists");
        let owned = self.owned.clone();
        let coo = self.open_mut();
        for (i, &row) in rows.iter().enumerate() {
            if !owned.contains(&row) {
                continue;
            }
            for (j, &col) in cols.iter().enumerate() {
                coo.push(row, col, block[(i, j)]);
            }
        }
    }

    pub fn add_entry(&mut self, row: usize, col: usize, value: f64) {
        if self.owns(row) {
            self.open_mut().push(row, col, value);
        }
    }

    pub fn add_vector(&mut self, block: &DVector<f64>, rows: &[usize]) {
        assert_eq!(block.len(), rows.len(), "Block length must match index list");
        self.open_mut();
        for (&row, value) in rows.iter().zip(block.iter()) {
            if self.owned.contains(&row) {
                self.rhs[row] += value;
            }
        }
    }

    /// Compresses accumulated contributions. Closing a closed system has no effect.
    pub fn close(&mut self) {
        if let MatrixState::Open(coo) = &self.state {
            let csr = CsrMatrix::from(coo);
            self.state = MatrixState::Closed(csr);
        }
    }

    fn closed_mut(&mut self, operation: &str) -> Result<&mut CsrMatrix<f64>, AssemblyError> {
        match &mut self.state {
            MatrixState::Closed(csr) => Ok(csr),
            MatrixState::Open(_) => Err(AssemblyError::ConsistencyViolation(format!(
                "{operation} requires a closed system"
            ))),
        }
    }

    /// Replaces each owned row in `rows` by the unit row scaled by `diagonal`.
    ///
    /// Rows without a stored diagonal entry get one inserted.
    pub fn zero_rows(&mut self, rows: &[usize], diagonal: f64) -> Result<(), AssemblyError> {
        let owned = self.owned.clone();
        let csr = self.closed_mut("zeroing rows")?;
        let mut missing_diagonal = Vec::new();
        for &row in rows.iter().filter(|row| owned.contains(row)) {
            let mut csr_row = csr.row_mut(row);
            let (cols, values) = csr_row.cols_and_values_mut();
            let mut found = false;
            for (&col, value) in cols.iter().zip(values) {
                if col == row {
                    *value = diagonal;
                    found = true;
                } else {
                    *value = 0.0;
                }
            }
            if !found {
                missing_diagonal.push(row);
            }
        }

        if !missing_diagonal.is_empty() {
            let mut coo = CooMatrix::from(&*csr);
            for row in missing_diagonal {
                coo.push(row, row, diagonal);
            }
            *csr = CsrMatrix::from(&coo);
        }
        Ok(())
    }

    /// Overwrites an owned rhs entry. Unowned rows are skipped.
    pub fn set_rhs(&mut self, row: usize, value: f64) -> Result<(), AssemblyError> {
        self.closed_mut("setting rhs entries")?;
        if self.owns(row) {
            self.rhs[row] = value;
        }
        Ok(())
    }

    pub fn matrix(&self) -> Result<&CsrMatrix<f64>, AssemblyError> {
        match &self.state {
            MatrixState::Closed(csr) => Ok(csr),
            MatrixState::Open(_) => Err(AssemblyError::ConsistencyViolation(
                "the matrix can only be read from a closed system".to_string(),
            )),
        }
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Euclidean norm of the rhs vector.
    pub fn rhs_norm(&self) -> f64 {
        self.rhs.norm()
    }

    /// Closes the system and hands out matrix and rhs.
    pub fn into_parts(mut self) -> (CsrMatrix<f64>, DVector<f64>) {
        self.close();
        match mem::replace(&mut self.state, MatrixState::Open(CooMatrix::new(0, 0))) {
            MatrixState::Closed(csr) => (csr, self.rhs),
            MatrixState::Open(coo) => (CsrMatrix::from(&coo), self.rhs),
        }
    }
}
