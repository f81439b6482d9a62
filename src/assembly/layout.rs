//! Block layout of the element system.
use crate::error::AssemblyError;
use crate::field::{Dimension, Field, FieldGroup};
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector, DVectorViewMut};
use std::ops::Range;

/// Position of one field inside the element matrix/vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockRange {
    pub offset: usize,
    pub len: usize,
}

impl BlockRange {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Offsets of the field blocks of one element.
///
/// The layout is `[solid_0 .. solid_{d-1} | pressure | seepage_0 .. seepage_{d-1}]`. All solid
/// components share the local count of the first one (`n_base`) and all seepage components
/// share the count of the first seepage component, so the blocks tile `0 .. total()`
/// without gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    dimension: Dimension,
    blocks: Vec<BlockRange>,
    total: usize,
}

impl BlockLayout {
    /// Builds the layout of `element` from its per-field DOF counts, given in
    /// [`Field::ordered`] order.
    pub fn new(element: usize, dimension: Dimension, counts: &[usize]) -> Result<Self, AssemblyError> {
        let d = dimension.dim();
        let fields = Field::ordered(dimension);
        if counts.len() != fields.len() {
            return Err(AssemblyError::precondition(
                element,
                format!("expected DOF counts for {} fields, got {}", fields.len(), counts.len()),
            ));
        }

        let n_base = counts[0];
        let n_p = counts[d];
        let n_x = counts[d + 1];

        let mut blocks = Vec::with_capacity(fields.len());
        for (&field, &count) in fields.iter().zip(counts) {
            let c = field.component();
            let (offset, expected) = match field.group() {
                FieldGroup::Displacement => (c * n_base, n_base),
                FieldGroup::Pressure => (d * n_base, n_p),
                FieldGroup::Seepage => (d * n_base + n_p + c * n_x, n_x),
            };
            if count != expected {
                return Err(AssemblyError::precondition(
                    element,
                    format!("field {field} has {count} local DOFs, but the block layout requires {expected}"),
                ));
            }
            blocks.push(BlockRange { offset, len: count });
        }

        Ok(Self {
            dimension,
            blocks,
            total: d * n_base + n_p + d * n_x,
        })
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Total number of local DOFs of the element.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Block of the given field. Fields that are inactive in this dimension yield an empty
    /// block positioned at the end of the layout.
    pub fn block(&self, field: Field) -> BlockRange {
        field
            .index_in(self.dimension)
            .map(|k| self.blocks[k])
            .unwrap_or(BlockRange {
                offset: self.total,
                len: 0,
            })
    }

    pub fn matrix_block<'a>(&self, matrix: &'a DMatrix<f64>, row: Field, col: Field) -> DMatrixView<'a, f64> {
        let (r, c) = (self.block(row), self.block(col));
        matrix.view((r.offset, c.offset), (r.len, c.len))
    }

    pub fn matrix_block_mut<'a>(
        &self,
        matrix: &'a mut DMatrix<f64>,
        row: Field,
        col: Field,
    ) -> DMatrixViewMut<'a, f64> {
        let (r, c) = (self.block(row), self.block(col));
        matrix.view_mut((r.offset, c.offset), (r.len, c.len))
    }

    pub fn vector_block_mut<'a>(&self, vector: &'a mut DVector<f64>, field: Field) -> DVectorViewMut<'a, f64> {
        let b = self.block(field);
        vector.rows_mut(b.offset, b.len)
    }
}
