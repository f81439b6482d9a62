//! Global numbering of degrees of freedom.
//!
//! DOFs are numbered field by field in the order of [`Field::ordered`]: all DOFs of the first
//! solid component come first, then those of the second, and so on. Within a field, nodal
//! spaces are numbered by mesh node and element-wise spaces by element.
use crate::config::FieldSpaces;
use crate::field::{Dimension, Field};
use crate::mesh::Topology;
use crate::space::FunctionSpace;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    dimension: Dimension,
    spaces: FieldSpaces,
    num_nodes: usize,
    num_elements: usize,
    /// Start of each field's DOF range, indexed like `Field::ordered(dimension)`.
    field_offsets: Vec<usize>,
    num_dofs: usize,
    owned: Range<usize>,
}

impl DofMap {
    /// Numbers all fields of the model on the given mesh. Every DOF is locally owned.
    pub fn new(topology: &(impl Topology + ?Sized), spaces: FieldSpaces) -> Self {
        let dimension = topology.dimension();
        let num_nodes = topology.num_nodes();
        let num_elements = topology.num_elements();

        let mut field_offsets = Vec::new();
        let mut offset = 0;
        for field in Field::ordered(dimension) {
            field_offsets.push(offset);
            offset += match spaces.of(field.group()) {
                FunctionSpace::Lagrange1 => num_nodes,
                FunctionSpace::Constant => num_elements,
            };
        }

        Self {
            dimension,
            spaces,
            num_nodes,
            num_elements,
            field_offsets,
            num_dofs: offset,
            owned: 0..offset,
        }
    }

    /// Restricts ownership to the given range, as for one rank of a distributed system.
    pub fn with_owned_range(mut self, owned: Range<usize>) -> Self {
        assert!(owned.end <= self.num_dofs, "Owned range exceeds the number of DOFs");
        self.owned = owned;
        self
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn spaces(&self) -> &FieldSpaces {
        &self.spaces
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn owned_range(&self) -> Range<usize> {
        self.owned.clone()
    }

    pub fn is_locally_owned(&self, dof: usize) -> bool {
        self.owned.contains(&dof)
    }

    pub fn space(&self, field: Field) -> FunctionSpace {
        self.spaces.of(field.group())
    }

    /// The contiguous range of global indices of the given field, empty for inactive fields.
    pub fn field_range(&self, field: Field) -> Range<usize> {
        match field.index_in(self.dimension) {
            Some(k) => {
                let end = self
                    .field_offsets
                    .get(k + 1)
                    .copied()
                    .unwrap_or(self.num_dofs);
                self.field_offsets[k]..end
            }
            None => self.num_dofs..self.num_dofs,
        }
    }

    /// The DOF of a nodal field at the given node, or `None` if the field is inactive or
    /// not attached to nodes.
    pub fn node_dof(&self, node: usize, field: Field) -> Option<usize> {
        let k = field.index_in(self.dimension)?;
        (self.space(field).is_nodal() && node < self.num_nodes).then(|| self.field_offsets[k] + node)
    }

    /// The DOF of an element-wise field on the given element, or `None` if the field is
    /// inactive or nodal.
    pub fn element_dof(&self, element: usize, field: Field) -> Option<usize> {
        let k = field.index_in(self.dimension)?;
        (!self.space(field).is_nodal() && element < self.num_elements).then(|| self.field_offsets[k] + element)
    }

    /// Global DOF indices of one field on one element, in local basis order.
    pub fn field_dofs(
        &self,
        topology: &(impl Topology + ?Sized),
        element: usize,
        field: Field,
        output: &mut Vec<usize>,
    ) {
        output.clear();
        match self.space(field) {
            FunctionSpace::Lagrange1 => output.extend(
                topology
                    .element_nodes(element)
                    .iter()
                    .filter_map(|&node| self.node_dof(node, field)),
            ),
            FunctionSpace::Constant => output.extend(self.element_dof(element, field)),
        }
    }

    pub fn element_dofs(&self, topology: &(impl Topology + ?Sized), element: usize) -> ElementDofs {
        let mut per_field = Vec::new();
        let mut buffer = Vec::new();
        for &field in Field::ordered(self.dimension) {
            self.field_dofs(topology, element, field, &mut buffer);
            per_field.push((field, buffer.clone()));
        }
        ElementDofs::from_fields(per_field)
    }
}

/// Global DOF indices of one element, grouped by field.
///
/// The concatenation in [`ElementDofs::all`] follows [`Field::ordered`] and therefore matches
/// the element block layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementDofs {
    per_field: Vec<(Field, Vec<usize>)>,
    all: Vec<usize>,
}

impl ElementDofs {
    pub fn from_fields(per_field: Vec<(Field, Vec<usize>)>) -> Self {
        let all = per_field
            .iter()
            .flat_map(|(_, dofs)| dofs.iter().copied())
            .collect();
        Self { per_field, all }
    }

    pub fn field(&self, field: Field) -> &[usize] {
        self.per_field
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, dofs)| dofs.as_slice())
            .unwrap_or(&[])
    }

    /// DOF counts per field, in field order.
    pub fn counts(&self) -> Vec<usize> {
        self.per_field.iter().map(|(_, dofs)| dofs.len()).collect()
    }

    pub fn all(&self) -> &[usize] {
        &self.all
    }
}
