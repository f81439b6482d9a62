use nalgebra::{DMatrix, DVector};
use porous_fem::assembly::global::GlobalSystem;
use porous_fem::error::AssemblyError;
use util::{dense, is_scaled_unit_row};

#[test]
fn duplicate_contributions_are_summed() {
    let mut system = GlobalSystem::serial(3);
    let block = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    system.add_matrix(&block, &[0, 2], &[0, 2]);
    system.add_matrix(&block, &[0, 2], &[0, 2]);
    system.add_entry(1, 1, 5.0);
    system.add_vector(&DVector::from_column_slice(&[1.0, -1.0]), &[2, 1]);
    system.close();

    let expected = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 4.0, 0.0, 5.0, 0.0, 6.0, 0.0, 8.0]);
    assert_eq!(dense(system.matrix().unwrap()), expected);
    assert_eq!(system.rhs().as_slice(), &[0.0, -1.0, 1.0]);
}

#[test]
fn row_operations_require_a_closed_system() {
    let mut system = GlobalSystem::serial(2);
    system.add_entry(0, 0, 1.0);
    assert!(!system.is_closed());

    assert!(matches!(
        system.zero_rows(&[0], 1.0),
        Err(AssemblyError::ConsistencyViolation(_))
    ));
    assert!(matches!(system.set_rhs(0, 1.0), Err(AssemblyError::ConsistencyViolation(_))));
    assert!(matches!(system.matrix(), Err(AssemblyError::ConsistencyViolation(_))));

    system.close();
    assert!(system.zero_rows(&[0], 1.0).is_ok());
    assert!(system.set_rhs(0, 1.0).is_ok());
}

#[test]
fn close_is_idempotent_and_adding_reopens() {
    let mut system = GlobalSystem::serial(2);
    system.add_entry(0, 1, 1.0);
    system.close();
    let first = dense(system.matrix().unwrap());
    system.close();
    assert_eq!(dense(system.matrix().unwrap()), first);

    system.add_entry(0, 1, 1.0);
    assert!(!system.is_closed());
    system.close();
    assert_eq!(dense(system.matrix().unwrap())[(0, 1)], 2.0);
}

#[test]
fn unowned_rows_are_skipped() {
    let mut system = GlobalSystem::new(4, 1..3);
    let block = DMatrix::repeat(4, 4, 1.0);
    let all = [0, 1, 2, 3];
    system.add_matrix(&block, &all, &all);
    system.add_vector(&DVector::repeat(4, 1.0), &all);
    system.add_entry(3, 3, 1.0);
    system.close();

    let matrix = dense(system.matrix().unwrap());
    assert_eq!(matrix.row(0).sum(), 0.0);
    assert_eq!(matrix.row(3).sum(), 0.0);
    // Owned rows keep their columns in the unowned range.
    assert_eq!(matrix.row(1).sum(), 4.0);
    assert_eq!(system.rhs().as_slice(), &[0.0, 1.0, 1.0, 0.0]);

    system.zero_rows(&[0, 1], 1.0).unwrap();
    system.set_rhs(0, 5.0).unwrap();
    system.set_rhs(1, 5.0).unwrap();
    let csr = system.matrix().unwrap();
    assert!(is_scaled_unit_row(csr, 1, 1.0));
    assert!(!is_scaled_unit_row(csr, 0, 1.0));
    assert_eq!(system.rhs().as_slice(), &[0.0, 5.0, 1.0, 0.0]);
}

#[test]
fn zeroing_inserts_missing_diagonal() {
    let mut system = GlobalSystem::serial(3);
    system.add_entry(0, 1, 2.0);
    system.add_entry(1, 0, 3.0);
    system.close();

    system.zero_rows(&[0, 2], 4.0).unwrap();
    let csr = system.matrix().unwrap();
    assert!(is_scaled_unit_row(csr, 0, 4.0));
    assert!(is_scaled_unit_row(csr, 2, 4.0));
    assert_eq!(dense(csr)[(1, 0)], 3.0);
}

#[test]
fn rhs_norm_and_parts() {
    let mut system = GlobalSystem::serial(2);
    system.add_vector(&DVector::from_column_slice(&[3.0, 4.0]), &[0, 1]);
    system.add_entry(1, 1, 1.0);
    assert_eq!(system.rhs_norm(), 5.0);

    let (matrix, rhs) = system.into_parts();
    assert_eq!(matrix.nrows(), 2);
    assert_eq!(matrix.nnz(), 1);
    assert_eq!(rhs.as_slice(), &[3.0, 4.0]);
}
