use crate::recorded_specification;
use matrixcompare::assert_matrix_eq;
use nalgebra::DMatrix;
use tensorform::eval::{DenseTensor, Evaluator, SizeAssignment};
use util::provide_sample_inputs;

/// Evaluates every recorded Poisson group on small sample inputs.
///
/// The consistency and symmetry weights are equal on each side, which makes the facet blocks
/// symmetric as a whole.
fn evaluate_symmetric_method() -> Evaluator {
    let (spec, _) = recorded_specification();
    let sizes = SizeAssignment::new()
        .with("dim", 2)
        .with("nbf", 2)
        .with("Nbf", 3)
        .with("nq", 2)
        .with("Nq", 4);

    let mut evaluator = Evaluator::new(sizes)
        .with_value("c00", DenseTensor::scalar(0.75))
        .with_value("c10", DenseTensor::scalar(0.75))
        .with_value("c01", DenseTensor::scalar(-0.5))
        .with_value("c11", DenseTensor::scalar(-0.5));
    for group in spec.generator().groups() {
        provide_sample_inputs(&mut evaluator, group).unwrap();
        evaluator.evaluate_group(group).unwrap();
    }
    evaluator
}

fn matrix(evaluator: &Evaluator, name: &str) -> DMatrix<f64> {
    evaluator
        .value(name)
        .and_then(DenseTensor::to_matrix)
        .unwrap_or_else(|| panic!("{name} should be a matrix"))
}

#[test]
fn stiffness_matrix_is_symmetric() {
    let evaluator = evaluate_symmetric_method();
    let a = matrix(&evaluator, "A");
    assert_eq!((a.nrows(), a.ncols()), (3, 3));
    assert_matrix_eq!(a, a.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn facet_blocks_are_mutually_transposed() {
    let evaluator = evaluate_symmetric_method();
    let a00 = matrix(&evaluator, "a(0,0)");
    let a11 = matrix(&evaluator, "a(1,1)");
    let a01 = matrix(&evaluator, "a(0,1)");
    let a10 = matrix(&evaluator, "a(1,0)");

    assert_matrix_eq!(a00, a00.transpose(), comp = abs, tol = 1e-12);
    assert_matrix_eq!(a11, a11.transpose(), comp = abs, tol = 1e-12);
    assert_matrix_eq!(a01, a10.transpose(), comp = abs, tol = 1e-12);
}

#[test]
fn facet_gradients_are_stored_per_side() {
    let evaluator = evaluate_symmetric_method();
    let local = evaluator.value("d_x(0)").unwrap();
    let neighbour = evaluator.value("d_x(1)").unwrap();
    assert_eq!(local.shape(), [3, 2, 2]);
    assert_eq!(neighbour.shape(), [3, 2, 2]);
    assert_ne!(local, neighbour);
}

#[test]
fn load_vector_is_overwritten_by_the_facet_group() {
    let (spec, _) = recorded_specification();
    let sizes = SizeAssignment::new()
        .with("dim", 2)
        .with("Nbf", 3)
        .with("nq", 2)
        .with("Nq", 4);
    let mut evaluator = Evaluator::new(sizes);

    let rhs_volume = spec.generator().get(tensorform_poisson::RHS_VOLUME).unwrap();
    provide_sample_inputs(&mut evaluator, rhs_volume).unwrap();
    evaluator.evaluate_group(rhs_volume).unwrap();
    let volume_load = evaluator.value("b").unwrap().clone();
    assert_eq!(volume_load.shape(), [3]);

    // Zero boundary data makes the facet contribution vanish
    evaluator.insert("f", DenseTensor::zeros(&[2]));
    let rhs_facet = spec.generator().get(tensorform_poisson::RHS_FACET).unwrap();
    provide_sample_inputs(&mut evaluator, rhs_facet).unwrap();
    evaluator.evaluate_group(rhs_facet).unwrap();
    assert_eq!(evaluator.value("b").unwrap(), &DenseTensor::zeros(&[3]));
}
