use tensorform::eval::{DenseTensor, Evaluator};
use tensorform::KernelGroup;

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Asserts that a `Result` is an error matching the given pattern.
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {{
        match $result {
            Err($pattern) $(if $guard)? => {}
            Err(other) => panic!(
                "assert_err_matches! failed: error {:?} does not match {}",
                other,
                std::stringify!($pattern)
            ),
            Ok(value) => panic!(
                "assert_err_matches! failed: expected error matching {}, got Ok({:?})",
                std::stringify!($pattern),
                value
            ),
        }
    }};
}

/// A deterministic pseudo-random value in `[-1, 1]` for entry `flat_index` of the named entity.
pub fn sample_value(name: &str, flat_index: usize) -> f64 {
    let seed = name
        .bytes()
        .fold(17u64, |hash, byte| hash.wrapping_mul(31).wrapping_add(byte as u64));
    let x = seed
        .wrapping_add(flat_index as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((x >> 33) % 2001) as f64 / 1000.0 - 1.0
}

/// Provides sample values for every input of the group that the evaluator does not know yet.
pub fn provide_sample_inputs(evaluator: &mut Evaluator, group: &KernelGroup) -> eyre::Result<()> {
    for entity in group.inputs() {
        if evaluator.value(entity.name()).is_none() {
            let shape = evaluator.sizes().resolve_shape(entity.shape())?;
            let mut counter = 0;
            let value = DenseTensor::from_fn(&shape, |_| {
                counter += 1;
                sample_value(entity.name(), counter)
            });
            evaluator.insert(entity.name(), value);
        }
    }
    Ok(())
}
