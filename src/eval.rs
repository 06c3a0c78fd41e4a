//! A dense reference interpreter for kernel groups.
//!
//! The evaluator follows the summation semantics of [`Equation`] literally and loops over every
//! output and contracted index. It is meant for checking specifications on small inputs, not for
//! production use.
use crate::equation::Equation;
use crate::expression::{Coefficient, Expr, Node};
use crate::kernel::{Generator, KernelGroup};
use crate::tensor::{Entity, Size, SizeToken};
use eyre::{eyre, WrapErr};
use log::debug;
use nalgebra::DMatrix;
use rustc_hash::FxHashMap;

/// A dense tensor of `f64` values stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl DenseTensor {
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// # Panics
    ///
    /// Panics if the length of `data` does not match the number of entries implied by `shape`.
    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "Data length must match the number of tensor entries."
        );
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Creates a tensor whose entry at each multi-index is given by `f`.
    pub fn from_fn(shape: &[usize], mut f: impl FnMut(&[usize]) -> f64) -> Self {
        let mut data = Vec::with_capacity(shape.iter().product());
        for_each_multi_index(shape, |index| data.push(f(index)));
        Self {
            shape: shape.to_vec(),
            data,
        }
    }

    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        Self::from_fn(&[matrix.nrows(), matrix.ncols()], |index| matrix[(index[0], index[1])])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// # Panics
    ///
    /// Panics if the index has the wrong length or is out of bounds.
    pub fn get(&self, index: &[usize]) -> f64 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: &[usize], value: f64) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Returns the tensor as a matrix if it has rank 2.
    pub fn to_matrix(&self) -> Option<DMatrix<f64>> {
        match self.shape[..] {
            [rows, cols] => Some(DMatrix::from_row_slice(rows, cols, &self.data)),
            _ => None,
        }
    }

    fn offset(&self, index: &[usize]) -> usize {
        assert_eq!(index.len(), self.shape.len(), "Index length must match tensor rank.");
        index
            .iter()
            .zip(&self.shape)
            .fold(0, |offset, (&i, &extent)| {
                assert!(i < extent, "Index out of bounds.");
                offset * extent + i
            })
    }
}

/// Calls `f` for every multi-index of the given extents in row-major order.
///
/// A rank-0 shape has exactly one (empty) multi-index.
fn for_each_multi_index(extents: &[usize], mut f: impl FnMut(&[usize])) {
    if extents.iter().any(|&extent| extent == 0) {
        return;
    }
    let mut index = vec![0; extents.len()];
    loop {
        f(&index);
        let mut axis = extents.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < extents[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

/// Concrete extents for symbolic size tokens.
#[derive(Debug, Clone, Default)]
pub struct SizeAssignment {
    extents: FxHashMap<SizeToken, usize>,
}

impl SizeAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &str, extent: usize) -> Self {
        self.insert(token, extent);
        self
    }

    pub fn insert(&mut self, token: &str, extent: usize) {
        self.extents.insert(SizeToken::new(token), extent);
    }

    pub fn resolve(&self, size: &Size) -> eyre::Result<usize> {
        match size {
            Size::Fixed(n) => Ok(*n),
            Size::Symbolic(token) => self
                .extents
                .get(token)
                .copied()
                .ok_or_else(|| eyre!("no extent assigned to size {token}")),
        }
    }

    pub fn resolve_shape(&self, shape: &[Size]) -> eyre::Result<Vec<usize>> {
        shape.iter().map(|size| self.resolve(size)).collect()
    }
}

/// Evaluates equations on dense values, keeping every assigned tensor for later equations.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    sizes: SizeAssignment,
    values: FxHashMap<String, DenseTensor>,
}

impl Evaluator {
    pub fn new(sizes: SizeAssignment) -> Self {
        Self {
            sizes,
            values: FxHashMap::default(),
        }
    }

    pub fn sizes(&self) -> &SizeAssignment {
        &self.sizes
    }

    pub fn insert(&mut self, name: impl Into<String>, value: DenseTensor) {
        self.values.insert(name.into(), value);
    }

    pub fn with_value(mut self, name: impl Into<String>, value: DenseTensor) -> Self {
        self.insert(name, value);
        self
    }

    pub fn value(&self, name: &str) -> Option<&DenseTensor> {
        self.values.get(name)
    }

    /// Evaluates the equations of a group in order.
    ///
    /// Either every output of the group is stored or, if an equation fails, the stored values are
    /// left exactly as they were before the call.
    pub fn evaluate_group(&mut self, group: &KernelGroup) -> eyre::Result<()> {
        let mut replaced: Vec<(String, Option<DenseTensor>)> = Vec::new();
        for equation in group.equations() {
            let name = equation.lhs().name();
            let previous = self.values.get(name).cloned();
            if let Err(err) = self.evaluate_equation(equation) {
                for (name, previous) in replaced.into_iter().rev() {
                    match previous {
                        Some(value) => self.values.insert(name, value),
                        None => self.values.remove(&name),
                    };
                }
                return Err(err).wrap_err_with(|| format!("failed to evaluate kernel group {}", group.name()));
            }
            replaced.push((name.to_string(), previous));
        }
        Ok(())
    }

    /// Evaluates a single equation and stores the new value of its left-hand side.
    pub fn evaluate_equation(&mut self, equation: &Equation) -> eyre::Result<()> {
        for entity in equation.inputs() {
            self.check_value(&entity)?;
        }

        let lhs_shape = self.sizes.resolve_shape(equation.lhs().shape())?;
        let letters = equation.free_indices().letters();
        let mut env = FxHashMap::default();
        let mut output = DenseTensor::zeros(&lhs_shape);
        let mut result = Ok(());
        for_each_multi_index(&lhs_shape, |index| {
            if result.is_err() {
                return;
            }
            for (&letter, &i) in letters.iter().zip(index) {
                env.insert(letter, i);
            }
            match self.evaluate_additive(equation.rhs(), letters, &mut env) {
                Ok(value) => output.set(index, value),
                Err(err) => result = Err(err),
            }
        });
        result?;

        debug!("evaluated {}", equation.lhs().name());
        self.values.insert(equation.lhs().name().to_string(), output);
        Ok(())
    }

    fn check_value(&self, entity: &Entity) -> eyre::Result<()> {
        let value = self
            .values
            .get(entity.name())
            .ok_or_else(|| eyre!("no value provided for {}", entity.name()))?;
        let expected = self.sizes.resolve_shape(entity.shape())?;
        if value.shape() != expected.as_slice() {
            return Err(eyre!(
                "value of {} has shape {:?}, expected {:?}",
                entity.name(),
                value.shape(),
                expected
            ));
        }
        Ok(())
    }

    fn evaluate_additive(&self, expr: &Expr, bound: &[char], env: &mut FxHashMap<char, usize>) -> eyre::Result<f64> {
        match expr.node() {
            Node::Sum(terms) => terms
                .iter()
                .map(|term| self.evaluate_additive(term, bound, env))
                .sum(),
            _ => self.evaluate_term(expr, bound, env),
        }
    }

    /// Sums `expr` over all of its letters that are not in `bound`.
    ///
    /// Previous values of the summed letters are restored afterwards, so that letters contracted
    /// inside a nested sum never leak into the enclosing term.
    fn evaluate_term(&self, expr: &Expr, bound: &[char], env: &mut FxHashMap<char, usize>) -> eyre::Result<f64> {
        let mut summed = Vec::new();
        let mut extents = Vec::new();
        for occurrence in expr.signature().iter() {
            if !bound.contains(&occurrence.index) {
                summed.push(occurrence.index);
                extents.push(self.sizes.resolve(&occurrence.size)?);
            }
        }
        let saved: Vec<Option<usize>> = summed.iter().map(|letter| env.get(letter).copied()).collect();

        let mut total = Ok(0.0);
        for_each_multi_index(&extents, |index| {
            if let Ok(acc) = total {
                for (&letter, &i) in summed.iter().zip(index) {
                    env.insert(letter, i);
                }
                total = self.evaluate_factor(expr, env).map(|value| acc + value);
            }
        });

        for (letter, previous) in summed.iter().zip(saved) {
            match previous {
                Some(i) => env.insert(*letter, i),
                None => env.remove(letter),
            };
        }
        total
    }

    fn evaluate_factor(&self, expr: &Expr, env: &mut FxHashMap<char, usize>) -> eyre::Result<f64> {
        match expr.node() {
            Node::Ref { entity, indices } => {
                let value = self
                    .values
                    .get(entity.name())
                    .ok_or_else(|| eyre!("no value provided for {}", entity.name()))?;
                let index: Vec<usize> = indices.letters().iter().map(|letter| env[letter]).collect();
                Ok(value.get(&index))
            }
            Node::Product(a, b) => Ok(self.evaluate_factor(a, env)? * self.evaluate_factor(b, env)?),
            Node::Scale(coefficient, inner) => {
                let factor = match coefficient {
                    Coefficient::Constant(value) => *value,
                    Coefficient::Scalar(scalar) => self
                        .values
                        .get(scalar.name())
                        .and_then(|value| value.data().first().copied())
                        .ok_or_else(|| eyre!("no value provided for {}", scalar.name()))?,
                };
                Ok(factor * self.evaluate_factor(inner, env)?)
            }
            Node::Sum(terms) => {
                let exposed: Vec<char> = expr.signature().letters().collect();
                terms
                    .iter()
                    .map(|term| self.evaluate_term(term, &exposed, env))
                    .sum()
            }
        }
    }
}

impl Generator for Evaluator {
    fn accept(&mut self, group: &KernelGroup) -> eyre::Result<()> {
        self.evaluate_group(group)
    }
}
