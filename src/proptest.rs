//! Strategies for generating random contraction problems.
use crate::equation::{bind, Equation};
use crate::error::SpecificationError;
use crate::expression::{product_of, Expr};
use crate::tensor::{Size, Tensor};
use ::proptest::prelude::*;
use std::collections::BTreeSet;
use std::iter;

pub fn size() -> impl Strategy<Value = Size> {
    prop_oneof![
        (1..5usize).prop_map(Size::Fixed),
        prop::sample::select(vec!["N", "M", "Nq"]).prop_map(|name| Size::symbolic(name)),
    ]
}

/// A product of tensors bound to an output, with consistent sizes for every index letter.
///
/// Output letters occur once or twice among the operands, every other letter at least twice.
#[derive(Debug, Clone)]
pub struct ContractionProblem {
    pub lhs: Tensor,
    pub lhs_indices: String,
    pub operands: Vec<(Tensor, String)>,
}

impl ContractionProblem {
    pub fn expression(&self) -> Result<Expr, SpecificationError> {
        let factors = self
            .operands
            .iter()
            .map(|(tensor, indices)| tensor.at(indices))
            .collect::<Result<Vec<_>, _>>()?;
        product_of(factors)
    }

    pub fn bind(&self) -> Result<Equation, SpecificationError> {
        bind(&self.lhs, &self.lhs_indices, self.expression()?)
    }

    /// The letters that a correct binding contracts.
    pub fn expected_contracted(&self) -> BTreeSet<char> {
        self.operands
            .iter()
            .flat_map(|(_, indices)| indices.chars())
            .filter(|c| !self.lhs_indices.contains(*c))
            .collect()
    }

    /// Replaces the size of one operand axis by a different one.
    ///
    /// Returns the modified problem and the letter of the changed axis.
    pub fn with_mismatched_axis(&self, operand: usize, axis: usize) -> (Self, char) {
        let mut problem = self.clone();
        let (tensor, indices) = &mut problem.operands[operand];
        let mut shape = tensor.shape().to_vec();
        shape[axis] = different_size(&shape[axis]);
        *tensor = Tensor::new_unchecked(tensor.name().to_string(), shape);
        let letter = indices
            .chars()
            .nth(axis)
            .expect("axis is within the operand's rank");
        (problem, letter)
    }

    fn from_parts(letters: &[LetterSpec], occurrences: &[char], assignment: &[usize]) -> Self {
        let size_of = |c: char| {
            letters
                .iter()
                .find(|letter| letter.index == c)
                .map(|letter| letter.size.clone())
                .expect("every occurrence belongs to a generated letter")
        };

        let num_operands = assignment.iter().copied().max().unwrap_or(0) + 1;
        let operands = (0..num_operands)
            .map(|operand| {
                occurrences
                    .iter()
                    .zip(assignment)
                    .filter(|(_, a)| **a == operand)
                    .map(|(&c, _)| c)
                    .collect::<String>()
            })
            .filter(|indices| !indices.is_empty())
            .enumerate()
            .map(|(i, indices)| {
                let shape = indices.chars().map(size_of).collect();
                (Tensor::new_unchecked(format!("T{i}"), shape), indices)
            })
            .collect();

        let lhs_indices: String = letters
            .iter()
            .filter(|letter| letter.output)
            .map(|letter| letter.index)
            .collect();
        let lhs_shape = lhs_indices.chars().map(size_of).collect();
        Self {
            lhs: Tensor::new_unchecked("Out".to_string(), lhs_shape),
            lhs_indices,
            operands,
        }
    }
}

fn different_size(size: &Size) -> Size {
    match size {
        Size::Fixed(n) => Size::Fixed(n + 1),
        Size::Symbolic(token) => Size::symbolic(format!("{token}'")),
    }
}

#[derive(Debug, Clone)]
struct LetterSpec {
    index: char,
    size: Size,
    output: bool,
    multiplicity: usize,
}

fn letter_specs() -> impl Strategy<Value = Vec<LetterSpec>> {
    prop::collection::vec((size(), any::<bool>(), 0..2usize), 1..=5).prop_map(|letters| {
        letters
            .into_iter()
            .zip('a'..)
            .map(|((size, output, extra), index)| LetterSpec {
                index,
                size,
                output,
                multiplicity: if output { 1 + extra } else { 2 + extra },
            })
            .collect()
    })
}

pub fn contraction_problem() -> impl Strategy<Value = ContractionProblem> {
    letter_specs()
        .prop_flat_map(|letters| {
            let occurrences: Vec<char> = letters
                .iter()
                .flat_map(|letter| iter::repeat(letter.index).take(letter.multiplicity))
                .collect();
            let assignment = prop::collection::vec(0..3usize, occurrences.len());
            (Just(letters), Just(occurrences).prop_shuffle(), assignment)
        })
        .prop_map(|(letters, occurrences, assignment)| {
            ContractionProblem::from_parts(&letters, &occurrences, &assignment)
        })
}

/// A contraction problem in which exactly one operand axis has the wrong size.
///
/// Each value is the broken problem together with the letter of the broken axis.
pub fn mismatched_contraction_problem() -> impl Strategy<Value = (ContractionProblem, char)> {
    contraction_problem()
        .prop_flat_map(|problem| {
            let num_operands = problem.operands.len();
            (Just(problem), 0..num_operands)
        })
        .prop_flat_map(|(problem, operand)| {
            let rank = problem.operands[operand].0.rank();
            (Just(problem), Just(operand), 0..rank)
        })
        .prop_map(|(problem, operand, axis)| problem.with_mismatched_axis(operand, axis))
}
