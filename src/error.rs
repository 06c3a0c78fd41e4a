//! Validation failures raised while building a specification.
use crate::tensor::Size;
use std::error::Error;
use std::fmt;

/// An index letter bound to an axis of a particular entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBinding {
    pub entity: String,
    pub size: Size,
}

impl IndexBinding {
    pub fn new(entity: impl Into<String>, size: Size) -> Self {
        Self {
            entity: entity.into(),
            size,
        }
    }
}

impl fmt::Display for IndexBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (size {})", self.entity, self.size)
    }
}

/// Why the free indices of an expression do not line up with what was expected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FreeIndexReason {
    /// The left-hand side index string repeats a letter.
    DuplicateInLhs,
    /// A left-hand side letter does not occur in a right-hand side term.
    MissingFromTerm,
    /// A letter occurs exactly once in a term but not on the left-hand side.
    NotInLhs,
    /// The addends of a sum expose different free indices.
    AddendMismatch,
}

impl fmt::Display for FreeIndexReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            FreeIndexReason::DuplicateInLhs => "repeated in the output indices",
            FreeIndexReason::MissingFromTerm => "missing from a right-hand side term",
            FreeIndexReason::NotInLhs => "free in a term but absent from the output indices",
            FreeIndexReason::AddendMismatch => "not shared by all addends",
        };
        write!(f, "{description}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecificationError {
    /// An entity or kernel group was given an empty name.
    InvalidName,
    /// A declared shape contains a zero extent or an empty symbolic token.
    InvalidShape { entity: String, axis: usize },
    /// A dimension parameter is a zero extent or an empty symbolic token.
    InvalidParameter { parameter: &'static str, size: Size },
    /// A tensor, scalar or kernel group name is already taken.
    DuplicateName { name: String },
    /// The index string does not have one letter per axis.
    RankMismatch {
        entity: String,
        rank: usize,
        indices: String,
    },
    /// One index letter is bound to axes of different extent.
    SizeMismatch {
        index: char,
        first: IndexBinding,
        second: IndexBinding,
    },
    /// The free indices of an expression disagree with the output or with each other.
    FreeIndexMismatch {
        index: Option<char>,
        expected: String,
        found: String,
        reason: FreeIndexReason,
    },
    /// A sum, product or kernel group without any operands.
    Empty { what: &'static str },
}

impl SpecificationError {
    /// The index letter the error is about, if any.
    pub fn index(&self) -> Option<char> {
        match self {
            SpecificationError::SizeMismatch { index, .. } => Some(*index),
            SpecificationError::FreeIndexMismatch { index, .. } => *index,
            _ => None,
        }
    }
}

impl fmt::Display for SpecificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecificationError::InvalidName => write!(f, "names must not be empty"),
            SpecificationError::InvalidShape { entity, axis } => {
                write!(f, "axis {axis} of {entity} has an invalid size")
            }
            SpecificationError::InvalidParameter { parameter, size } => {
                write!(f, "parameter {parameter} has the invalid size '{size}'")
            }
            SpecificationError::DuplicateName { name } => write!(f, "name '{name}' is already declared"),
            SpecificationError::RankMismatch { entity, rank, indices } => write!(
                f,
                "index string '{indices}' has {} letters but {entity} has rank {rank}",
                indices.chars().count()
            ),
            SpecificationError::SizeMismatch { index, first, second } => {
                write!(f, "index '{index}' is bound to {first} and to {second}")
            }
            SpecificationError::FreeIndexMismatch {
                index,
                expected,
                found,
                reason,
            } => {
                match index {
                    Some(index) => write!(f, "index '{index}' is {reason}")?,
                    None => write!(f, "free indices are {reason}")?,
                }
                write!(f, " (expected '{expected}', found '{found}')")
            }
            SpecificationError::Empty { what } => write!(f, "{what} must not be empty"),
        }
    }
}

impl Error for SpecificationError {}
