//! Guard expression compiler.
//!
//! Guards are built programmatically as a [`ConditionNode`] tree and rendered
//! into the CI platform's expression syntax. There is no textual parser.

pub mod builders;
pub mod condition;

pub use builders::*;
pub use condition::{ComparisonOp, ConditionNode};
