//! ColumnTransformer for applying different transformers to different columns.
//!
//! This module provides the `ColumnTransformer` which one-hot encodes the
//! categorical columns of a [`Table`](crate::dataset::Table) and passes the
//! numeric ones through, concatenating the blocks in declaration order.

#[allow(clippy::module_inception)]
mod column_transformer;

pub use column_transformer::{
    ColumnStep, ColumnTransformer, ColumnTransformerParams, FittedColumnStep,
    FittedColumnTransformer, StepKindParams, StepParams,
};
