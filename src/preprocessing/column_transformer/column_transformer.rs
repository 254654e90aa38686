//! ColumnTransformer implementation.
//!
//! Applies a step to each declared column of a [`Table`] and concatenates the
//! resulting blocks horizontally.

use crate::dataset::{
    normalize_category, CellRef, ColumnKind, FeatureColumn, FeatureRow, Table,
};
use crate::preprocessing::encoding::{
    FittedOneHotEncoder, HandleUnknown, OneHotEncoder, OneHotEncoderParams,
};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{s, Array1, Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Unfitted step applied to one column.
#[derive(Clone, Debug)]
pub enum ColumnStep {
    /// One-hot encode a categorical column.
    OneHot(OneHotEncoder),
    /// Copy a numeric column unchanged.
    Passthrough,
}

impl ColumnStep {
    fn step_name(&self) -> &'static str {
        match self {
            ColumnStep::OneHot(_) => "OneHotEncoder",
            ColumnStep::Passthrough => "Passthrough",
        }
    }

    fn accepts(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (ColumnStep::OneHot(_), ColumnKind::Categorical)
                | (ColumnStep::Passthrough, ColumnKind::Numeric)
        )
    }
}

/// Fitted step for one column.
#[derive(Clone, Debug)]
pub enum FittedColumnStep {
    OneHot(FittedOneHotEncoder),
    Passthrough,
}

impl FittedColumnStep {
    /// Get the step name.
    pub fn step_name(&self) -> &'static str {
        match self {
            FittedColumnStep::OneHot(_) => "OneHotEncoder",
            FittedColumnStep::Passthrough => "Passthrough",
        }
    }

    /// Width of the block this step produces.
    pub fn n_features_out(&self) -> usize {
        match self {
            FittedColumnStep::OneHot(encoder) => encoder.n_features_out(),
            FittedColumnStep::Passthrough => 1,
        }
    }

    fn write(
        &self,
        column: FeatureColumn,
        cell: CellRef<'_>,
        mut out: ArrayViewMut1<'_, f32>,
    ) -> Result<(), PreprocessingError> {
        match (self, cell) {
            (FittedColumnStep::OneHot(encoder), CellRef::Categorical(value)) => {
                encoder
                    .encode_into(normalize_category(value), out)
                    .map_err(|err| match err {
                        PreprocessingError::UnknownCategory { value, .. } => {
                            PreprocessingError::UnknownCategory {
                                column: column.name().to_string(),
                                value,
                            }
                        }
                        other => other,
                    })
            }
            (FittedColumnStep::Passthrough, CellRef::Numeric(value)) => {
                out[0] = value;
                Ok(())
            }
            _ => Err(PreprocessingError::InvalidParameter(format!(
                "{} cannot encode column {}",
                self.step_name(),
                column
            ))),
        }
    }
}

/// ColumnTransformer applies a different step to each feature column.
///
/// Output blocks follow the order in which steps were declared; each
/// one-hot block is ordered by its sorted vocabulary.
///
/// # Example
/// ```
/// use case_classifier::dataset::{FeatureColumn, FeatureRow, Table};
/// use case_classifier::preprocessing::{
///     ColumnTransformer, FittedTransformer, HandleUnknown, OneHotEncoder, Transformer,
/// };
///
/// let table = Table::assemble(vec![
///     (FeatureRow::new(34.0, "A", "X"), "homicide".to_string()),
///     (FeatureRow::new(5.0, "B", "Y"), "accident".to_string()),
/// ]);
///
/// let ct = ColumnTransformer::new()
///     .add_one_hot_encoder(
///         OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore),
///         FeatureColumn::Location,
///     )
///     .add_passthrough(FeatureColumn::Age);
///
/// let fitted = ct.fit(&table).unwrap();
/// let x = fitted.transform(&table).unwrap();
/// assert_eq!(x.row(0).to_vec(), vec![1.0, 0.0, 34.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnTransformer {
    steps: Vec<(FeatureColumn, ColumnStep)>,
}

impl ColumnTransformer {
    /// Create a new empty ColumnTransformer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The preprocessing used for case records: one-hot ethnicity and
    /// location (unseen values ignored), then age passed through.
    pub fn for_case_features() -> Self {
        let one_hot = OneHotEncoder::new().with_handle_unknown(HandleUnknown::Ignore);
        Self::new()
            .add_one_hot_encoder(one_hot.clone(), FeatureColumn::Ethnicity)
            .add_one_hot_encoder(one_hot, FeatureColumn::Location)
            .add_passthrough(FeatureColumn::Age)
    }

    /// Add a OneHotEncoder for a categorical column.
    pub fn add_one_hot_encoder(mut self, encoder: OneHotEncoder, column: FeatureColumn) -> Self {
        self.steps.push((column, ColumnStep::OneHot(encoder)));
        self
    }

    /// Pass a numeric column through unchanged.
    pub fn add_passthrough(mut self, column: FeatureColumn) -> Self {
        self.steps.push((column, ColumnStep::Passthrough));
        self
    }

    /// Add a generic step.
    pub fn add(mut self, step: ColumnStep, column: FeatureColumn) -> Self {
        self.steps.push((column, step));
        self
    }

    /// Get the number of transformer steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Serializable parameters of one fitted step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKindParams {
    OneHot(OneHotEncoderParams),
    Passthrough,
}

/// Serializable parameters for fitted column transformer step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepParams {
    /// Column this step was applied to.
    pub column: FeatureColumn,
    /// Step parameters.
    pub kind: StepKindParams,
}

/// Serializable parameters for a fitted ColumnTransformer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTransformerParams {
    /// Number of output features.
    pub n_features_out: usize,
    /// Step parameters, in output order.
    pub steps: Vec<StepParams>,
}

/// Fitted ColumnTransformer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedColumnTransformer {
    /// Fitted steps with their columns, in output order.
    fitted_steps: Vec<(FeatureColumn, FittedColumnStep)>,
    /// Number of output features.
    n_features_out: usize,
}

impl FittedColumnTransformer {
    /// Get step names with their columns.
    pub fn step_names(&self) -> Vec<(&'static str, FeatureColumn)> {
        self.fitted_steps
            .iter()
            .map(|(column, step)| (step.step_name(), *column))
            .collect()
    }

    /// Fitted steps in output order.
    pub fn steps(&self) -> &[(FeatureColumn, FittedColumnStep)] {
        &self.fitted_steps
    }

    /// Output column range of the first block produced for `column`.
    pub fn block_range(&self, column: FeatureColumn) -> Option<Range<usize>> {
        let mut offset = 0;
        for (step_column, step) in &self.fitted_steps {
            let width = step.n_features_out();
            if *step_column == column {
                return Some(offset..offset + width);
            }
            offset += width;
        }
        None
    }

    /// Names of the output columns, e.g. `location=X` or `age`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features_out);
        for (column, step) in &self.fitted_steps {
            match step {
                FittedColumnStep::OneHot(encoder) => names.extend(
                    encoder
                        .categories()
                        .iter()
                        .map(|cat| format!("{}={}", column, cat)),
                ),
                FittedColumnStep::Passthrough => names.push(column.name().to_string()),
            }
        }
        names
    }

    /// Transform a single row with the fitted steps.
    pub fn transform_row(&self, row: &FeatureRow) -> Result<Array1<f32>, PreprocessingError> {
        let mut result = Array1::<f32>::zeros(self.n_features_out);
        self.write_row(|column| row.get(column), result.view_mut())?;
        Ok(result)
    }

    fn write_row<'a, F>(&self, cell: F, mut out: ArrayViewMut1<'_, f32>) -> Result<(), PreprocessingError>
    where
        F: Fn(FeatureColumn) -> CellRef<'a>,
    {
        let mut offset = 0;
        for (column, step) in &self.fitted_steps {
            let width = step.n_features_out();
            step.write(*column, cell(*column), out.slice_mut(s![offset..offset + width]))?;
            offset += width;
        }
        Ok(())
    }
}

impl Transformer for ColumnTransformer {
    type Input = Table;
    type Output = Array2<f32>;
    type Params = ColumnTransformerParams;
    type Fitted = FittedColumnTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit ColumnTransformer on empty data".to_string(),
            ));
        }

        if self.steps.is_empty() {
            return Err(PreprocessingError::InvalidParameter(
                "Cannot fit empty ColumnTransformer".to_string(),
            ));
        }

        let mut fitted_steps = Vec::with_capacity(self.steps.len());
        let mut n_features_out = 0;

        for (column, step) in &self.steps {
            if !step.accepts(column.kind()) {
                return Err(PreprocessingError::InvalidParameter(format!(
                    "{} cannot be applied to {:?} column {}",
                    step.step_name(),
                    column.kind(),
                    column
                )));
            }

            let fitted = match step {
                ColumnStep::OneHot(encoder) => {
                    let values = data.categorical(*column).ok_or_else(|| {
                        PreprocessingError::InvalidParameter(format!(
                            "column {} is not categorical",
                            column
                        ))
                    })?;
                    FittedColumnStep::OneHot(encoder.fit(values)?)
                }
                ColumnStep::Passthrough => FittedColumnStep::Passthrough,
            };

            n_features_out += fitted.n_features_out();
            fitted_steps.push((*column, fitted));
        }

        Ok(FittedColumnTransformer {
            fitted_steps,
            n_features_out,
        })
    }
}

impl FittedTransformer for FittedColumnTransformer {
    type Input = Table;
    type Output = Array2<f32>;
    type Params = ColumnTransformerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let mut result = Array2::<f32>::zeros((data.len(), self.n_features_out));
        for (row, out) in result.rows_mut().into_iter().enumerate() {
            self.write_row(|column| data.cell(row, column), out)?;
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        let steps = self
            .fitted_steps
            .iter()
            .map(|(column, step)| StepParams {
                column: *column,
                kind: match step {
                    FittedColumnStep::OneHot(encoder) => {
                        StepKindParams::OneHot(encoder.extract_params())
                    }
                    FittedColumnStep::Passthrough => StepKindParams::Passthrough,
                },
            })
            .collect();

        ColumnTransformerParams {
            n_features_out: self.n_features_out,
            steps,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        let mut fitted_steps = Vec::with_capacity(params.steps.len());
        let mut n_features_out = 0;

        for step_params in params.steps {
            let step = match step_params.kind {
                StepKindParams::OneHot(p) => {
                    FittedColumnStep::OneHot(FittedOneHotEncoder::from_params(p)?)
                }
                StepKindParams::Passthrough => FittedColumnStep::Passthrough,
            };
            let kind = step_params.column.kind();
            let compatible = matches!(
                (&step, kind),
                (FittedColumnStep::OneHot(_), ColumnKind::Categorical)
                    | (FittedColumnStep::Passthrough, ColumnKind::Numeric)
            );
            if !compatible {
                return Err(PreprocessingError::SerializationError(format!(
                    "{} stored for {:?} column {}",
                    step.step_name(),
                    kind,
                    step_params.column
                )));
            }
            n_features_out += step.n_features_out();
            fitted_steps.push((step_params.column, step));
        }

        if n_features_out != params.n_features_out {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: params.n_features_out,
                got_features: n_features_out,
            });
        }

        Ok(FittedColumnTransformer {
            fitted_steps,
            n_features_out,
        })
    }

    fn n_features_out(&self) -> usize {
        self.n_features_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::assemble(vec![
            (FeatureRow::new(34.0, "A", "X"), "homicide".to_string()),
            (FeatureRow::new(5.0, "B", "Y"), "accident".to_string()),
            (FeatureRow::new(61.0, "A", "Z"), "homicide".to_string()),
        ])
    }

    #[test]
    fn test_case_features_layout() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();

        // ethnicity {A, B} + location {X, Y, Z} + age
        assert_eq!(fitted.n_features_out(), 6);
        assert_eq!(
            fitted.feature_names(),
            vec![
                "ethnicity=A",
                "ethnicity=B",
                "location=X",
                "location=Y",
                "location=Z",
                "age"
            ]
        );
        assert_eq!(fitted.block_range(FeatureColumn::Location), Some(2..5));
        assert_eq!(fitted.block_range(FeatureColumn::Age), Some(5..6));

        let x = fitted.transform(&table()).unwrap();
        assert_eq!(x.dim(), (3, 6));
        assert_eq!(x.row(0).to_vec(), vec![1.0, 0.0, 1.0, 0.0, 0.0, 34.0]);
        assert_eq!(x.row(1).to_vec(), vec![0.0, 1.0, 0.0, 1.0, 0.0, 5.0]);
        assert_eq!(x.row(2).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 61.0]);
    }

    #[test]
    fn test_numeric_column_passes_through_unscaled() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();
        let x = fitted.transform(&table()).unwrap();
        let ages: Vec<f32> = x.column(5).to_vec();
        assert_eq!(ages, table().ages());
    }

    #[test]
    fn test_unknown_category_gives_zero_block() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();

        let encoded = fitted
            .transform_row(&FeatureRow::new(40.0, "never-seen", "Y"))
            .unwrap();

        assert_eq!(encoded.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 40.0]);
    }

    #[test]
    fn test_padded_and_blank_categories_encode_like_training() {
        let raw = Table::assemble(vec![
            (FeatureRow::new(20.0, " parda ", "X"), "a".to_string()),
            (FeatureRow::new(60.0, "", "Y"), "b".to_string()),
        ]);
        let fitted = ColumnTransformer::for_case_features().fit(&raw).unwrap();
        assert_eq!(
            fitted.feature_names(),
            vec!["ethnicity=<unknown>", "ethnicity=parda", "location=X", "location=Y", "age"]
        );

        let x = fitted.transform(&raw).unwrap();
        let blank = fitted.transform_row(&FeatureRow::new(60.0, "", "Y")).unwrap();
        let padded = fitted
            .transform_row(&FeatureRow::new(20.0, " parda ", "X"))
            .unwrap();

        assert_eq!(blank.to_vec(), vec![1.0, 0.0, 0.0, 1.0, 60.0]);
        assert_eq!(blank, x.row(1));
        assert_eq!(padded, x.row(0));
        assert_eq!(
            fitted
                .transform_row(&FeatureRow::new(20.0, "  ", " X"))
                .unwrap()
                .to_vec(),
            vec![1.0, 0.0, 1.0, 0.0, 20.0]
        );
    }

    #[test]
    fn test_unknown_category_error_names_column() {
        let ct = ColumnTransformer::new()
            .add_one_hot_encoder(OneHotEncoder::new(), FeatureColumn::Location)
            .add_passthrough(FeatureColumn::Age);
        let fitted = ct.fit(&table()).unwrap();

        let result = fitted.transform_row(&FeatureRow::new(1.0, "A", "Q"));
        match result {
            Err(PreprocessingError::UnknownCategory { column, value }) => {
                assert_eq!(column, "location");
                assert_eq!(value, "Q");
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_transform_determinism_across_fits() {
        let first = ColumnTransformer::for_case_features().fit(&table()).unwrap();

        let mut reversed_rows: Vec<_> = (0..3)
            .rev()
            .map(|i| (table().row(i).unwrap(), table().labels()[i].clone()))
            .collect();
        reversed_rows.rotate_left(1);
        let second = ColumnTransformer::for_case_features()
            .fit(&Table::assemble(reversed_rows))
            .unwrap();

        assert_eq!(first.n_features_out(), second.n_features_out());
        assert_eq!(first.extract_params(), second.extract_params());
        assert_eq!(
            first.transform(&table()).unwrap(),
            second.transform(&table()).unwrap()
        );
    }

    #[test]
    fn test_row_and_table_transform_agree() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();
        let x = fitted.transform(&table()).unwrap();
        for i in 0..3 {
            let row = fitted.transform_row(&table().row(i).unwrap()).unwrap();
            assert_eq!(row, x.row(i));
        }
    }

    #[test]
    fn test_one_hot_on_numeric_column_rejected() {
        let ct = ColumnTransformer::new().add_one_hot_encoder(OneHotEncoder::new(), FeatureColumn::Age);
        assert!(matches!(
            ct.fit(&table()),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_passthrough_on_categorical_column_rejected() {
        let ct = ColumnTransformer::new().add_passthrough(FeatureColumn::Location);
        assert!(matches!(
            ct.fit(&table()),
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_column_transformer_empty_data() {
        let result = ColumnTransformer::for_case_features().fit(&Table::default());
        assert!(matches!(result, Err(PreprocessingError::EmptyData(_))));
    }

    #[test]
    fn test_column_transformer_empty_transformers() {
        let result = ColumnTransformer::new().fit(&table());
        assert!(matches!(
            result,
            Err(PreprocessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_column_transformer_fit_transform() {
        let x = ColumnTransformer::for_case_features()
            .fit_transform(&table())
            .unwrap();
        assert_eq!(x.dim(), (3, 6));
    }

    #[test]
    fn test_column_transformer_serialization() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column_transformer.bin");
        fitted.save_to_file(&path).unwrap();

        let loaded = FittedColumnTransformer::load_from_file(&path).unwrap();

        assert_eq!(loaded.n_features_out(), fitted.n_features_out());
        assert_eq!(loaded.step_names(), fitted.step_names());
        assert_eq!(
            loaded.transform(&table()).unwrap(),
            fitted.transform(&table()).unwrap()
        );
    }

    #[test]
    fn test_from_params_rejects_width_mismatch() {
        let fitted = ColumnTransformer::for_case_features().fit(&table()).unwrap();
        let mut params = fitted.extract_params();
        params.n_features_out += 1;

        assert!(matches!(
            FittedColumnTransformer::from_params(params),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_from_params_rejects_step_on_wrong_column_kind() {
        let params = ColumnTransformerParams {
            n_features_out: 1,
            steps: vec![StepParams {
                column: FeatureColumn::Location,
                kind: StepKindParams::Passthrough,
            }],
        };
        assert!(FittedColumnTransformer::from_params(params).is_err());
    }
}
