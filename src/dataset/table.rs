use crate::dataset::{
    normalize_category, CellRef, ColumnKind, FeatureColumn, FeatureRow, Label,
};

/// Column-major table of extracted samples.
///
/// Holds exactly the three feature columns of [`FEATURE_COLUMNS`](super::FEATURE_COLUMNS)
/// plus the label column. Every column has the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    ages: Vec<f32>,
    ethnicities: Vec<String>,
    locations: Vec<String>,
    labels: Vec<Label>,
}

impl Table {
    /// Collects extracted `(features, label)` pairs into a table.
    ///
    /// Row order follows the input order.
    pub fn assemble<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (FeatureRow, Label)>,
    {
        let rows = rows.into_iter();
        let (lower, _) = rows.size_hint();
        let mut table = Table {
            ages: Vec::with_capacity(lower),
            ethnicities: Vec::with_capacity(lower),
            locations: Vec::with_capacity(lower),
            labels: Vec::with_capacity(lower),
        };
        for (features, label) in rows {
            table.push(features, label);
        }
        table
    }

    /// Appends one row.
    pub fn push(&mut self, features: FeatureRow, label: Label) {
        self.ages.push(features.age);
        self.ethnicities
            .push(normalize_category(&features.ethnicity).to_string());
        self.locations
            .push(normalize_category(&features.location).to_string());
        self.labels.push(label);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn ages(&self) -> &[f32] {
        &self.ages
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Values of a categorical column, or `None` for a numeric one.
    pub fn categorical(&self, column: FeatureColumn) -> Option<&[String]> {
        match column {
            FeatureColumn::Ethnicity => Some(&self.ethnicities),
            FeatureColumn::Location => Some(&self.locations),
            FeatureColumn::Age => None,
        }
    }

    /// Values of a numeric column, or `None` for a categorical one.
    pub fn numeric(&self, column: FeatureColumn) -> Option<&[f32]> {
        match column.kind() {
            ColumnKind::Numeric => Some(&self.ages),
            ColumnKind::Categorical => None,
        }
    }

    /// Cell at `row` in `column`.
    ///
    /// # Panics
    /// Panics if `row >= self.len()`.
    pub fn cell(&self, row: usize, column: FeatureColumn) -> CellRef<'_> {
        match column {
            FeatureColumn::Age => CellRef::Numeric(self.ages[row]),
            FeatureColumn::Ethnicity => CellRef::Categorical(&self.ethnicities[row]),
            FeatureColumn::Location => CellRef::Categorical(&self.locations[row]),
        }
    }

    /// Owned copy of the features at `row`, if it exists.
    pub fn row(&self, row: usize) -> Option<FeatureRow> {
        if row >= self.len() {
            return None;
        }
        Some(FeatureRow {
            age: self.ages[row],
            ethnicity: self.ethnicities[row].clone(),
            location: self.locations[row].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<(FeatureRow, Label)> {
        vec![
            (FeatureRow::new(34.0, "A", "X"), "homicide".to_string()),
            (FeatureRow::new(5.0, "B", "Y"), "accident".to_string()),
            (FeatureRow::new(61.0, "A", "Y"), "homicide".to_string()),
        ]
    }

    #[test]
    fn test_assemble_keeps_every_row() {
        let table = Table::assemble(sample_rows());
        assert_eq!(table.len(), 3);
        assert_eq!(table.ages(), &[34.0, 5.0, 61.0]);
        assert_eq!(table.labels()[1], "accident");
    }

    #[test]
    fn test_assemble_empty() {
        let table = Table::assemble(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.row(0), None);
    }

    #[test]
    fn test_column_accessors() {
        let table = Table::assemble(sample_rows());
        assert_eq!(
            table.categorical(FeatureColumn::Location).unwrap(),
            &["X".to_string(), "Y".to_string(), "Y".to_string()]
        );
        assert!(table.categorical(FeatureColumn::Age).is_none());
        assert!(table.numeric(FeatureColumn::Ethnicity).is_none());
        assert_eq!(table.numeric(FeatureColumn::Age).unwrap().len(), 3);
    }

    #[test]
    fn test_row_and_cell_agree() {
        let table = Table::assemble(sample_rows());
        let row = table.row(1).unwrap();
        assert_eq!(row, FeatureRow::new(5.0, "B", "Y"));
        assert_eq!(table.cell(1, FeatureColumn::Ethnicity), CellRef::Categorical("B"));
        assert_eq!(table.cell(2, FeatureColumn::Age), CellRef::Numeric(61.0));
    }
}
