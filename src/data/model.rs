use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from a workbook.
/// Rows are deduplicated through `HashSet` and values collected into
/// `BTreeSet`s downstream, so `CellValue` must be `Eq`, `Ord` and `Hash`.
#[derive(Debug, Clone, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

// -- Manual Eq/Ord/Hash: floats compare by total order / bit pattern --

/// Equality is `cmp(..) == Equal`, so it agrees with `Hash`: `NaN == NaN`
/// and `0.0 != -0.0`.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Empty => 0,
                Bool(_) => 1,
                Number(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Empty, Empty) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Empty => {}
        }
    }
}

/// Integral numbers print without a fractional part so that day 5 renders
/// as `5`, not `5.0`.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric view used by the chart queries.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Positional column identifier. Labels are for display only; every lookup
/// inside the crate goes through a `ColumnId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Table – rows of cells under a flat header
// ---------------------------------------------------------------------------

/// A rectangular table: every row has exactly `columns.len()` cells.
/// Row position is the (0-based, contiguous) index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build an empty table from display labels.
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Column {
                id: ColumnId(i),
                label: label.into(),
            })
            .collect();
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// First column carrying `label`.
    pub fn column_id(&self, label: &str) -> Option<ColumnId> {
        self.columns.iter().find(|c| c.label == label).map(|c| c.id)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    pub fn cell(&self, row: usize, column: ColumnId) -> &CellValue {
        &self.rows[row][column.0]
    }

    /// A row with every cell empty, sized to this table.
    pub fn blank_row(&self) -> Vec<CellValue> {
        vec![CellValue::Empty; self.columns.len()]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the normalized table produced by one load pass
// ---------------------------------------------------------------------------

/// The normalized, deduplicated dataset with its key columns resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub table: Table,
    /// Column holding the effective sample identifier.
    pub sample: ColumnId,
    /// Column holding the day offset, when the workbook has one.
    pub day: Option<ColumnId>,
    /// Header label the day column was looked up by.
    pub day_label: String,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Distinct sample identifiers in first-seen order.
    pub fn samples(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.table
            .rows
            .iter()
            .map(|row| row[self.sample.0].to_string())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    pub fn sample_of(&self, row: usize) -> String {
        self.table.cell(row, self.sample).to_string()
    }

    /// Every column other than the sample and day keys.
    pub fn measurements(&self) -> Vec<&Column> {
        self.table
            .columns
            .iter()
            .filter(|c| c.id != self.sample && Some(c.id) != self.day)
            .collect()
    }

    /// Resolve a measurement label to its column, rejecting the key columns.
    pub fn measurement_id(&self, label: &str) -> Option<ColumnId> {
        self.table
            .column_id(label)
            .filter(|id| *id != self.sample && Some(*id) != self.day)
    }

    /// Look up a single reading by (sample id, day, measurement label).
    /// Returns the first matching row's cell.
    pub fn value(&self, sample: &str, day: &CellValue, measurement: &str) -> Option<&CellValue> {
        let day_col = self.day?;
        let col = self.table.column_id(measurement)?;
        self.table
            .rows
            .iter()
            .find(|row| row[self.sample.0].to_string() == sample && &row[day_col.0] == day)
            .map(|row| &row[col.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn dataset() -> Dataset {
        let mut table = Table::with_labels(["Sample No", "Day", "pH (int.) [-]"]);
        table.rows = vec![
            vec![CellValue::text("42"), CellValue::Number(0.0), CellValue::Number(7.1)],
            vec![CellValue::text("7"), CellValue::Number(0.0), CellValue::Number(7.0)],
            vec![CellValue::text("42"), CellValue::Number(1.0), CellValue::Number(6.9)],
        ];
        Dataset {
            table,
            sample: ColumnId(0),
            day: Some(ColumnId(1)),
            day_label: "Day".to_string(),
        }
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(5.0).to_string(), "5");
        assert_eq!(CellValue::Number(-3.0).to_string(), "-3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn rows_with_equal_cells_hash_equal() {
        let a = vec![CellValue::text("B-1"), CellValue::Number(1.5)];
        let b = a.clone();
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn equality_agrees_with_hash_for_odd_floats() {
        let nan = CellValue::Number(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(CellValue::Number(0.0), CellValue::Number(-0.0));

        let rows = [
            vec![CellValue::text("B-1"), nan.clone()],
            vec![CellValue::text("B-1"), nan],
        ];
        let set: HashSet<_> = rows.into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn samples_are_first_seen_order() {
        assert_eq!(dataset().samples(), vec!["42", "7"]);
    }

    #[test]
    fn value_is_keyed_by_sample_day_and_measurement() {
        let ds = dataset();
        assert_eq!(
            ds.value("42", &CellValue::Number(1.0), "pH (int.) [-]"),
            Some(&CellValue::Number(6.9))
        );
        assert_eq!(ds.value("42", &CellValue::Number(9.0), "pH (int.) [-]"), None);
        assert_eq!(ds.value("42", &CellValue::Number(1.0), "Titer [mg/L]"), None);
    }

    #[test]
    fn measurements_exclude_key_columns() {
        let ds = dataset();
        let labels: Vec<_> = ds.measurements().iter().map(|c| c.label.clone()).collect();
        assert_eq!(labels, vec!["pH (int.) [-]"]);
    }
}
