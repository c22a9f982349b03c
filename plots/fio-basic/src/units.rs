use common::{
    config::Unit,
    record::{AggregateRow, AggregateTable, Column},
};

/// Copy of `table` with `column` divided by the unit's divisor. Key columns are left as is.
pub fn normalize(table: &[AggregateRow], column: Column, unit: Unit) -> AggregateTable {
    let divisor = unit.divisor();
    table
        .iter()
        .cloned()
        .map(|mut row| {
            if let Some(value) = column.metric_mut(&mut row) {
                *value /= divisor;
            }
            row
        })
        .collect()
}
