//! Textual rendering of cells for persistence layers.
//!
//! # Invariants
//! - Names are resolved through the live vocabulary at render time, so a
//!   renamed element shows up in the next record without touching any value.
//! - Empty slots render as the slot placeholder `<argname>`.

use super::database::Database;
use super::DbResult;
use crate::model::cell::DataCell;
use crate::model::matrix::Matrix;
use crate::model::time::TimeStamp;
use crate::model::value::DataValue;
use crate::model::vocab::FormalArgument;
use serde::Serialize;

/// One cell flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub column: String,
    pub onset: TimeStamp,
    pub offset: TimeStamp,
    /// Matrix rendered as `(v1, v2, ...)`.
    pub values: String,
}

impl Database {
    pub fn cell_record(&self, cell: &DataCell) -> DbResult<CellRecord> {
        let column = self.column(cell.column_id())?;
        let element = self.vocab_entry(column.vocab_id())?;
        Ok(CellRecord {
            column: element.name().to_string(),
            onset: cell.onset(),
            offset: cell.offset(),
            values: self.render_matrix(cell.matrix())?,
        })
    }

    /// Renders `matrix` as `(v1, v2, ...)` against the live vocabulary.
    pub fn render_matrix(&self, matrix: &Matrix) -> DbResult<String> {
        let element = self.get_vocab_element(matrix.vocab_id())?;
        let mut parts = Vec::with_capacity(matrix.len());
        for (arg, value) in element.formal_args().iter().zip(matrix.values()) {
            parts.push(self.render_value(arg, value)?);
        }
        Ok(format!("({})", parts.join(", ")))
    }

    /// Renders one slot value; `arg` supplies the placeholder name.
    pub fn render_value(&self, arg: &FormalArgument, value: &DataValue) -> DbResult<String> {
        if value.is_empty() {
            return Ok(arg.placeholder());
        }
        let rendered = match value {
            DataValue::Text(text) => quote(text),
            DataValue::Nominal(nominal) => nominal.clone(),
            DataValue::Integer(number) => number.to_string(),
            DataValue::Float(number) => render_float(*number),
            DataValue::TimeStamp(ts) => ts.to_string(),
            DataValue::Predicate(predicate) => {
                let element = self.predicate_target(predicate.pve_id())?;
                format!("{}{}", element.name(), self.render_matrix(predicate.args())?)
            }
            DataValue::Undefined => arg.placeholder(),
        };
        Ok(rendered)
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn render_float(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 {
        format!("{number:.1}")
    } else {
        number.to_string()
    }
}
