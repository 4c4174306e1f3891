//! Post-processing applied to every fetched window before rows are exposed,
//! e.g. type coercion or filling in association data.

use model::records::row::RowData;
use std::sync::Arc;

pub trait RowTransform: Send + Sync {
    fn apply(&self, row: RowData) -> RowData;
}

/// An ordered set of transform steps applied to each row of a window.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    steps: Vec<Arc<dyn RowTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        TransformPipeline { steps: Vec::new() }
    }

    pub fn add_step(&mut self, step: Arc<dyn RowTransform>) {
        self.steps.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, row: RowData) -> RowData {
        self.steps
            .iter()
            .fold(row, |row, step| step.apply(row))
    }

    pub fn apply_all(&self, rows: Vec<RowData>) -> Vec<RowData> {
        if self.steps.is_empty() {
            return rows;
        }
        rows.into_iter().map(|row| self.apply(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    struct Upper(&'static str);

    impl RowTransform for Upper {
        fn apply(&self, mut row: RowData) -> RowData {
            if let Value::String(s) = row.get_value(self.0) {
                row.set_value(self.0, Value::String(s.to_uppercase()));
            }
            row
        }
    }

    #[test]
    fn steps_apply_in_order() {
        let mut pipeline = TransformPipeline::new();
        pipeline.add_step(Arc::new(Upper("name")));

        let rows = vec![RowData::from_pairs(
            "users",
            vec![("name", Value::String("ada".into()))],
        )];
        let out = pipeline.apply_all(rows);
        assert_eq!(out[0].get_value("name"), Value::String("ADA".into()));
    }
}
