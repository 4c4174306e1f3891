use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One row fetched from a relational source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    /// Convenience constructor for executors and tests.
    pub fn from_pairs(entity: &str, pairs: Vec<(&str, Value)>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values: pairs
                .into_iter()
                .map(|(name, value)| FieldValue::new(name, value))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set_value(&mut self, field: &str, value: Value) {
        match self
            .field_values
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field))
        {
            Some(existing) => existing.value = Some(value),
            None => self.field_values.push(FieldValue::new(field, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let row = RowData::from_pairs("users", vec![("Id", Value::Int(7))]);
        assert_eq!(row.get_value("id"), Value::Int(7));
        assert_eq!(row.get_value("missing"), Value::Null);
    }

    #[test]
    fn set_value_overwrites_or_appends() {
        let mut row = RowData::from_pairs("users", vec![("id", Value::Int(1))]);
        row.set_value("id", Value::Int(2));
        row.set_value("name", Value::String("a".into()));
        assert_eq!(row.get_value("id"), Value::Int(2));
        assert_eq!(row.get_value("name"), Value::String("a".into()));
        assert_eq!(row.field_values.len(), 2);
    }
}
