//! Flattening of nested JSON into path-labelled rows.
//!
//! Mapping keys are joined with `" - "`, sequence positions are appended as
//! `" [i]"` (1-based). Rows come out in document order, which relies on
//! `serde_json` preserving object insertion order.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::FlattenError;

/// Default limit on container nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Column name used for items that are scalars rather than objects.
pub const SCALAR_COLUMN: &str = "value";

/// A single scalar leaf and the route to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub path: String,
    pub value: Value,
}

impl FlatRow {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Items flattened into a table with a shared header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatTable {
    /// Union of flattened keys across all items, in first-seen order.
    pub headers: Vec<String>,
    /// One row per item, one cell per header.
    pub rows: Vec<Vec<Option<Value>>>,
}

impl FlatTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Flattener with a nesting guard.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    max_depth: usize,
}

impl Flattener {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum number of nested containers.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Flatten `value`, prefixing every path with `path_prefix`.
    pub fn flatten(&self, value: &Value, path_prefix: &str) -> Result<Vec<FlatRow>, FlattenError> {
        let mut rows = Vec::new();
        self.walk(value, path_prefix.to_string(), 0, &mut rows)?;
        Ok(rows)
    }

    fn walk(
        &self,
        value: &Value,
        path: String,
        depth: usize,
        rows: &mut Vec<FlatRow>,
    ) -> Result<(), FlattenError> {
        match value {
            Value::Object(map) => {
                self.check_depth(&path, depth)?;
                for (key, child) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{} - {}", path, key)
                    };
                    self.walk(child, child_path, depth + 1, rows)?;
                }
            }
            Value::Array(items) => {
                self.check_depth(&path, depth)?;
                for (idx, child) in items.iter().enumerate() {
                    self.walk(child, format!("{} [{}]", path, idx + 1), depth + 1, rows)?;
                }
            }
            scalar => rows.push(FlatRow::new(path, scalar.clone())),
        }
        Ok(())
    }

    fn check_depth(&self, path: &str, depth: usize) -> Result<(), FlattenError> {
        if depth >= self.max_depth {
            return Err(FlattenError::TooDeeplyNested {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Flatten each item in its own scope and align the results by key.
    pub fn flatten_table(&self, items: &[Value]) -> Result<FlatTable, FlattenError> {
        let mut headers: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut flattened = Vec::with_capacity(items.len());

        for item in items {
            let rows = self.flatten(item, "")?;
            for row in &rows {
                let key = column_name(&row.path);
                if !index.contains_key(key) {
                    index.insert(key.to_string(), headers.len());
                    headers.push(key.to_string());
                }
            }
            flattened.push(rows);
        }

        let rows = flattened
            .into_iter()
            .map(|item_rows| {
                let mut cells = vec![None; headers.len()];
                for row in item_rows {
                    let col = index[column_name(&row.path)];
                    cells[col] = Some(row.value);
                }
                cells
            })
            .collect();

        Ok(FlatTable { headers, rows })
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new()
    }
}

fn column_name(path: &str) -> &str {
    if path.is_empty() { SCALAR_COLUMN } else { path }
}

/// Flatten with an empty prefix and the default depth limit.
pub fn flatten(value: &Value) -> Result<Vec<FlatRow>, FlattenError> {
    Flattener::new().flatten(value, "")
}

/// Render a scalar for a spreadsheet cell: strings unquoted, null empty.
pub fn display_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_nested_example() {
        let rows = flatten(&json!({"a": 1, "b": {"c": 2, "d": [3, 4]}})).unwrap();
        assert_eq!(
            rows,
            vec![
                FlatRow::new("a", json!(1)),
                FlatRow::new("b - c", json!(2)),
                FlatRow::new("b - d [1]", json!(3)),
                FlatRow::new("b - d [2]", json!(4)),
            ]
        );
    }

    #[test]
    fn test_empty_containers() {
        assert!(flatten(&json!([])).unwrap().is_empty());
        assert!(flatten(&json!({})).unwrap().is_empty());
        assert!(flatten(&json!({"a": {}, "b": []})).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(flatten(&json!(null)).unwrap(), vec![FlatRow::new("", json!(null))]);
        assert_eq!(
            Flattener::new().flatten(&json!("x"), "root").unwrap(),
            vec![FlatRow::new("root", json!("x"))]
        );
    }

    #[test]
    fn test_insertion_order_kept() {
        let value: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let paths: Vec<String> = flatten(&value).unwrap().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_row_count_equals_leaf_count() {
        let value = json!({
            "items": [{"a": 1, "b": [true, false, null]}, {"a": 2}],
            "total": 3.5,
            "note": "ok"
        });
        assert_eq!(flatten(&value).unwrap().len(), 7);
    }

    #[test]
    fn test_prefix_and_root_list() {
        let rows = Flattener::new().flatten(&json!([{"x": 1}]), "items").unwrap();
        assert_eq!(rows, vec![FlatRow::new("items [1] - x", json!(1))]);

        let rows = flatten(&json!(["a"])).unwrap();
        assert_eq!(rows, vec![FlatRow::new(" [1]", json!("a"))]);
    }

    #[test]
    fn test_deterministic_on_flat_pairs() {
        let first = flatten(&json!({"a": 1, "b": {"c": [2, 3]}})).unwrap();
        let pairs = Value::Array(
            first
                .iter()
                .map(|r| json!([r.path.clone(), r.value.clone()]))
                .collect(),
        );

        let once = flatten(&pairs).unwrap();
        let twice = flatten(&pairs).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), first.len() * 2);
        assert_eq!(once[0], FlatRow::new(" [1] [1]", json!("a")));
        assert_eq!(once[1], FlatRow::new(" [1] [2]", json!(1)));
    }

    #[test]
    fn test_depth_guard() {
        let mut value = json!(1);
        for _ in 0..10 {
            value = json!([value]);
        }

        assert_eq!(Flattener::new().with_max_depth(10).flatten(&value, "").unwrap().len(), 1);

        let err = Flattener::new().with_max_depth(9).flatten(&value, "").unwrap_err();
        assert!(matches!(err, FlattenError::TooDeeplyNested { max_depth: 9, .. }));
    }

    #[test]
    fn test_default_depth_guard_on_pathological_input() {
        let mut value = json!({});
        for _ in 0..(DEFAULT_MAX_DEPTH + 5) {
            value = json!({"n": value});
        }
        assert!(flatten(&value).is_err());
    }

    #[test]
    fn test_flatten_table_union_of_keys() {
        let items = vec![
            json!({"description": "Pen", "quantity": 2}),
            json!({"description": "Ink", "unit": "box", "quantity": 1}),
            json!({"description": "Paper", "tags": ["a4"]}),
        ];

        let table = Flattener::new().flatten_table(&items).unwrap();
        assert_eq!(table.headers, vec!["description", "quantity", "unit", "tags [1]"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Some(json!("Pen")), Some(json!(2)), None, None],
                vec![Some(json!("Ink")), Some(json!(1)), Some(json!("box")), None],
                vec![Some(json!("Paper")), None, None, Some(json!("a4"))],
            ]
        );
    }

    #[test]
    fn test_flatten_table_scalar_items() {
        let table = Flattener::new().flatten_table(&[json!("free text"), json!({"a": 1})]).unwrap();
        assert_eq!(table.headers, vec![SCALAR_COLUMN, "a"]);
        assert_eq!(table.rows[0], vec![Some(json!("free text")), None]);
    }

    #[test]
    fn test_display_scalar() {
        assert_eq!(display_scalar(&json!(null)), "");
        assert_eq!(display_scalar(&json!("abc")), "abc");
        assert_eq!(display_scalar(&json!(12.5)), "12.5");
        assert_eq!(display_scalar(&json!(false)), "false");
    }
}
