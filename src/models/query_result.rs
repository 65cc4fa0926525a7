use crate::Error;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

/// Result of an analytics query: one or more tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    /// Result tables. Simple queries return a single `PrimaryResult` table.
    pub tables: Vec<Table>,
}

/// A result table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Column descriptions, in row order.
    pub columns: Vec<Column>,
    /// Rows, each holding one value per column.
    pub rows: Vec<Vec<Value>>,
}

/// A result column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Kusto type of the column, e.g. `string` or `long`.
    #[serde(rename = "type")]
    pub type_: String,
}

impl Table {
    /// Convert each row into a `T`, matching row values to fields by column name.
    ///
    /// ```
    /// use application_insights_client::Table;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct TargetTotal {
    ///     target: String,
    ///     total: i64,
    /// }
    ///
    /// let table: Table = serde_json::from_str(r#"{
    ///     "name": "PrimaryResult",
    ///     "columns": [{"name": "target", "type": "string"}, {"name": "total", "type": "long"}],
    ///     "rows": [["Door", 12]]
    /// }"#).unwrap();
    /// let rows: Vec<TargetTotal> = table.rows_as().unwrap();
    /// assert_eq!("Door", rows[0].target);
    /// assert_eq!(12, rows[0].total);
    /// ```
    pub fn rows_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|column| column.name.clone())
                    .zip(row.iter().cloned())
                    .collect();
                serde_json::from_value(Value::Object(record))
                    .map_err(Error::QueryDeserializeResponse)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct TargetTotal {
        target: String,
        total: i64,
    }

    fn table() -> Table {
        serde_json::from_value(serde_json::json!({
            "name": "PrimaryResult",
            "columns": [{"name": "target", "type": "string"}, {"name": "total", "type": "long"}],
            "rows": [["Door", 12], ["Window", 3]]
        }))
        .unwrap()
    }

    #[test]
    fn rows_by_column_name() {
        let rows: Vec<TargetTotal> = table().rows_as().unwrap();
        assert_eq!(
            vec![
                TargetTotal {
                    target: "Door".into(),
                    total: 12
                },
                TargetTotal {
                    target: "Window".into(),
                    total: 3
                },
            ],
            rows
        );
    }

    #[test]
    fn mismatched_row_type() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Wrong {
            total: String,
        }
        assert!(matches!(
            table().rows_as::<Wrong>(),
            Err(Error::QueryDeserializeResponse(_))
        ));
    }
}
