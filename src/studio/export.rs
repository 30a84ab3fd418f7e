use crate::studio::display::DisplayTable;
use serde_json::Value;

/// Headers are always quoted, cells only when they hold a string.
///
/// ```
/// use sqlmate::studio::display::{deserialize_result, QueryResult, Row};
/// use sqlmate::studio::export::convert_to_csv;
///
/// let result = QueryResult {
///     columns: vec!["id".into(), "name".into()],
///     rows: vec![Row::Positional(vec![2.into(), "B,C".into()])],
///     ..Default::default()
/// };
/// let view = deserialize_result(&result);
///
/// assert_eq!(convert_to_csv(view.table().unwrap()), "\"id\",\"name\"\n2,\"B,C\"");
/// ```
pub fn convert_to_csv(table: &DisplayTable) -> String {
    let header = table
        .columns
        .iter()
        .map(|column| quote(column))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = vec![header];
    lines.extend(table.rows.iter().map(|row| {
        row.cells().map(cell).collect::<Vec<_>>().join(",")
    }));

    lines.join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => quote(text),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::display::{deserialize_result, QueryResult, Row};
    use serde_json::json;

    fn table(columns: &[&str], rows: Vec<Value>) -> DisplayTable {
        let result = QueryResult {
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: rows
                .into_iter()
                .map(|row| serde_json::from_value::<Row>(row).unwrap())
                .collect(),
            ..Default::default()
        };

        deserialize_result(&result).table().cloned().unwrap()
    }

    #[test]
    fn quotes_strings_and_headers() {
        let table = table(
            &["id", "name"],
            vec![json!({"id": 1, "name": "A"}), json!({"id": 2, "name": "B,C"})],
        );

        assert_eq!(convert_to_csv(&table), "\"id\",\"name\"\n1,\"A\"\n2,\"B,C\"");
    }

    #[test]
    fn doubles_quotes_and_blanks_nulls() {
        let table = table(
            &["say \"hi\"", "active", "note"],
            vec![json!([null, true, "he said \"no\""])],
        );

        assert_eq!(
            convert_to_csv(&table),
            "\"say \"\"hi\"\"\",\"active\",\"note\"\n,true,\"he said \"\"no\"\"\""
        );
    }

    #[test]
    fn a_table_without_rows_still_has_a_header() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "email".to_string()],
            ..Default::default()
        };

        assert_eq!(convert_to_csv(&DisplayTable::from(&result)), "\"id\",\"email\"");
    }
}
