//! SQL builders for multi-row inserts.

/// Builds a multi-row INSERT statement with one placeholder group per row.
///
/// # Arguments
///
/// * `table_name` - Name of the table to insert into
/// * `columns` - Column names in bind order
/// * `row_count` - Number of rows to insert
/// * `trailing_clause` - Optional clause appended verbatim (e.g. `RETURNING *`)
///
/// # Example
///
/// ```rust,ignore
/// let query = build_batch_insert_query("watchlists", &["user_id", "ticker"], 2, Some("RETURNING *"));
/// // INSERT INTO watchlists (user_id, ticker) VALUES (?, ?), (?, ?) RETURNING *
/// ```
pub(crate) fn build_batch_insert_query(
    table_name: &str,
    columns: &[&str],
    row_count: usize,
    trailing_clause: Option<&str>,
) -> String {
    if row_count == 0 || columns.is_empty() {
        return String::new();
    }

    let placeholder = format!(
        "({})",
        (0..columns.len()).map(|_| "?").collect::<Vec<_>>().join(", ")
    );
    let placeholders: Vec<String> = (0..row_count).map(|_| placeholder.clone()).collect();

    let mut query = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table_name,
        columns.join(", "),
        placeholders.join(", ")
    );

    if let Some(clause) = trailing_clause {
        query.push(' ');
        query.push_str(clause);
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_batch_insert_query_single_row() {
        assert_eq!(
            build_batch_insert_query("watchlists", &["user_id", "ticker"], 1, None),
            "INSERT INTO watchlists (user_id, ticker) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_build_batch_insert_query_multiple_rows_with_returning() {
        assert_eq!(
            build_batch_insert_query("t", &["a", "b", "c"], 3, Some("RETURNING *")),
            "INSERT INTO t (a, b, c) VALUES (?, ?, ?), (?, ?, ?), (?, ?, ?) RETURNING *"
        );
    }

    #[test]
    fn test_build_batch_insert_query_empty() {
        assert_eq!(build_batch_insert_query("t", &["a"], 0, None), "");
        assert_eq!(build_batch_insert_query("t", &[], 2, None), "");
    }
}
