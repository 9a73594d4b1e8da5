// ABOUTME: Small helpers for terminal-safe display of identifiers
// ABOUTME: Used by the export flow when printing progress and failures

/// Sanitize an identifier (table name, database name) for display
///
/// Removes control characters and limits length so that odd table names
/// cannot garble the terminal or log lines.
///
/// **Note**: This is for display purposes only. Queries quote identifiers or
/// bind them as parameters.
///
/// # Examples
///
/// ```
/// # use table_ddl_exporter::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x00name"), "tablename");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
///
/// // Length limit
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
