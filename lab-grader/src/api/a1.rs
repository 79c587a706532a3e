//! A1 notation helpers

/// Prefix a range with its worksheet name, e.g. `'Group 1'!D2:D`
///
/// The name is always quoted so worksheets with spaces or punctuation work;
/// embedded single quotes are doubled.
pub fn qualified_range(worksheet: &str, range: &str) -> String {
    format!("'{}'!{}", worksheet.replace('\'', "''"), range)
}
