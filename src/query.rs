//! Builder for the `q` parameter of `files.list`.
//!
//! Values are always quoted and escaped, so a name such as `Bob's files`
//! cannot break out of its string literal.

use crate::models::FOLDER_MIME_TYPE;

/// Conjunction of Drive search clauses.
#[derive(Debug, Clone, Default)]
pub struct DriveQuery {
    clauses: Vec<String>,
}

impl DriveQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name = 'value'`
    pub fn name_eq(mut self, value: &str) -> Self {
        self.clauses.push(format!("name = {}", quote(value)));
        self
    }

    /// `mimeType = 'value'`
    pub fn mime_type_eq(mut self, value: &str) -> Self {
        self.clauses.push(format!("mimeType = {}", quote(value)));
        self
    }

    /// Only folders.
    pub fn folders_only(self) -> Self {
        self.mime_type_eq(FOLDER_MIME_TYPE)
    }

    /// `'parent_id' in parents`
    pub fn in_parent(mut self, parent_id: &str) -> Self {
        self.clauses.push(format!("{} in parents", quote(parent_id)));
        self
    }

    pub fn build(&self) -> String {
        self.clauses.join(" and ")
    }
}

/// Quote a string literal for the Drive query language.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query() {
        assert!(DriveQuery::new().build().is_empty());
    }

    #[test]
    fn folder_by_name() {
        let q = DriveQuery::new().folders_only().name_eq("Backups").build();
        assert_eq!(
            q,
            "mimeType = 'application/vnd.google-apps.folder' and name = 'Backups'"
        );
    }

    #[test]
    fn children_of_folder() {
        let q = DriveQuery::new().in_parent("1abcXYZ").build();
        assert_eq!(q, "'1abcXYZ' in parents");
    }

    #[test]
    fn escape_single_quotes() {
        let q = DriveQuery::new().name_eq("Bob's files").build();
        assert_eq!(q, r"name = 'Bob\'s files'");
    }

    #[test]
    fn escape_backslash_before_quote() {
        assert_eq!(quote(r"a\'b"), r"'a\\\'b'");
        assert_eq!(quote(r"trailing\"), r"'trailing\\'");
    }
}
