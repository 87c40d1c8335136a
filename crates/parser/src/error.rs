use models::CatalogKind;

/// Error type returned by all parse operations. Structural errors carry
/// the file and the line the grammar gave up on.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{file}:{line}: OBJECT = {name} is never closed")]
    UnclosedObject { file: String, line: u32, name: String },

    #[error("{file}:{line}: END_OBJECT = {found} does not close OBJECT = {expected}")]
    MismatchedEnd {
        file: String,
        line: u32,
        expected: String,
        found: String,
    },

    #[error("{file}: {kind} is missing required sub-object {name}")]
    MissingSubObject {
        file: String,
        kind: CatalogKind,
        name: &'static str,
    },

    #[error("{file}:{line}: {kind} allows at most one {name} sub-object")]
    DuplicateSubObject {
        file: String,
        line: u32,
        kind: CatalogKind,
        name: String,
    },

    #[error("{file}: expected a root OBJECT = {expected} block")]
    MissingRootObject { file: String, expected: &'static str },

    #[error("{file}: no grammar recognizes this file (root object: {root})")]
    UnknownKind { file: String, root: String },
}

impl ParseError {
    pub(crate) fn syntax(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            file: file.to_string(),
            line,
            column,
            message: message.into(),
        }
    }
}
