use miette::Diagnostic;

/// Errors reported when a resolve request cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("catalog contains no delimiter kinds")]
    EmptyCatalog,
    #[error("target kind {0} is not in the catalog")]
    UnknownTargetKind(usize),
    #[error("cursor ({line}, {column}) is outside the document")]
    InvalidCursor { line: usize, column: usize },
}

impl Diagnostic for ResolveError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self {
            ResolveError::EmptyCatalog => "ResolveError::EmptyCatalog",
            ResolveError::UnknownTargetKind(_) => "ResolveError::UnknownTargetKind",
            ResolveError::InvalidCursor { .. } => "ResolveError::InvalidCursor",
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match self {
            ResolveError::EmptyCatalog => {
                "Register at least one delimiter kind before resolving.".to_string()
            }
            ResolveError::UnknownTargetKind(id) => {
                format!("No kind with id {id} exists. Use an id returned by the catalog.")
            }
            ResolveError::InvalidCursor { line, column } => {
                format!(
                    "Line {line}, byte column {column} must point at a character boundary within the document."
                )
            }
        };

        Some(Box::new(msg))
    }
}
