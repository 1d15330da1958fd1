//! Structured error types for reportgen.
//!
//! Three families cover the real error sources: malformed attribute values
//! ([`ParseError`]), documents that cannot be resolved ([`ValidationError`]),
//! and failures reported by the drawing surface (`Error::Render`). Errors are
//! wrapped with positional context as they travel up the tree, so the final
//! message reads like a breadcrumb: `page 2: cell 0: attribute `font-color`: ...`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The unified error type returned by all public reportgen API functions.
#[derive(Debug, Error)]
pub enum Error {
    /// A color, dimension or enum token could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The document is structurally invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The drawing surface rejected an operation.
    #[error("render error: {0}")]
    Render(String),

    /// A font could not be loaded or decoded.
    #[error("font error: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Json {
        source: serde_json::Error,
        hint: String,
    },

    /// An error with a breadcrumb describing where it happened.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl Error {
    /// Wrap this error with a piece of positional context.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every breadcrumb peeled off.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the validation error at the root of this error, if any.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self.root() {
            Error::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the parse error at the root of this error, if any.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self.root() {
            Error::Parse(p) => Some(p),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check field names and value formats.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        Error::Json { source: e, hint }
    }
}

/// Attaches breadcrumbs to fallible results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().context(f()))
    }
}

/// A malformed value: always carries what was being parsed and the raw input.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {kind} `{input}`: {reason}")]
pub struct ParseError {
    pub kind: &'static str,
    pub input: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(kind: &'static str, input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// A document that cannot be resolved as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document needs at least one page")]
    NoPages,

    #[error("`%` unit cannot be used as the document display unit")]
    PercentDisplayUnit,

    #[error("unknown style `{0}`: style does not exist")]
    UnknownStyle(String),

    #[error("unsupported attribute `{0}`")]
    UnsupportedAttribute(String),

    #[error("attribute `{attribute}` cannot be applied to a {target}")]
    NotApplicable {
        attribute: String,
        target: &'static str,
    },

    #[error("font file `{path}` exceeds {limit} bytes")]
    FontTooLarge { path: String, limit: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builds_a_breadcrumb() {
        let err = Error::from(ValidationError::UnknownStyle("centered".into()))
            .context("cell 0")
            .context("page 1");
        assert_eq!(
            err.to_string(),
            "page 1: cell 0: unknown style `centered`: style does not exist"
        );
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::UnknownStyle("centered".into()))
        );
    }

    #[test]
    fn result_ext_wraps_parse_errors() {
        let r: std::result::Result<(), ParseError> =
            Err(ParseError::new("color", "zz", "not hex"));
        let err = r.context("attribute `font-color`").unwrap_err();
        assert!(err.to_string().starts_with("attribute `font-color`: invalid color `zz`"));
        assert!(err.as_parse().is_some());
    }

    #[test]
    fn json_errors_carry_a_hint() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{\"a\": 1,")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("Hint:"));
    }
}
