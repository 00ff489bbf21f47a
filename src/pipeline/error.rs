use std::fmt;

use crate::pipeline::init::InitPhase;

/// Boxed error surfaced by a host decorator.
pub type DecoratorError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum MapperError {
    /// Decoration options or decorators missing, or an invalid config value
    Configuration(String),

    /// A root or target selector failed to parse
    InvalidSelector { selector: String, message: String },

    /// Root element absent where it is required (render phase)
    RootNotFound { selector: String, phase: InitPhase },

    /// Decoration exceeded its time budget
    Timeout { budget_ms: u64 },

    /// A decorator returned an error
    Decorator { index: usize, source: DecoratorError },

    /// Initializer driven from a terminal phase
    InvalidState(InitPhase),

    /// Session edit requested with no active element
    NoActiveElement,

    /// Malformed input to a structural path primitive
    Path(PathError),

    /// Reading or writing a file failed (CLI)
    Io { context: String, source: std::io::Error },

    /// JSON (de)serialization failed
    Json { context: String, source: serde_json::Error },
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::Configuration(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            MapperError::InvalidSelector { selector, message } => {
                write!(f, "Invalid selector '{}': {}", selector, message)
            }
            MapperError::RootNotFound { selector, phase } => {
                write!(f, "Root element '{}' not found during {:?}", selector, phase)
            }
            MapperError::Timeout { budget_ms } => {
                write!(f, "Rendering timed out after {} ms", budget_ms)
            }
            MapperError::Decorator { index, source } => {
                write!(f, "Decorator #{} failed: {}", index, source)
            }
            MapperError::InvalidState(phase) => {
                write!(f, "Initializer cannot run from phase {:?}", phase)
            }
            MapperError::NoActiveElement => {
                write!(f, "No active source element in this session")
            }
            MapperError::Path(err) => write!(f, "Structural path error: {}", err),
            MapperError::Io { context, source } => {
                write!(f, "I/O error ({}): {}", context, source)
            }
            MapperError::Json { context, source } => {
                write!(f, "JSON error ({}): {}", context, source)
            }
        }
    }
}

impl std::error::Error for MapperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapperError::Decorator { source, .. } => Some(source.as_ref()),
            MapperError::Path(err) => Some(err),
            MapperError::Io { source, .. } => Some(source),
            MapperError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl MapperError {
    /// True for the timeout-specific failure of the render phase.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MapperError::Timeout { .. })
    }
}

impl From<PathError> for MapperError {
    fn from(err: PathError) -> Self {
        MapperError::Path(err)
    }
}

/// Misuse of the structural path primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The element does not sit under the given root
    NotDescendant { tag: String },

    /// A serialized path key could not be decoded
    MalformedKey { key: String, message: String },

    /// A decoded step carries an empty tag
    EmptyTag { position: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::NotDescendant { tag } => {
                write!(f, "<{}> is not a descendant of the root element", tag)
            }
            PathError::MalformedKey { key, message } => {
                write!(f, "Malformed path key '{}': {}", key, message)
            }
            PathError::EmptyTag { position } => {
                write!(f, "Path step {} has an empty tag", position)
            }
        }
    }
}

impl std::error::Error for PathError {}
