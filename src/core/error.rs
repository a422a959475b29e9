use std::error::Error as StdError;
use std::fmt;

use crate::core::trace::{self, TraceItem};
use crate::core::types::Type;
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// No handler claims the target type.
    TypeSupport,
    /// The runtime shape of the value cannot fit the target shape.
    TypeMismatch,
    /// The shape fits but the content was rejected.
    Value,
    /// Mapping access was required and unavailable.
    Attribute,
    /// Forward-reference resolution is disabled for the loader.
    UnresolvedReference,
    /// More than one union alternative accepted the value.
    AmbiguousUnion,
    /// Input text was not valid JSON.
    Parse,
    /// A handler broke the loading contract by returning a parse failure.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    value: Option<Value>,
    ty: Option<Type>,
    trace: Vec<TraceItem>,
    causes: Vec<Error>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            value: None,
            ty: None,
            trace: Vec::new(),
            causes: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// True for the kinds that describe a type problem rather than a content problem.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TypeSupport | ErrorKind::TypeMismatch | ErrorKind::AmbiguousUnion
        )
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Breadcrumbs from the root type down to the failure site.
    pub fn trace(&self) -> &[TraceItem] {
        &self.trace
    }

    /// Per-alternative failures collected by union and enum loading.
    pub fn causes(&self) -> &[Error] {
        &self.causes
    }

    /// Rendered location of the failure, e.g. `.students[1]`.
    pub fn path(&self) -> String {
        trace::render_path(&self.trace)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_causes(mut self, causes: Vec<Error>) -> Self {
        self.causes = causes;
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Prepends a trace entry; existing entries keep their order.
    pub(crate) fn with_trace_front(mut self, item: TraceItem) -> Self {
        self.trace.insert(0, item);
        self
    }

    pub(crate) fn fill_context(mut self, value: &Value, ty: &Type) -> Self {
        if self.value.is_none() {
            self.value = Some(value.clone());
        }
        if self.ty.is_none() {
            self.ty = Some(ty.clone());
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if !self.trace.is_empty() {
            let path = self.path();
            if !path.is_empty() {
                write!(f, " (path: {path})")?;
            }
        }
        if !self.causes.is_empty() {
            write!(f, " (causes: {})", self.causes.len())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

/// Failure reported by a record constructor or a string parser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConstructError {
    /// Arguments did not fit the constructor (missing, unexpected, wrong shape).
    Shape(String),
    /// Arguments fit but the constructor rejected their content.
    Rejected(String),
}

impl ConstructError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Shape(_) => ErrorKind::TypeMismatch,
            Self::Rejected(_) => ErrorKind::Value,
        }
    }

    pub fn into_error(self) -> Error {
        let kind = self.kind();
        let message = match self {
            Self::Shape(message) | Self::Rejected(message) => message,
        };
        Error::new(kind).with_message(message)
    }
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(message) | Self::Rejected(message) => write!(f, "{message}"),
        }
    }
}

impl StdError for ConstructError {}

impl From<ConstructError> for Error {
    fn from(err: ConstructError) -> Self {
        err.into_error()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstructError, Error, ErrorKind};
    use crate::core::trace::{Annotation, TraceItem};
    use crate::core::types::Type;
    use crate::core::value::Value;

    #[test]
    fn construct_error_kind_mapping_is_stable() {
        let cases = [
            (ConstructError::Shape("x".into()), ErrorKind::TypeMismatch),
            (ConstructError::Rejected("x".into()), ErrorKind::Value),
        ];

        for (err, kind) in cases {
            assert_eq!(err.into_error().kind(), kind);
        }
    }

    #[test]
    fn trace_is_prepended_root_first() {
        let err = Error::new(ErrorKind::Value)
            .with_message("bad")
            .with_trace_front(TraceItem::new(
                Value::Int(3),
                Type::int(),
                Some(Annotation::Index(1)),
            ))
            .with_trace_front(TraceItem::new(
                Value::Null,
                Type::list(Type::int()),
                Some(Annotation::Field("students".into())),
            ))
            .with_trace_front(TraceItem::new(Value::Null, Type::Any, None));

        assert_eq!(err.trace().len(), 3);
        assert_eq!(err.trace()[0].annotation, None);
        assert_eq!(err.path(), ".students[1]");
        assert_eq!(err.to_string(), "Value: bad (path: .students[1])");
    }

    #[test]
    fn type_error_grouping() {
        assert!(Error::new(ErrorKind::AmbiguousUnion).is_type_error());
        assert!(Error::new(ErrorKind::TypeSupport).is_type_error());
        assert!(!Error::new(ErrorKind::Attribute).is_type_error());
        assert!(!Error::new(ErrorKind::Internal).is_type_error());
    }
}
