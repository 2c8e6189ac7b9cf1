//! Structured field errors: a path into the document, the offending value, and
//! a human-readable detail.
//!
//! Validation never stops at the first problem. Every check appends to an
//! [`ErrorList`], and any non-empty list rejects the document.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Child(String),
    Index(usize),
    Key(String),
}

/// Dot/bracket path to a field, rendered like `spec.devices[0].basic.attributes[foo]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Child(name.into())],
        }
    }

    /// Build a path from a sequence of child names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: names
                .into_iter()
                .map(|n| PathSegment::Child(n.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        self.push(PathSegment::Child(name.into()))
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.push(PathSegment::Key(key.into()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Child(name) if i == 0 => f.write_str(name)?,
                PathSegment::Child(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Category of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Required,
    Invalid,
    TypeInvalid,
    Duplicate,
    TooMany,
    TooLong,
    Forbidden,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "Required value",
            Self::Invalid | Self::TypeInvalid => "Invalid value",
            Self::Duplicate => "Duplicate value",
            Self::TooMany => "Too many",
            Self::TooLong => "Too long",
            Self::Forbidden => "Forbidden",
        }
    }

    /// Whether the offending value is part of the rendered message.
    fn shows_value(self) -> bool {
        !matches!(self, Self::Required | Self::TooLong | Self::Forbidden)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub field: FieldPath,
    pub value: Value,
    pub detail: String,
}

impl FieldError {
    pub fn required(field: &FieldPath, detail: impl Into<String>) -> Self {
        Self::build(ErrorKind::Required, field, Value::Null, detail)
    }

    pub fn invalid(field: &FieldPath, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::build(ErrorKind::Invalid, field, value, detail)
    }

    pub fn type_invalid(
        field: &FieldPath,
        value: impl Into<Value>,
        detail: impl Into<String>,
    ) -> Self {
        Self::build(ErrorKind::TypeInvalid, field, value, detail)
    }

    pub fn duplicate(field: &FieldPath, value: impl Into<Value>) -> Self {
        Self::build(ErrorKind::Duplicate, field, value, "")
    }

    pub fn too_many(field: &FieldPath, actual: usize, max: usize) -> Self {
        Self::build(
            ErrorKind::TooMany,
            field,
            actual,
            format!("must have at most {max} items"),
        )
    }

    pub fn too_long(field: &FieldPath, value: impl Into<Value>, max: usize) -> Self {
        Self::build(
            ErrorKind::TooLong,
            field,
            value,
            format!("may not be more than {max} bytes"),
        )
    }

    pub fn forbidden(field: &FieldPath, detail: impl Into<String>) -> Self {
        Self::build(ErrorKind::Forbidden, field, Value::Null, detail)
    }

    fn build(
        kind: ErrorKind,
        field: &FieldPath,
        value: impl Into<Value>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.clone(),
            value: value.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)?;
        if self.kind.shows_value() {
            match &self.value {
                Value::String(s) => write!(f, ": {s:?}")?,
                other => write!(f, ": {other}")?,
            }
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered accumulation of field errors.
pub type ErrorList = Vec<FieldError>;

/// A rejected document, carrying every field error found.
#[derive(Debug, Clone, Error)]
#[error("{}", render_list(.0))]
pub struct ValidationError(pub ErrorList);

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

fn render_list(errors: &[FieldError]) -> String {
    match errors {
        [] => "no validation errors".to_owned(),
        [single] => single.to_string(),
        many => format!(
            "[{}]",
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
