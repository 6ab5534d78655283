//! Annotation tokens of the audit domain.

use weft_core::annotation::AnnotationRef;

const GROUP: &str = "audit";

/// Classes whose construction is logged and that get a `describe` method.
#[must_use]
pub fn entity() -> AnnotationRef {
    AnnotationRef::new(GROUP, "Entity")
}

/// Methods whose calls and failures are logged.
#[must_use]
pub fn logged() -> AnnotationRef {
    AnnotationRef::new(GROUP, "Logged")
}

/// Properties whose writes are recorded.
#[must_use]
pub fn audited() -> AnnotationRef {
    AnnotationRef::new(GROUP, "Audited")
}

/// Numeric parameters that must be greater than zero.
#[must_use]
pub fn positive() -> AnnotationRef {
    AnnotationRef::new(GROUP, "Positive")
}

/// String parameters that must contain a non-whitespace character.
#[must_use]
pub fn not_blank() -> AnnotationRef {
    AnnotationRef::new(GROUP, "NotBlank")
}
