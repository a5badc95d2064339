//! Editor form validation.
//!
//! Rules run independently per field and every violation is reported.
//! Within `title` and `description` the emptiness check runs before the
//! length check and a later rule overwrites an earlier one, so an over-long
//! whitespace title reports `TooLong`. The file check short-circuits: an
//! unsupported type is reported without looking at the size.
//!
//! Text length is measured in UTF-16 code units, the unit browser form
//! fields count in, so a character outside the BMP counts as two.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Description,
    File,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::File => "file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooLong,
    InvalidType,
    TooLarge,
}

impl FieldError {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooLong => "too_long",
            Self::InvalidType => "invalid_type",
            Self::TooLarge => "too_large",
        }
    }

    /// Operator-facing message for this error on `field`.
    #[must_use]
    pub fn message(self, field: Field) -> String {
        match (self, field) {
            (Self::Required, Field::Title) => "Title is required".into(),
            (Self::Required, Field::Description) => "Description is required".into(),
            (Self::TooLong, Field::Title) => format!("Title must be less than {MAX_TITLE_CHARS} characters"),
            (Self::TooLong, Field::Description) => {
                format!("Description must be less than {MAX_DESCRIPTION_CHARS} characters")
            }
            (Self::InvalidType, _) => "Please select a valid image file (JPEG, PNG, GIF, or WebP)".into(),
            (Self::TooLarge, _) => "File size must be less than 5MB".into(),
            (Self::Required | Self::TooLong, Field::File) => "Invalid file".into(),
        }
    }
}

/// Metadata of a candidate image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo<'a> {
    pub mime: &'a str,
    pub size: usize,
}

/// Field name → error for every field in violation. Empty iff creatable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    /// Record an error; a later call for the same field overwrites.
    pub fn set(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }
}

/// Serializes as `{ "title": { "code": "required", "message": "..." } }`.
impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            code: &'a str,
            message: String,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, error) in &self.0 {
            map.serialize_entry(field.as_str(), &Entry { code: error.code(), message: error.message(*field) })?;
        }
        map.end()
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Validate all editor fields at once.
#[must_use]
pub fn validate(title: &str, description: &str, file: Option<FileInfo<'_>>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, Field::Title, title, MAX_TITLE_CHARS);
    check_text(&mut errors, Field::Description, description, MAX_DESCRIPTION_CHARS);
    if let Some(file) = file {
        if let Err(err) = validate_file(file) {
            errors.set(Field::File, err);
        }
    }
    errors
}

/// Length of `value` as a browser form field counts it.
#[must_use]
pub fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}

fn check_text(errors: &mut FieldErrors, field: Field, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
        errors.set(field, FieldError::Required);
    }
    if text_length(value) > max_chars {
        errors.set(field, FieldError::TooLong);
    }
}

/// Check a single image file against the type and size limits.
///
/// # Errors
///
/// `InvalidType` for unsupported MIME types, otherwise `TooLarge` when the
/// size exceeds [`MAX_IMAGE_BYTES`].
pub fn validate_file(file: FileInfo<'_>) -> Result<(), FieldError> {
    if !is_allowed_image_type(file.mime) {
        return Err(FieldError::InvalidType);
    }
    if file.size > MAX_IMAGE_BYTES {
        return Err(FieldError::TooLarge);
    }
    Ok(())
}

/// MIME essence match, ignoring case and parameters (`image/PNG; q=1`).
#[must_use]
pub fn is_allowed_image_type(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES.contains(&essence.as_str())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
