use crate::models::filter::{Availability, Filter, FilterRegistry};

/// PNG file signature (`\x89PNG\r\n\x1a\n`).
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

/// A submission that passed every intake check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub image: Vec<u8>,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing image")]
    MissingImage,

    #[error("file is not a PNG image")]
    InvalidImage,

    #[error("missing filter parameter")]
    MissingFilter,

    #[error("invalid filter: {0}")]
    UnknownFilter(String),

    #[error("filter {0} is currently disabled")]
    DisabledFilter(Filter),
}

impl ValidationError {
    /// Stable code for metrics labels and error bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingImage => "missing_image",
            ValidationError::InvalidImage => "invalid_image",
            ValidationError::MissingFilter => "missing_filter",
            ValidationError::UnknownFilter(_) => "unknown_filter",
            ValidationError::DisabledFilter(_) => "disabled_filter",
        }
    }
}

/// Only the signature is checked; decoding is left to the workers.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Decide whether an upload may become a job.
///
/// The image is checked before the filter, so a request that is wrong on
/// both counts reports the image problem.
pub fn validate_submission(
    registry: &FilterRegistry,
    image: Option<Vec<u8>>,
    filter: Option<&str>,
) -> Result<ValidatedSubmission, ValidationError> {
    let image = image.ok_or(ValidationError::MissingImage)?;
    if !is_png(&image) {
        return Err(ValidationError::InvalidImage);
    }

    let filter = resolve_filter(registry, filter)?;
    Ok(ValidatedSubmission { image, filter })
}

fn resolve_filter(registry: &FilterRegistry, name: Option<&str>) -> Result<Filter, ValidationError> {
    let name = match name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ValidationError::MissingFilter),
    };

    match registry.lookup(name) {
        Some((filter, Availability::Enabled)) => Ok(filter),
        Some((filter, Availability::Disabled)) => Err(ValidationError::DisabledFilter(filter)),
        None => Err(ValidationError::UnknownFilter(name.to_string())),
    }
}
