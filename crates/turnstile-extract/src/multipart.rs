//! Multipart file binding.
//!
//! File parameters are parts of a `multipart/form-data` body whose field
//! name matches the descriptor. The body is parsed once per request with
//! `multer`, collecting only the fields some descriptor asks for.

use std::collections::HashMap;
use std::io;

use http::header;
use turnstile_core::{BindingError, ParameterDescriptor, UploadedFile};

use crate::ExtractionContext;

/// Default maximum size per field (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of parts read from one body.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while reading multipart bodies.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Files found in the body, grouped by field name.
pub(crate) type FileParts = HashMap<String, Vec<UploadedFile>>;

/// Reads every part named in `wanted` from the request body.
///
/// A body that isn't `multipart/form-data` yields no parts, so the file
/// parameters are simply absent. Failures are attributed to `first`, the
/// first file descriptor in binding order.
pub(crate) async fn read_file_parts(
    ctx: &ExtractionContext,
    wanted: &[&str],
    first: &ParameterDescriptor,
    config: &MultipartConfig,
) -> Result<FileParts, BindingError> {
    let invalid = |detail: String| BindingError::invalid_format(first.location(), first.name(), detail);
    let mut parts = FileParts::new();

    let Some(content_type) = ctx.headers().get(header::CONTENT_TYPE) else {
        return Ok(parts);
    };
    let content_type = content_type
        .to_str()
        .map_err(|_| invalid("Content-Type header is not valid UTF-8".to_string()))?;
    let is_multipart = content_type
        .parse::<mime::Mime>()
        .is_ok_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA);
    if !is_multipart {
        return Ok(parts);
    }

    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| invalid(format!("missing or invalid multipart boundary: {e}")))?;

    let body = ctx.body().clone();
    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut field_count = 0;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid(format!("malformed multipart body: {e}")))?
    {
        field_count += 1;
        if field_count > config.max_fields {
            return Err(invalid(format!(
                "too many multipart fields (max {})",
                config.max_fields
            )));
        }

        let Some(name) = field.name().filter(|n| wanted.contains(n)).map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| invalid(format!("failed to read field {name}: {e}")))?;
        if data.len() > config.max_field_size {
            return Err(invalid(format!(
                "field {name} is {} bytes, max {}",
                data.len(),
                config.max_field_size
            )));
        }

        tracing::trace!(field = %name, bytes = data.len(), "read multipart file part");
        parts
            .entry(name)
            .or_default()
            .push(UploadedFile::new(file_name, part_type, data));
    }

    Ok(parts)
}
