//! The per-route binder.
//!
//! A [`Binder`] owns an operation's descriptors in binding order (path,
//! query, header, cookie, multipart; declaration order within a location)
//! and turns an [`ExtractionContext`] into [`BoundParams`]. Binding stops
//! at the first failure.

use turnstile_core::{
    BindingError, BoundParams, BoundValue, CancellationToken, ParameterDescriptor,
    ParameterLocation,
};

use crate::cookie::{bind_cookie, Cookies};
use crate::multipart::{read_file_parts, FileParts, MultipartConfig};
use crate::query::bind_query;
use crate::style::{decode_delimited, decode_path_component};
use crate::{BindAbort, ExtractionContext};

/// Binds the declared parameters of one operation.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::{Binder, ExtractionContext};
/// use turnstile_core::{CancellationToken, ParamType, ParameterDescriptor};
/// use turnstile_router::Params;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let binder = Binder::new([
///     ParameterDescriptor::query("page", ParamType::INTEGER),
///     ParameterDescriptor::path("accountId", ParamType::INTEGER),
/// ]);
///
/// let mut captures = Params::new();
/// captures.push("accountId", "42");
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/accounts/42/events?page=2"),
///     HeaderMap::new(),
///     Bytes::new(),
///     captures,
/// );
///
/// let bound = binder.bind(&ctx, &CancellationToken::new()).await.unwrap();
/// assert_eq!(bound.extract::<i64>("accountId").unwrap(), 42);
/// assert_eq!(bound.extract::<i64>("page").unwrap(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    descriptors: Vec<ParameterDescriptor>,
    query_names: Vec<String>,
    file_names: Vec<String>,
    multipart: MultipartConfig,
}

impl Binder {
    /// Creates a binder, ordering descriptors by location.
    pub fn new(descriptors: impl IntoIterator<Item = ParameterDescriptor>) -> Self {
        let mut descriptors: Vec<_> = descriptors.into_iter().collect();
        descriptors.sort_by_key(ParameterDescriptor::location);

        let names_in = |loc: ParameterLocation| {
            descriptors
                .iter()
                .filter(|d| d.location() == loc)
                .map(|d| d.name().to_string())
                .collect::<Vec<_>>()
        };
        let query_names = names_in(ParameterLocation::Query);
        let file_names = names_in(ParameterLocation::Multipart);

        Self {
            descriptors,
            query_names,
            file_names,
            multipart: MultipartConfig::default(),
        }
    }

    /// Sets the limits used when reading multipart bodies.
    #[must_use]
    pub fn with_multipart_config(mut self, config: MultipartConfig) -> Self {
        self.multipart = config;
        self
    }

    /// Descriptors in binding order.
    #[must_use]
    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    /// Binds every descriptor against the request.
    ///
    /// Absent optional parameters are left out of the result. Cancellation
    /// is observed while the multipart body is read.
    ///
    /// # Errors
    ///
    /// Returns [`BindAbort::Invalid`] with the first parameter that failed,
    /// or [`BindAbort::Cancelled`] if `cancel` fired first.
    pub async fn bind(
        &self,
        ctx: &ExtractionContext,
        cancel: &CancellationToken,
    ) -> Result<BoundParams, BindAbort> {
        if cancel.is_cancelled() {
            return Err(BindAbort::Cancelled);
        }

        let query_names: Vec<&str> = self.query_names.iter().map(String::as_str).collect();
        let mut cookies: Option<Cookies> = None;
        let mut files: Option<FileParts> = None;
        let mut bound = BoundParams::new();

        for d in &self.descriptors {
            let value = match d.location() {
                ParameterLocation::Path => bind_path(d, ctx)?,
                ParameterLocation::Query => bind_query(d, ctx, &query_names)?,
                ParameterLocation::Header => bind_header(d, ctx)?,
                ParameterLocation::Cookie => {
                    let cookies = cookies.get_or_insert_with(|| Cookies::from_headers(ctx.headers()));
                    bind_cookie(d, cookies)?
                }
                ParameterLocation::Multipart => {
                    if files.is_none() {
                        files = Some(self.read_files(d, ctx, cancel).await?);
                    }
                    take_file(d, files.as_mut())?
                }
            };

            match value {
                Some(value) => bound.insert(d.name(), d.location(), value),
                None if d.is_required() => {
                    return Err(BindingError::required(d.location(), d.name()).into());
                }
                None => {}
            }
        }

        tracing::trace!(bound = bound.len(), "parameters bound");
        Ok(bound)
    }

    async fn read_files(
        &self,
        first: &ParameterDescriptor,
        ctx: &ExtractionContext,
        cancel: &CancellationToken,
    ) -> Result<FileParts, BindAbort> {
        let wanted: Vec<&str> = self.file_names.iter().map(String::as_str).collect();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BindAbort::Cancelled),
            parts = read_file_parts(ctx, &wanted, first, &self.multipart) => Ok(parts?),
        }
    }
}

/// Binds a single descriptor.
///
/// Returns `Ok(None)` when an optional parameter is absent.
///
/// # Errors
///
/// Same as [`Binder::bind`].
pub async fn bind_parameter(
    d: &ParameterDescriptor,
    ctx: &ExtractionContext,
    cancel: &CancellationToken,
) -> Result<Option<BoundValue>, BindAbort> {
    let bound = Binder::new([d.clone()]).bind(ctx, cancel).await?;
    Ok(bound.get(d.name()).cloned())
}

fn bind_path(
    d: &ParameterDescriptor,
    ctx: &ExtractionContext,
) -> Result<Option<BoundValue>, BindingError> {
    ctx.path_params()
        .get_raw(d.name())
        .map(|raw| decode_path_component(d, raw))
        .transpose()
}

/// Array and object headers may arrive on several lines; they're joined
/// with `,`.
fn bind_header(
    d: &ParameterDescriptor,
    ctx: &ExtractionContext,
) -> Result<Option<BoundValue>, BindingError> {
    let lines = ctx
        .headers()
        .get_all(d.name())
        .iter()
        .map(|v| {
            v.to_str().map_err(|_| {
                BindingError::invalid_format(d.location(), d.name(), "header value is not valid UTF-8")
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    match lines.as_slice() {
        [] => Ok(None),
        [raw] => decode_delimited(d, raw).map(Some),
        many if d.ty().is_single_valued() => {
            Err(BindingError::too_many_values(d.location(), d.name(), many.len()))
        }
        many => decode_delimited(d, &many.join(",")).map(Some),
    }
}

fn take_file(
    d: &ParameterDescriptor,
    files: Option<&mut FileParts>,
) -> Result<Option<BoundValue>, BindingError> {
    let Some(mut parts) = files.and_then(|f| f.remove(d.name())) else {
        return Ok(None);
    };
    if parts.len() > 1 {
        return Err(BindingError::too_many_values(d.location(), d.name(), parts.len()));
    }
    Ok(parts.pop().map(BoundValue::File))
}
