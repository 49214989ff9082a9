//! The service interface implemented by check-in backends.

use http::StatusCode;
use turnstile_core::{RequestContext, UploadedFile};
use turnstile_middleware::{BoxFuture, Request, Response, ResponseExt};

use super::{CREATE_EVENT, SEND_INVITATIONS, UPLOAD_PARTICIPANTS};

/// One method per check-in operation.
///
/// Path parameters arrive already bound and typed. The request is passed
/// through untouched so implementations can read their own body, e.g. an
/// [`EventCreation`](super::EventCreation) for `create_event`.
pub trait CheckinApi: Send + Sync + 'static {
    /// `POST /accounts/{accountId}/events`
    fn create_event(
        &self,
        ctx: RequestContext,
        request: Request,
        account_id: i64,
    ) -> BoxFuture<'static, Response>;

    /// `POST /accounts/{accountId}/events/{eventId}/participants/upload`
    fn upload_participants(
        &self,
        ctx: RequestContext,
        request: Request,
        account_id: i64,
        event_id: i64,
        file: Option<UploadedFile>,
    ) -> BoxFuture<'static, Response>;

    /// `POST /accounts/{accountId}/events/{eventId}/sendInvitations`
    fn send_invitations(
        &self,
        ctx: RequestContext,
        request: Request,
        account_id: i64,
        event_id: i64,
    ) -> BoxFuture<'static, Response>;
}

/// Placeholder backend: answers `200` with the operation name as body.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCheckin;

fn stub(operation_id: &'static str) -> BoxFuture<'static, Response> {
    Box::pin(async move { Response::text(StatusCode::OK, operation_id) })
}

impl CheckinApi for StubCheckin {
    fn create_event(
        &self,
        _ctx: RequestContext,
        _request: Request,
        account_id: i64,
    ) -> BoxFuture<'static, Response> {
        tracing::debug!(account_id, "stub create_event");
        stub(CREATE_EVENT)
    }

    fn upload_participants(
        &self,
        _ctx: RequestContext,
        _request: Request,
        account_id: i64,
        event_id: i64,
        file: Option<UploadedFile>,
    ) -> BoxFuture<'static, Response> {
        tracing::debug!(
            account_id,
            event_id,
            file_size = file.as_ref().map(UploadedFile::len),
            "stub upload_participants"
        );
        stub(UPLOAD_PARTICIPANTS)
    }

    fn send_invitations(
        &self,
        _ctx: RequestContext,
        _request: Request,
        account_id: i64,
        event_id: i64,
    ) -> BoxFuture<'static, Response> {
        tracing::debug!(account_id, event_id, "stub send_invitations");
        stub(SEND_INVITATIONS)
    }
}
