//! The QR-code check-in API.
//!
//! Three operations, all `POST` and all guarded by `bearerAuth` with no
//! scopes:
//!
//! | Operation | Path |
//! |-----------|------|
//! | `CreateEvent` | `/accounts/{accountId}/events` |
//! | `UploadParticipants` | `/accounts/{accountId}/events/{eventId}/participants/upload` |
//! | `SendInvitations` | `/accounts/{accountId}/events/{eventId}/sendInvitations` |
//!
//! ```rust
//! use turnstile::checkin::{self, StubCheckin};
//! use turnstile::server::Dispatcher;
//!
//! let dispatcher = checkin::register_checkin(
//!     Dispatcher::builder(checkin::contract()),
//!     StubCheckin,
//! )
//! .build()
//! .unwrap();
//! assert_eq!(dispatcher.routes().len(), 3);
//! ```

mod api;
mod models;

use std::sync::Arc;

use http::Method;
use turnstile_core::{
    Contract, OperationSpec, ParamType, ParameterDescriptor, RequestContext, SecurityRequirement,
    UploadedFile,
};
use turnstile_middleware::Request;
use turnstile_server::{typed, DispatcherBuilder};

pub use api::{CheckinApi, StubCheckin};
pub use models::{Event, EventCreation, EventDatabase};

/// Operation ID of event creation.
pub const CREATE_EVENT: &str = "CreateEvent";
/// Operation ID of the participant upload.
pub const UPLOAD_PARTICIPANTS: &str = "UploadParticipants";
/// Operation ID of the invitation send-out.
pub const SEND_INVITATIONS: &str = "SendInvitations";

/// Security scheme every check-in operation requires.
pub const BEARER_AUTH: &str = "bearerAuth";

fn bearer() -> SecurityRequirement {
    SecurityRequirement::new(BEARER_AUTH, Vec::<String>::new())
}

/// The check-in contract.
#[must_use]
pub fn contract() -> Contract {
    let account = || ParameterDescriptor::path("accountId", ParamType::INTEGER);
    let event = || ParameterDescriptor::path("eventId", ParamType::INTEGER);

    Contract::new()
        .operation(
            OperationSpec::new(CREATE_EVENT, &Method::POST, "/accounts/{accountId}/events")
                .param(account())
                .security(bearer()),
        )
        .operation(
            OperationSpec::new(
                UPLOAD_PARTICIPANTS,
                &Method::POST,
                "/accounts/{accountId}/events/{eventId}/participants/upload",
            )
            .param(account())
            .param(event())
            .param(ParameterDescriptor::file("file"))
            .security(bearer()),
        )
        .operation(
            OperationSpec::new(
                SEND_INVITATIONS,
                &Method::POST,
                "/accounts/{accountId}/events/{eventId}/sendInvitations",
            )
            .param(account())
            .param(event())
            .security(bearer()),
        )
}

/// Registers one handler per check-in operation, each forwarding to `api`
/// with its bound parameters.
pub fn register_checkin<A: CheckinApi>(builder: DispatcherBuilder, api: A) -> DispatcherBuilder {
    let api = Arc::new(api);

    let create = {
        let api = Arc::clone(&api);
        typed(
            &["accountId"],
            move |ctx: RequestContext, req: Request, (account_id,): (i64,)| {
                api.create_event(ctx, req, account_id)
            },
        )
    };

    let upload = {
        let api = Arc::clone(&api);
        typed(
            &["accountId", "eventId", "file"],
            move |ctx: RequestContext,
                  req: Request,
                  (account_id, event_id, file): (i64, i64, Option<UploadedFile>)| {
                api.upload_participants(ctx, req, account_id, event_id, file)
            },
        )
    };

    let send = typed(
        &["accountId", "eventId"],
        move |ctx: RequestContext, req: Request, (account_id, event_id): (i64, i64)| {
            api.send_invitations(ctx, req, account_id, event_id)
        },
    );

    builder
        .handler(CREATE_EVENT, create)
        .handler(UPLOAD_PARTICIPANTS, upload)
        .handler(SEND_INVITATIONS, send)
}
