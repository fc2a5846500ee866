use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::config::RelaySettings;
use crate::relay::{self, RelayOutcome, RelayRedirect, RequestTarget};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Session transfer relay as an Axum middleware.
///
/// A request carrying `?session_transfer_token=...` gets a `302 Found` back
/// with the relay cookie and the same URL minus the parameter; the inner
/// service does not run. Every other request passes through untouched.
///
/// ```rust,ignore
/// let app = app.layer(axum::middleware::from_fn_with_state(
///     RelaySettings::default(),
///     session_transfer_relay,
/// ));
/// ```
pub async fn session_transfer_relay(
    State(settings): State<RelaySettings>,
    request: Request,
    next: Next,
) -> Response {
    let outcome = relay::handle(&request_target(&request, &settings));

    match outcome {
        RelayOutcome::PassThrough => next.run(request).await,
        RelayOutcome::Redirect(redirect) => match redirect_response(&redirect) {
            Some(response) => response,
            None => next.run(request).await,
        },
    }
}

fn request_target<'a>(request: &'a Request, settings: &'a RelaySettings) -> RequestTarget<'a> {
    let uri = request.uri();
    let headers = request.headers();

    let forwarded = |name: &str| {
        settings
            .trust_forwarded_headers
            .then(|| first_header_value(headers, name))
            .flatten()
    };

    let scheme = forwarded(X_FORWARDED_PROTO)
        .or_else(|| uri.scheme_str())
        .unwrap_or(settings.fallback_scheme.as_str());

    let authority = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| forwarded(X_FORWARDED_HOST))
        .or_else(|| first_header_value(headers, header::HOST.as_str()));

    RequestTarget {
        scheme,
        authority,
        path: uri.path(),
        query: uri.query(),
    }
}

fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn redirect_response(redirect: &RelayRedirect) -> Option<Response> {
    let location = HeaderValue::try_from(redirect.location())
        .inspect_err(|e| tracing::warn!(error = %e, "Relay redirect location is not a valid header"))
        .ok()?;
    let cookie = HeaderValue::try_from(redirect.set_cookie_header())
        .inspect_err(|e| tracing::warn!(error = %e, "Relay cookie is not a valid header"))
        .ok()?;

    Some(
        (
            StatusCode::FOUND,
            [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
        )
            .into_response(),
    )
}
