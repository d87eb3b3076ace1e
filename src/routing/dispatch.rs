//! Request execution against the route table.
//!
//! # Flow
//! ```text
//! RequestContext
//!     → RouteTable::match_request
//!         NotFound          → 404
//!         MethodNotAllowed  → 405 + Allow
//!         Matched           → guards in order → handler
//! ```

use std::time::Instant;

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::error::RouteError;
use crate::guards::GuardOutcome;
use crate::http::response::{merge_headers, redirect};
use crate::observability::metrics;
use crate::routing::context::RequestContext;
use crate::routing::matcher::RouteParams;
use crate::routing::router::{Route, RouteHandler, RouteMatch, RouteTable};
use crate::views::ViewRenderer;

/// Run one request through the table and produce its response.
pub async fn dispatch(table: &RouteTable, views: &dyn ViewRenderer, mut ctx: RequestContext) -> Response {
    let start = Instant::now();
    let wants_json = ctx.wants_json();

    let (route_name, response) = match table.match_request(&ctx.method, ctx.url.path()) {
        RouteMatch::NotFound => {
            tracing::debug!(method = %ctx.method, path = %ctx.path(), "No route matched");
            ("none".to_string(), RouteError::NotFound.into_response_for(wants_json))
        }
        RouteMatch::MethodNotAllowed { allowed } => (
            "none".to_string(),
            RouteError::MethodNotAllowed { allowed }.into_response_for(wants_json),
        ),
        RouteMatch::Matched { route, params } => {
            ctx.params = params;
            let response = run_route(table, views, route, &ctx).await;
            (route.name.clone(), response)
        }
    };

    tracing::info!(
        route = %route_name,
        method = %ctx.method,
        path = %ctx.path(),
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    metrics::record_request(&route_name, response.status().as_u16(), start);
    response
}

async fn run_route(table: &RouteTable, views: &dyn ViewRenderer, route: &Route, ctx: &RequestContext) -> Response {
    let wants_json = ctx.wants_json();
    let mut extra = HeaderMap::new();

    for guard in &route.guards {
        match guard.check(ctx) {
            GuardOutcome::Allow => {}
            GuardOutcome::AllowWithHeaders(headers) => extra.extend(headers),
            GuardOutcome::Redirect(location) => {
                let guard_name = guard.name();
                tracing::debug!(route = %route.name, guard = %guard_name, location = %location, "Guard redirected");
                metrics::record_guard_rejection(&guard_name);
                return redirect(&location);
            }
            GuardOutcome::Reject(error) => {
                let guard_name = guard.name();
                tracing::debug!(route = %route.name, guard = %guard_name, error = %error, "Guard rejected");
                metrics::record_guard_rejection(&guard_name);
                return merge_headers(error.into_response_for(wants_json), extra);
            }
        }
    }

    let result = match &route.handler {
        RouteHandler::Redirect { target } => table
            .url_for(target, &RouteParams::new())
            .map(|url| redirect(url.as_str())),
        RouteHandler::View { component } => views.render(component, ctx).map(IntoResponse::into_response),
        RouteHandler::Action(action) => action.handle(ctx).await,
    };

    match result {
        Ok(response) => merge_headers(response, extra),
        Err(error) => merge_headers(error.into_response_for(wants_json), extra),
    }
}
