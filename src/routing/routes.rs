//! The authentication route table.
//!
//! | Method    | Path                      | Name                  | Guards                   |
//! |-----------|---------------------------|-----------------------|--------------------------|
//! | GET       | /login                    | login                 | guest                    |
//! | GET       | /register                 | register              | guest (flagged)          |
//! | GET       | /forgot-password          | password.request      | guest                    |
//! | GET       | /reset-password/{token}   | password.reset        | guest                    |
//! | GET       | /verify-email             | verification.notice   | auth                     |
//! | GET       | /verify-email/{id}/{hash} | verification.verify   | auth, signed, throttle   |
//! | GET       | /confirm-password         | password.confirm      | auth                     |
//! | GET, POST | /logout                   | logout                | -                        |

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use url::Url;

use crate::config::AuthConfig;
use crate::guards::{Authenticate, Guard, RedirectIfAuthenticated, Throttle, ValidateSignature};
use crate::routing::matcher::{MethodSet, RouteParams};
use crate::routing::router::{Route, RouteHandler, RouteTable, RouteTableError};
use crate::security::{RateLimiter, UrlSigner};
use crate::verification::{EmailVerifier, VerifyEmailAction};
use crate::views;

/// Route names.
pub mod names {
    pub const LOGIN: &str = "login";
    pub const REGISTER: &str = "register";
    pub const LOGOUT: &str = "logout";
    pub const PASSWORD_REQUEST: &str = "password.request";
    pub const PASSWORD_RESET: &str = "password.reset";
    pub const PASSWORD_CONFIRM: &str = "password.confirm";
    pub const VERIFICATION_NOTICE: &str = "verification.notice";
    pub const VERIFICATION_VERIFY: &str = "verification.verify";

    pub const PROVIDER_LOGIN: &str = "usersau.login";
    pub const PROVIDER_REGISTER: &str = "usersau.register";
    pub const PROVIDER_LOGOUT: &str = "usersau.logout";
}

/// Long-lived collaborators the table's guards and handlers share.
///
/// They outlive any single table so that a rebuilt table keeps the same
/// throttle counters and accounts.
#[derive(Clone)]
pub struct Collaborators {
    pub signer: Arc<UrlSigner>,
    pub limiter: Arc<RateLimiter>,
    pub verifier: Arc<dyn EmailVerifier>,
}

impl Collaborators {
    pub fn new(config: &AuthConfig, limiter: Arc<RateLimiter>, verifier: Arc<dyn EmailVerifier>) -> Result<Self, RouteTableError> {
        let signer = UrlSigner::new(config.app.key.as_bytes()).map_err(|_| RouteTableError::SigningKey)?;
        Ok(Self {
            signer: Arc::new(signer),
            limiter,
            verifier,
        })
    }
}

/// Build the route table for `config`.
///
/// `registration.enabled` is read here, once; a table built with it off has
/// no `register` route at all.
pub fn build_route_table(config: &AuthConfig, deps: &Collaborators) -> Result<RouteTable, RouteTableError> {
    let base = Url::parse(&config.app.url)?;
    let home = base.join(&config.app.home)?;
    let mut table = RouteTable::new(base);

    table.add_external(names::PROVIDER_LOGIN, config.provider.login.as_str())?;
    table.add_external(names::PROVIDER_REGISTER, config.provider.register.as_str())?;
    table.add_external(names::PROVIDER_LOGOUT, config.provider.logout.as_str())?;

    // Unauthenticated only.
    let guest: Arc<dyn Guard> = Arc::new(RedirectIfAuthenticated::new(home.as_str()));

    table.add(Route::get("/login", names::LOGIN, RouteHandler::redirect(names::PROVIDER_LOGIN))?.guard(guest.clone()))?;

    if config.registration.enabled {
        table.add(
            Route::get("/register", names::REGISTER, RouteHandler::redirect(names::PROVIDER_REGISTER))?
                .guard(guest.clone()),
        )?;
    } else {
        tracing::info!("Registration disabled, register route not installed");
    }

    table.add(
        Route::get("/forgot-password", names::PASSWORD_REQUEST, RouteHandler::view(views::FORGOT_PASSWORD))?
            .guard(guest.clone()),
    )?;
    table.add(
        Route::get("/reset-password/{token}", names::PASSWORD_RESET, RouteHandler::view(views::RESET_PASSWORD))?
            .guard(guest),
    )?;

    // Authenticated only.
    let login = table
        .url_for(names::LOGIN, &RouteParams::new())
        .map_err(|e| RouteTableError::Resolve {
            name: names::LOGIN.to_string(),
            source: Box::new(e),
        })?;
    let auth: Arc<dyn Guard> = Arc::new(Authenticate::new(login.as_str()));

    table.add(
        Route::get("/verify-email", names::VERIFICATION_NOTICE, RouteHandler::view(views::VERIFY_EMAIL))?
            .guard(auth.clone()),
    )?;

    let signed: Arc<dyn Guard> = Arc::new(ValidateSignature::new(deps.signer.clone()));
    let throttle: Arc<dyn Guard> = Arc::new(Throttle::new(
        names::VERIFICATION_VERIFY,
        config.verification.max_attempts,
        Duration::from_secs(config.verification.decay_secs),
        deps.limiter.clone(),
    ));
    let verify = VerifyEmailAction::new(deps.verifier.clone(), &home);
    table.add(
        Route::get(
            "/verify-email/{id}/{hash}",
            names::VERIFICATION_VERIFY,
            RouteHandler::Action(Arc::new(verify)),
        )?
        .guards([auth.clone(), signed, throttle]),
    )?;

    table.add(
        Route::get("/confirm-password", names::PASSWORD_CONFIRM, RouteHandler::view(views::CONFIRM_PASSWORD))?
            .guard(auth),
    )?;

    // Unguarded: always hand off to the provider's logout.
    table.add(Route::new(
        MethodSet::new([Method::GET, Method::POST]),
        "/logout",
        names::LOGOUT,
        RouteHandler::redirect(names::PROVIDER_LOGOUT),
    )?)?;

    tracing::info!(routes = table.len(), "Route table built");
    Ok(table)
}
