//! View components.
//!
//! Pages behind the guarded routes are produced by a [`ViewRenderer`]. The
//! bundled [`PageRenderer`] emits minimal standalone HTML; deployments with a
//! real front end plug in their own renderer.

use axum::response::Html;

use crate::error::RouteError;
use crate::routing::RequestContext;

pub const FORGOT_PASSWORD: &str = "auth.forgot-password";
pub const RESET_PASSWORD: &str = "auth.reset-password";
pub const VERIFY_EMAIL: &str = "auth.verify-email";
pub const CONFIRM_PASSWORD: &str = "auth.confirm-password";

pub trait ViewRenderer: Send + Sync {
    fn render(&self, component: &str, ctx: &RequestContext) -> Result<Html<String>, RouteError>;
}

/// Built-in renderer for the auth components.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer;

impl ViewRenderer for PageRenderer {
    fn render(&self, component: &str, ctx: &RequestContext) -> Result<Html<String>, RouteError> {
        let (title, body) = match component {
            FORGOT_PASSWORD => (
                "Forgot your password?",
                "<p>Enter your email address and we will send you a reset link.</p>".to_string(),
            ),
            RESET_PASSWORD => {
                let token = ctx
                    .param("token")
                    .ok_or_else(|| RouteError::Internal("reset view without token".into()))?;
                let email = ctx.query("email").unwrap_or_default();
                (
                    "Reset password",
                    format!(
                        "<form method=\"post\"><input type=\"hidden\" name=\"token\" value=\"{}\">\
                         <input type=\"email\" name=\"email\" value=\"{}\"></form>",
                        escape(token),
                        escape(&email)
                    ),
                )
            }
            VERIFY_EMAIL => {
                let email = ctx.principal.as_ref().map(|p| p.email.as_str()).unwrap_or_default();
                (
                    "Verify your email",
                    format!("<p>We sent a verification link to {}.</p>", escape(email)),
                )
            }
            CONFIRM_PASSWORD => (
                "Confirm password",
                "<p>Please confirm your password before continuing.</p>".to_string(),
            ),
            other => return Err(RouteError::Internal(format!("unknown view component '{other}'"))),
        };

        Ok(Html(format!(
            "<!doctype html><html><head><title>{title}</title></head>\
             <body data-component=\"{component}\"><h1>{title}</h1>{body}</body></html>"
        )))
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
