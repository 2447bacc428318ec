//! Cookie bookkeeping for one request.
//!
//! # Responsibilities
//! - Accumulate ordered `Set-Cookie` lines for the outgoing response
//! - Apply backend `Set-Cookie` lines to the inbound cookie jar
//! - Enumerate the chunked auth-token cookie family

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use time::OffsetDateTime;

/// `Set-Cookie` lines destined for the response, in the order produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResponseCookies {
    lines: Vec<String>,
}

impl ResponseCookies {
    /// Forward a line verbatim.
    pub fn push_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Set a session cookie written by the edge itself.
    pub fn set(&mut self, name: &str, value: &str, path: &str) {
        let cookie = Cookie::build((name.to_string(), value.to_string()))
            .path(path.to_string())
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        self.lines.push(cookie.to_string());
    }

    /// Expire a cookie on the client.
    pub fn remove(&mut self, name: &str, path: &str) {
        let mut cookie = Cookie::build((name.to_string(), String::new()))
            .path(path.to_string())
            .build();
        cookie.make_removal();
        self.lines.push(cookie.to_string());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append every line as a `Set-Cookie` header. Lines that are not valid
    /// header values are dropped with a warning.
    pub fn append_to(&self, headers: &mut HeaderMap) {
        for line in &self.lines {
            match HeaderValue::from_str(line) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(line = %line, "Dropping invalid Set-Cookie line"),
            }
        }
    }
}

/// The auth token cookie and its numbered chunks (`base`, `base.0`, `base.1`, ...).
///
/// Membership is by exact name; cookies that merely share the prefix are not members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFamily {
    base: String,
    chunks: u8,
}

impl CookieFamily {
    pub fn new(base: impl Into<String>, chunks: u8) -> Self {
        Self {
            base: base.into(),
            chunks,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// All member names, base first.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(self.base.clone())
            .chain((0..self.chunks).map(|i| format!("{}.{}", self.base, i)))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }
}

/// Build a jar from the inbound `Cookie` headers without percent-decoding,
/// so values the edge does not rotate are forwarded byte for byte.
pub fn jar_from_headers(headers: &HeaderMap) -> CookieJar {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| Cookie::parse(pair.to_string()).ok())
        .fold(CookieJar::new(), |jar, cookie| {
            jar.add(Cookie::new(
                cookie.name().to_string(),
                cookie.value().to_string(),
            ))
        })
}

/// Apply one backend `Set-Cookie` line to the inbound jar. Unparseable lines
/// leave the jar unchanged.
pub fn apply_set_cookie(jar: CookieJar, line: &str) -> CookieJar {
    let cookie = match Cookie::parse(line.to_string()) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparseable Set-Cookie line");
            return jar;
        }
    };

    if is_removal(&cookie) {
        jar.remove(Cookie::from(cookie.name().to_string()))
    } else {
        jar.add(Cookie::new(cookie.name().to_string(), cookie.value().to_string()))
    }
}

fn is_removal(cookie: &Cookie<'_>) -> bool {
    if cookie.value().is_empty() {
        return true;
    }
    if let Some(max_age) = cookie.max_age() {
        if max_age.is_zero() || max_age.is_negative() {
            return true;
        }
    }
    cookie
        .expires_datetime()
        .map(|at| at <= OffsetDateTime::now_utc())
        .unwrap_or(false)
}
