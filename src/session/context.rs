//! Explicit per-request state threaded through routing.

use axum::http::{header::COOKIE, HeaderMap, HeaderName, HeaderValue, Uri};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::session::cookies::{apply_set_cookie, jar_from_headers, CookieFamily, ResponseCookies};

/// Inbound request view plus the cookie changes made while handling it.
///
/// The jar always reflects what later backend calls in the same request should
/// see; `response_cookies` is what the browser will receive.
#[derive(Debug, Clone)]
pub struct RequestContext {
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    jar: CookieJar,
    response_cookies: ResponseCookies,
}

impl RequestContext {
    pub fn new(uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            path: uri.path().to_string(),
            query: uri.query().filter(|q| !q.is_empty()).map(str::to_string),
            headers: headers.clone(),
            jar: jar_from_headers(headers),
            response_cookies: ResponseCookies::default(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `path?query` as requested.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// Current value of a request cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(Cookie::value)
    }

    /// Forward backend `Set-Cookie` lines to the response and refresh the jar.
    pub fn apply_set_cookies(&mut self, lines: &[String]) {
        for line in lines {
            self.response_cookies.push_raw(line.clone());
            let jar = self.jar.clone();
            self.jar = apply_set_cookie(jar, line);
        }
    }

    /// Write a cookie on both sides.
    pub fn set_cookie(&mut self, name: &str, value: &str, path: &str) {
        self.response_cookies.set(name, value, path);
        let jar = self.jar.clone();
        self.jar = jar.add(Cookie::new(name.to_string(), value.to_string()));
    }

    /// Expire a cookie on both sides.
    pub fn remove_cookie(&mut self, name: &str, path: &str) {
        self.response_cookies.remove(name, path);
        let jar = self.jar.clone();
        self.jar = jar.remove(Cookie::from(name.to_string()));
    }

    /// Expire the family base name and every member present on the request.
    pub fn expire_cookie_family(&mut self, family: &CookieFamily, path: &str) {
        for name in family.names() {
            let present = self.jar.get(&name).is_some();
            if name == family.base() || present {
                self.response_cookies.remove(&name, path);
            }
            if present {
                let jar = self.jar.clone();
                self.jar = jar.remove(Cookie::from(name));
            }
        }
    }

    /// `Cookie` header rebuilt from the current jar, sorted by name.
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        let mut pairs: Vec<(&str, &str)> = self.jar.iter().map(|c| (c.name(), c.value())).collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        let joined = pairs
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    /// Headers for a backend call: the forwarded subset of the inbound headers
    /// plus the refreshed `Cookie` header.
    pub fn outbound_headers(&self, forwarded: &[HeaderName]) -> HeaderMap {
        let mut out = HeaderMap::new();
        for name in forwarded {
            if *name == COOKIE {
                continue;
            }
            for value in self.headers.get_all(name) {
                out.append(name.clone(), value.clone());
            }
        }
        if let Some(cookie) = self.cookie_header() {
            out.insert(COOKIE, cookie);
        }
        out
    }

    pub fn response_cookies(&self) -> &ResponseCookies {
        &self.response_cookies
    }

    pub fn into_response_cookies(self) -> ResponseCookies {
        self.response_cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT_LANGUAGE, USER_AGENT};

    fn ctx(uri: &str, cookie: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        headers.insert(USER_AGENT, HeaderValue::from_static("test-agent"));
        if let Some(c) = cookie {
            headers.insert(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        RequestContext::new(&uri.parse().unwrap(), &headers)
    }

    #[test]
    fn test_path_and_query() {
        assert_eq!(ctx("/my-account?x=1", None).path_and_query(), "/my-account?x=1");
        assert_eq!(ctx("/my-account?", None).path_and_query(), "/my-account");
        assert_eq!(ctx("/", None).path_and_query(), "/");
    }

    #[test]
    fn test_set_cookies_flow_to_both_sides() {
        let mut ctx = ctx("/", Some("auth_token=old; cart=c1"));
        ctx.apply_set_cookies(&["auth_token=new; Path=/; HttpOnly".to_string()]);

        assert_eq!(ctx.cookie("auth_token"), Some("new"));
        assert_eq!(
            ctx.response_cookies().lines(),
            ["auth_token=new; Path=/; HttpOnly"]
        );
        assert_eq!(
            ctx.cookie_header().unwrap(),
            HeaderValue::from_static("auth_token=new; cart=c1")
        );
    }

    #[test]
    fn test_expire_family_only_touches_members() {
        let mut ctx = ctx(
            "/",
            Some("auth_token.0=a; auth_token.1=b; auth_token_prefs=keep; cart=c1"),
        );
        ctx.expire_cookie_family(&CookieFamily::new("auth_token", 4), "/");

        let expired: Vec<_> = ctx
            .response_cookies()
            .lines()
            .iter()
            .map(|l| l.split('=').next().unwrap().to_string())
            .collect();
        assert_eq!(expired, ["auth_token", "auth_token.0", "auth_token.1"]);
        assert_eq!(ctx.cookie("auth_token_prefs"), Some("keep"));
        assert!(ctx.cookie("auth_token.0").is_none());
    }

    #[test]
    fn test_outbound_headers() {
        let mut ctx = ctx("/", Some("cart=c1"));
        ctx.set_cookie("channel_id", "B", "/");

        let headers = ctx.outbound_headers(&[ACCEPT_LANGUAGE, COOKIE]);
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "en-US");
        assert!(headers.get(USER_AGENT).is_none());
        assert_eq!(headers.get(COOKIE).unwrap(), "cart=c1; channel_id=B");
    }

    #[test]
    fn test_untouched_cookies_are_forwarded_verbatim() {
        let raw = "cart=%7B%22id%22%3A%22c1%22%7D; sid=a%3Bb";
        let mut ctx = ctx("/", Some(raw));
        assert_eq!(ctx.outbound_headers(&[]).get(COOKIE).unwrap(), raw);

        ctx.apply_set_cookies(&["auth_token=t%3D1; Path=/".to_string()]);
        assert_eq!(
            ctx.cookie_header().unwrap(),
            "auth_token=t%3D1; cart=%7B%22id%22%3A%22c1%22%7D; sid=a%3Bb"
        );
    }

    #[test]
    fn test_remove_cookie() {
        let mut ctx = ctx("/", Some("cart_reset=1; cart=c1"));
        ctx.remove_cookie("cart_reset", "/");
        assert!(ctx.cookie("cart_reset").is_none());
        assert_eq!(ctx.response_cookies().lines().len(), 1);
        assert!(ctx.response_cookies().lines()[0].starts_with("cart_reset=;"));
        assert_eq!(ctx.cookie_header().unwrap(), "cart=c1");
    }
}
