use axum::http::{header, HeaderMap};
use time::Duration;

use super::jwt::IssuedToken;
use crate::config::Environment;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Builds a `Set-Cookie` value. A `max_age` of `None` makes it a
/// browser-session cookie.
pub fn set_cookie(name: &str, value: &str, max_age: Option<Duration>, env: Environment) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; Path=/");
    if env.is_production() {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age.whole_seconds().max(0)));
    }
    cookie
}

pub fn token_cookie(name: &str, token: &IssuedToken, persistent: bool, env: Environment) -> String {
    let max_age = persistent.then_some(token.ttl);
    set_cookie(name, &token.token, max_age, env)
}

pub fn clear_cookie(name: &str, env: Environment) -> String {
    set_cookie(name, "", Some(Duration::ZERO), env)
}

/// Reads one cookie from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then_some(v)
        })
        .filter(|v| !v.is_empty())
}
