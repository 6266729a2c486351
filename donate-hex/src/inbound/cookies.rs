//! Auth cookie handling.

use axum::http::{HeaderMap, HeaderValue, header};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Attributes shared by both auth cookies.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub access_max_age_secs: i64,
    pub refresh_max_age_secs: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            access_max_age_secs: 30 * 60,
            refresh_max_age_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl CookieSettings {
    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!("{}={}; HttpOnly", name, value);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Strict; Path=/");
        cookie.push_str(&format!("; Max-Age={}", max_age_secs));
        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self, name: &str) -> String {
        self.build_set_cookie(name, "", 0)
    }

    /// Set-Cookie values for a freshly issued token pair.
    pub fn token_cookies(&self, access_token: &str, refresh_token: &str) -> [String; 2] {
        [
            self.build_set_cookie(ACCESS_COOKIE, access_token, self.access_max_age_secs),
            self.build_set_cookie(REFRESH_COOKIE, refresh_token, self.refresh_max_age_secs),
        ]
    }

    /// Set-Cookie values that remove both auth cookies.
    pub fn cleared_cookies(&self) -> [String; 2] {
        [
            self.build_delete_cookie(ACCESS_COOKIE),
            self.build_delete_cookie(REFRESH_COOKIE),
        ]
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Converts cookie strings into header values, skipping any that are not valid.
pub fn to_header_values(cookies: [String; 2]) -> Vec<HeaderValue> {
    cookies
        .into_iter()
        .filter_map(|c| HeaderValue::from_str(&c).ok())
        .collect()
}
