//! Auth cookie helpers.
//!
//! Both cookies are HTTP-only. With `secure_cookies` they are `Secure` and
//! `SameSite=None` for cross-site frontends; otherwise `SameSite=Strict`.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Strict })
        .path("/")
        .build()
}

/// Adds both auth cookies to the jar.
#[must_use]
pub fn set_auth_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: &str,
    secure: bool,
) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, access_token.to_string(), secure))
        .add(auth_cookie(REFRESH_COOKIE, refresh_token.to_string(), secure))
}

/// Removes both auth cookies.
#[must_use]
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookies_are_http_only() {
        let jar = set_auth_cookies(CookieJar::new(), "a", "r", false);
        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "a");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Strict));
        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "r");
    }

    #[test]
    fn test_secure_cookies_allow_cross_site() {
        let jar = set_auth_cookies(CookieJar::new(), "a", "r", true);
        let refresh = jar.get(REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.secure(), Some(true));
        assert_eq!(refresh.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_clear_removes_both() {
        let jar = clear_auth_cookies(set_auth_cookies(CookieJar::new(), "a", "r", false));
        assert!(jar.get(ACCESS_COOKIE).is_none());
        assert!(jar.get(REFRESH_COOKIE).is_none());
    }
}
