//! Session cookie attributes.
//!
//! Transport-free description of the cookie that carries the session token:
//! the web layer renders it into a `Set-Cookie` header with whatever HTTP
//! stack it uses. The advertised max-age (24 h by default) is deliberately
//! longer than the session's 30-minute sliding window — the session store is
//! the source of truth, the cookie merely transports the token.

use warden_core::{Session, config::SessionConfig};

/// Attributes for the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub max_age_secs: i64,
    pub http_only: bool,
    pub same_site_lax: bool,
    pub path: String,
}

impl SessionCookie {
    /// Cookie carrying a freshly minted session's token.
    pub fn for_session(config: &SessionConfig, session: &Session) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: session.token.as_str().to_string(),
            max_age_secs: config.cookie_max_age.num_seconds(),
            http_only: true,
            same_site_lax: true,
            path: "/".to_string(),
        }
    }

    /// Expired cookie that clears the session on the client after logout.
    pub fn cleared(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: String::new(),
            max_age_secs: 0,
            http_only: true,
            same_site_lax: true,
            path: "/".to_string(),
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path={}",
            self.name, self.value, self.max_age_secs, self.path
        );
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if self.same_site_lax {
            header.push_str("; SameSite=Lax");
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::UserId;

    fn session() -> Session {
        Session::builder()
            .user_id(UserId::new_random())
            .build()
            .unwrap()
    }

    #[test]
    fn test_cookie_outlives_slide_window() {
        let config = SessionConfig::default();
        let session = session();
        let cookie = SessionCookie::for_session(&config, &session);

        assert_eq!(cookie.name, "warden_session");
        assert_eq!(cookie.value, session.token.as_str());
        // 24 hours, while the server-side window is 30 minutes.
        assert_eq!(cookie.max_age_secs, 24 * 60 * 60);
    }

    #[test]
    fn test_header_value_attributes() {
        let config = SessionConfig::default();
        let session = session();
        let header = SessionCookie::for_session(&config, &session).header_value();

        assert!(header.starts_with(&format!("warden_session={}", session.token)));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=86400"));
    }

    #[test]
    fn test_cleared_cookie() {
        let config = SessionConfig::default();
        let cookie = SessionCookie::cleared(&config);

        assert!(cookie.value.is_empty());
        assert_eq!(cookie.max_age_secs, 0);
        assert!(cookie.header_value().contains("Max-Age=0"));
    }
}
