//! Telling in-page updates apart from browser navigations, and reading the
//! credentials the partial client attaches.

use crate::application_port::RequestKind;
use warp::{Filter, Rejection};

pub const HX_REQUEST: &str = "hx-request";
pub const HX_REDIRECT: &str = "hx-redirect";
pub const HX_TRIGGER: &str = "hx-trigger";
pub const REFRESH_HEADER: &str = "refresh";
pub const RELOAD_COOKIE: &str = "alreadyResend";
pub const RELOAD_COOKIE_MAX_AGE: u32 = 60;

pub fn request_kind_of(hx_request: Option<&str>) -> RequestKind {
    match hx_request {
        Some(value) if value.trim().eq_ignore_ascii_case("true") => RequestKind::Partial,
        _ => RequestKind::FullPage,
    }
}

/// `Bearer <token>` with an absent client value serialised as `null`.
pub fn bearer_token(header: Option<&str>) -> Option<String> {
    let token = match header?.trim().split_once(' ') {
        Some(("Bearer", rest)) => rest.trim(),
        _ => return None,
    };
    if token.is_empty() || token == "null" || token.contains(' ') {
        return None;
    }
    Some(token.to_string())
}

pub fn request_kind() -> impl Filter<Extract = (RequestKind,), Error = Rejection> + Clone {
    warp::header::optional::<String>(HX_REQUEST)
        .map(|value: Option<String>| request_kind_of(value.as_deref()))
}

fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Replays `target` through the partial client, which attaches the stored
/// tokens, and swaps the result in place of the shim.
pub fn reload_shim(target: &str) -> String {
    format!(
        r#"<div hx-get="{}" hx-swap="outerHTML" hx-trigger="load"></div>"#,
        escape_attribute(target)
    )
}

pub fn reload_cookie() -> String {
    format!(
        "{}=true; Max-Age={}; Path=/; HttpOnly",
        RELOAD_COOKIE, RELOAD_COOKIE_MAX_AGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_requests() {
        assert_eq!(request_kind_of(Some("true")), RequestKind::Partial);
        assert_eq!(request_kind_of(Some("false")), RequestKind::FullPage);
        assert_eq!(request_kind_of(None), RequestKind::FullPage);
    }

    #[test]
    fn parses_bearer_values() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).as_deref(), Some("abc.def.ghi"));
        assert_eq!(bearer_token(Some("abc.def.ghi")), None);
        assert_eq!(bearer_token(Some("Basic abc.def.ghi")), None);
        assert_eq!(bearer_token(Some("Bearer null")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Bearer a b")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn shim_escapes_target() {
        assert_eq!(
            reload_shim("/users?param1=value1&param2=value2"),
            r#"<div hx-get="/users?param1=value1&amp;param2=value2" hx-swap="outerHTML" hx-trigger="load"></div>"#
        );
        assert!(!reload_shim(r#"/x?"><script>"#).contains("<script>"));
    }

    #[tokio::test]
    async fn kind_filter_reads_header() {
        let kind = warp::test::request()
            .header("HX-Request", "true")
            .filter(&request_kind())
            .await
            .unwrap();
        assert_eq!(kind, RequestKind::Partial);
    }
}
