//! Endpoint paths under the configured base address.

use url::form_urlencoded;

pub const HEALTH: &str = "/health";
pub const METRICS: &str = "/metrics";

pub const LOGIN: &str = "/api/auth/login";
pub const REFRESH: &str = "/api/auth/refresh";
pub const LOGOUT: &str = "/api/auth/logout";
pub const REGISTER: &str = "/api/auth/register";

pub const RECOMMENDATIONS_BATCH: &str = "/api/recommendations/batch";
pub const BOOKS_SEARCH: &str = "/api/books/search";
pub const SEMANTIC_SEARCH: &str = "/api/books/semantic-search";
pub const SESSIONS: &str = "/api/sessions";
pub const STATS: &str = "/api/stats";

// Development-only helpers on the backend side.
pub const DEV_CACHE_RESET: &str = "/api/dev/cache/reset";
pub const DEV_CACHE_WARM: &str = "/api/dev/cache/warm";

pub fn recommendations(user_id: &str, count: Option<u32>) -> String {
    match count {
        Some(count) => format!("/api/recommendations/{user_id}?count={count}"),
        None => format!("/api/recommendations/{user_id}"),
    }
}

pub fn explanation(user_id: &str, book_id: &str) -> String {
    format!("/api/recommendations/{user_id}/explanation/{book_id}")
}

pub fn session(session_id: &str) -> String {
    format!("{SESSIONS}/{session_id}")
}

pub fn books_search(query: &str, limit: Option<u32>) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("q", query);
    if let Some(limit) = limit {
        params.append_pair("limit", &limit.to_string());
    }
    format!("{BOOKS_SEARCH}?{}", params.finish())
}

pub fn semantic_search(query: &str) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("q", query);
    format!("{SEMANTIC_SEARCH}?{}", params.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_strings_are_encoded() {
        assert_eq!(
            books_search("war & peace", Some(5)),
            "/api/books/search?q=war+%26+peace&limit=5"
        );
        assert_eq!(
            semantic_search("cozy sci-fi"),
            "/api/books/semantic-search?q=cozy+sci-fi"
        );
    }

    #[test]
    fn path_builders_interpolate_ids() {
        assert_eq!(recommendations("u1", None), "/api/recommendations/u1");
        assert_eq!(
            recommendations("u1", Some(10)),
            "/api/recommendations/u1?count=10"
        );
        assert_eq!(
            explanation("u1", "b42"),
            "/api/recommendations/u1/explanation/b42"
        );
        assert_eq!(session("s9"), "/api/sessions/s9");
    }
}
