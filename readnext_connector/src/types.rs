use serde::Serialize;

/// Request bodies for the write endpoints. Responses stay untyped
/// (`serde_json::Value`); decoding specific shapes is left to callers.

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BatchRecommendationsRequest<'a> {
    pub user_ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionCreate {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_books: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disliked_books: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_query: Option<String>,
}
