use serde::{Deserialize, Serialize};

use crate::models::{Comment, Post, Series, Tag};

/// Author fields attached to enriched posts and comments. The email is only
/// populated on the single-post view.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AuthorInfo {
    pub id: i64,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostRef {
    pub id: i64,
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorInfo>,
    pub tags: Vec<Tag>,
    pub series: Option<Series>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorInfo>,
    pub has_liked: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PendingCommentResponse {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorInfo>,
    pub post: Option<PostRef>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct IdResponse {
    pub id: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CoverImageResponse {
    pub cover_image: String,
}
