use serde::{Deserialize, Serialize};

use crate::models::CommentStatus;

// ----------------- Post Requests -----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    PublishedAt,
    ViewCount,
    IsPinned,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturedQueryParams {
    pub sort_by: SortBy,
    pub limit: i64,
}

impl Default for FeaturedQueryParams {
    fn default() -> Self {
        FeaturedQueryParams {
            sort_by: SortBy::PublishedAt,
            limit: 5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(default)]
pub struct PageQueryParams {
    pub limit: i64,
    pub offset: i64,
}

impl Default for PageQueryParams {
    fn default() -> Self {
        PageQueryParams {
            limit: 10,
            offset: 0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SearchQueryParams {
    pub query: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub series_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
    pub is_pinned: Option<bool>,
    pub is_published: Option<bool>,
}

// ----------------- Comment Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UpdateCommentStatusRequest {
    pub status: CommentStatus,
}

// ----------------- Tag & Series Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateSeriesRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ----------------- Subscriber Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
pub struct EmailRequest {
    pub email: String,
}

// ----------------- AI Requests -----------------

#[derive(Deserialize, Serialize, Debug)]
pub struct GenerateSummaryRequest {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GenerateCoverImageRequest {
    pub title: String,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}
