use serde::{Deserialize, Serialize};

use crate::models::{Comment, Post, User};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub bio: String,
    pub avatar: Option<String>,
    pub following: bool,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AuthorResponse {
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "likeCount")]
    pub like_count: i64,
    #[serde(rename = "commentCount")]
    pub comment_count: i64,
    #[serde(rename = "isLiked")]
    pub is_liked: bool,
    #[serde(rename = "isBookmarked")]
    pub is_bookmarked: bool,
    pub author: ProfileResponse,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub author: AuthorResponse,
}

// ----------------- Toggle endpoint payloads -----------------

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct FollowState {
    pub following: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    #[serde(rename = "likeCount")]
    pub like_count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct BookmarkState {
    pub bookmarked: bool,
}

impl UserResponse {
    pub fn new(
        User {
            username,
            email,
            bio,
            avatar,
            ..
        }: User,
        token: String,
    ) -> Self {
        UserResponse {
            username,
            email,
            bio: bio.unwrap_or_default(),
            avatar,
            token,
        }
    }
}

impl ProfileResponse {
    pub fn new(
        User {
            username,
            bio,
            avatar,
            ..
        }: User,
        following: bool,
    ) -> Self {
        ProfileResponse {
            username,
            bio: bio.unwrap_or_default(),
            avatar,
            following,
        }
    }
}

impl PostResponse {
    pub fn new(
        Post {
            id,
            title,
            content,
            created_at,
            like_count,
            comment_count,
            liked,
            bookmarked,
            author_username,
            author_avatar,
            author_bio,
            following,
            ..
        }: Post,
    ) -> Self {
        PostResponse {
            id,
            title,
            content,
            created_at: created_at.to_string(),
            like_count,
            comment_count,
            is_liked: liked,
            is_bookmarked: bookmarked,
            author: ProfileResponse {
                username: author_username,
                bio: author_bio.unwrap_or_default(),
                avatar: author_avatar,
                following,
            },
        }
    }
}

impl CommentResponse {
    pub fn new(
        Comment {
            id,
            content,
            created_at,
            author_username,
            author_avatar,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            content,
            created_at: created_at.to_string(),
            author: AuthorResponse {
                username: author_username,
                avatar: author_avatar,
            },
        }
    }
}
