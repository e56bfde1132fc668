//! Typed client for the quillpost API.
//!
//! The client is an explicitly constructed object handed to whoever needs it,
//! never ambient state. `drain_pages` walks a cursor-paginated listing to
//! exhaustion, and [`optimistic`] holds the apply/commit/rollback helper for
//! presumed-successful UI mutations.

mod optimistic;

pub use optimistic::{mutate, Optimistic};

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::ErrorBody;
use crate::{
    ApiResponse, BookmarkState, CommentRequest, CommentResponse, CreatePostRequest, FollowState,
    LikeState, LoginRequest, Page, PostResponse, ProfileResponse, RegisterRequest,
    UpdatePostRequest, UpdateUserRequest, UserResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(_) => None,
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiClient {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<ApiResponse<T>>().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>, ClientError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    fn page_query(limit: u32, cursor: Option<String>) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        query
    }

    // ----------------- Users -----------------

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, ClientError> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: ApiResponse<UserResponse> = self.post("/users", &request).await?;
        self.token = Some(response.data.token.clone());
        Ok(response.data)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserResponse, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: ApiResponse<UserResponse> = self.post("/users/login", &request).await?;
        self.token = Some(response.data.token.clone());
        Ok(response.data)
    }

    pub async fn current_user(&self) -> Result<UserResponse, ClientError> {
        Ok(self.get("/user", &[]).await?.data)
    }

    pub async fn update_user(
        &self,
        request: &UpdateUserRequest,
    ) -> Result<UserResponse, ClientError> {
        let response = self
            .send(self.http.put(self.url("/user")).json(request))
            .await?;
        Ok(response.data)
    }

    // ----------------- Profiles -----------------

    pub async fn get_profile(&self, username: &str) -> Result<ProfileResponse, ClientError> {
        Ok(self
            .get(&format!("/profiles/{}", username), &[])
            .await?
            .data)
    }

    pub async fn toggle_follow(&self, username: &str) -> Result<FollowState, ClientError> {
        let response = self
            .send(self.http.post(self.url(&format!("/profiles/{}/follow", username))))
            .await?;
        Ok(response.data)
    }

    // ----------------- Posts -----------------

    pub async fn create_post(&self, title: &str, content: &str) -> Result<PostResponse, ClientError> {
        let request = CreatePostRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        Ok(self.post("/posts", &request).await?.data)
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostResponse, ClientError> {
        Ok(self.get(&format!("/posts/{}", post_id), &[]).await?.data)
    }

    pub async fn update_post(
        &self,
        post_id: i64,
        request: &UpdatePostRequest,
    ) -> Result<PostResponse, ClientError> {
        let response = self
            .send(
                self.http
                    .put(self.url(&format!("/posts/{}", post_id)))
                    .json(request),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<(), ClientError> {
        let _: ApiResponse<()> = self
            .send(self.http.delete(self.url(&format!("/posts/{}", post_id))))
            .await?;
        Ok(())
    }

    pub async fn list_posts(
        &self,
        author: Option<&str>,
        q: Option<&str>,
        limit: u32,
        cursor: Option<String>,
    ) -> Result<Page<PostResponse>, ClientError> {
        let mut query = Self::page_query(limit, cursor);
        if let Some(author) = author {
            query.push(("author", author.to_string()));
        }
        if let Some(q) = q {
            query.push(("q", q.to_string()));
        }
        Ok(self.get("/posts", &query).await?.data)
    }

    pub async fn feed(
        &self,
        limit: u32,
        cursor: Option<String>,
    ) -> Result<Page<PostResponse>, ClientError> {
        Ok(self
            .get("/posts/feed", &Self::page_query(limit, cursor))
            .await?
            .data)
    }

    pub async fn bookmarks(
        &self,
        limit: u32,
        cursor: Option<String>,
    ) -> Result<Page<PostResponse>, ClientError> {
        Ok(self
            .get("/bookmarks", &Self::page_query(limit, cursor))
            .await?
            .data)
    }

    pub async fn toggle_like(&self, post_id: i64) -> Result<LikeState, ClientError> {
        let response = self
            .send(self.http.post(self.url(&format!("/posts/{}/like", post_id))))
            .await?;
        Ok(response.data)
    }

    pub async fn toggle_bookmark(&self, post_id: i64) -> Result<BookmarkState, ClientError> {
        let response = self
            .send(
                self.http
                    .post(self.url(&format!("/posts/{}/bookmark", post_id))),
            )
            .await?;
        Ok(response.data)
    }

    // ----------------- Comments -----------------

    pub async fn list_comments(
        &self,
        post_id: i64,
        limit: u32,
        cursor: Option<String>,
    ) -> Result<Page<CommentResponse>, ClientError> {
        Ok(self
            .get(
                &format!("/posts/{}/comments", post_id),
                &Self::page_query(limit, cursor),
            )
            .await?
            .data)
    }

    pub async fn create_comment(
        &self,
        post_id: i64,
        content: &str,
    ) -> Result<CommentResponse, ClientError> {
        let request = CommentRequest {
            content: content.to_string(),
        };
        Ok(self
            .post(&format!("/posts/{}/comments", post_id), &request)
            .await?
            .data)
    }

    pub async fn update_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        content: &str,
    ) -> Result<CommentResponse, ClientError> {
        let request = CommentRequest {
            content: content.to_string(),
        };
        let response = self
            .send(
                self.http
                    .put(self.url(&format!("/posts/{}/comments/{}", post_id, comment_id)))
                    .json(&request),
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_comment(&self, post_id: i64, comment_id: i64) -> Result<(), ClientError> {
        let _: ApiResponse<()> = self
            .send(
                self.http
                    .delete(self.url(&format!("/posts/{}/comments/{}", post_id, comment_id))),
            )
            .await?;
        Ok(())
    }

    pub async fn check_health(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.url("/check_health")).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Walks a cursor-paginated listing until the server returns a null cursor,
/// accumulating items keyed by `key` and skipping any duplicates.
pub async fn drain_pages<T, K, E, F, Fut>(
    mut fetch: F,
    key: impl Fn(&T) -> K,
) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
    K: Eq + Hash,
{
    let mut seen = HashSet::new();
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch(cursor.take()).await?;
        for item in page.items {
            if seen.insert(key(&item)) {
                all.push(item);
            }
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(all)
}
