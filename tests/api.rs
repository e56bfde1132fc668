use std::time::Duration;

use quillpost::client::{drain_pages, mutate, ApiClient, Optimistic};
use quillpost::{
    get_random_free_port, init_db, make_router, run_app, LikeState, UpdatePostRequest,
    UpdateUserRequest,
};
use sqlx::{Sqlite, SqlitePool};

struct TestApp {
    base_url: String,
    pool: SqlitePool,
}

impl TestApp {
    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }
}

async fn spawn_app() -> TestApp {
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    let db_path = std::env::temp_dir().join(format!("quillpost-test-{}.db", rand::random::<u64>()));
    let db_url = format!("sqlite://{}", db_path.display());
    let pool = init_db(&db_url).await.expect("failed to init test db");

    let (_, addr) = get_random_free_port();
    let router = make_router();
    let server_pool = pool.clone();
    tokio::spawn(async move {
        run_app(router, server_pool, addr)
            .await
            .expect("server crashed");
    });

    let app = TestApp {
        base_url: format!("http://{}", addr),
        pool,
    };
    let client = app.client();
    for _ in 0..50 {
        if client.check_health().await.is_ok() {
            return app;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up");
}

async fn register(app: &TestApp, username: &str) -> ApiClient {
    let mut client = app.client();
    client
        .register(username, &format!("{}@example.com", username), "hunter42")
        .await
        .expect("failed to register");
    client
}

async fn user_id(app: &TestApp, username: &str) -> i64 {
    sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn register_login_and_current_user() {
    let app = spawn_app().await;
    let client = register(&app, "alice").await;

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "alice");
    assert_eq!(me.email, "alice@example.com");

    let mut fresh = app.client();
    let user = fresh.login("alice@example.com", "hunter42").await.unwrap();
    assert_eq!(user.username, "alice");

    let err = app
        .client()
        .login("alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn_app().await;
    register(&app, "bob").await;
    let err = app
        .client()
        .register("bob", "bob@example.com", "hunter42")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn anonymous_requests_to_protected_routes_are_401() {
    let app = spawn_app().await;
    let client = app.client();
    assert_eq!(client.current_user().await.unwrap_err().status(), Some(401));
    assert_eq!(client.toggle_like(1).await.unwrap_err().status(), Some(401));
    assert_eq!(client.feed(10, None).await.unwrap_err().status(), Some(401));
}

#[tokio::test]
async fn update_user_changes_profile_fields() {
    let app = spawn_app().await;
    let client = register(&app, "carol").await;
    let updated = client
        .update_user(&UpdateUserRequest {
            bio: Some("writes about systems".to_string()),
            avatar: Some("https://example.com/a.png".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.bio, "writes about systems");

    let profile = app.client().get_profile("carol").await.unwrap();
    assert_eq!(profile.bio, "writes about systems");
    assert!(!profile.following);
}

#[tokio::test]
async fn like_double_toggle_is_idempotent() {
    let app = spawn_app().await;
    let client = register(&app, "dora").await;
    let post = client.create_post("hello", "first post").await.unwrap();

    let first = client.toggle_like(post.id).await.unwrap();
    assert_eq!(
        first,
        LikeState {
            liked: true,
            like_count: 1
        }
    );

    let second = client.toggle_like(post.id).await.unwrap();
    assert_eq!(
        second,
        LikeState {
            liked: false,
            like_count: 0
        }
    );

    let third = client.toggle_like(post.id).await.unwrap();
    assert!(third.liked);
    assert_eq!(third.like_count, 1);

    let view = client.get_post(post.id).await.unwrap();
    assert!(view.is_liked);
    assert_eq!(view.like_count, 1);
}

#[tokio::test]
async fn concurrent_toggles_never_duplicate_the_relation_row() {
    let app = spawn_app().await;
    let client = register(&app, "eve").await;
    let post = client.create_post("race me", "...").await.unwrap();
    let token = client.token().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let base_url = app.base_url.clone();
        let token = token.clone();
        let post_id = post.id;
        handles.push(tokio::spawn(async move {
            let mut client = ApiClient::new(&base_url);
            client.set_token(Some(token));
            client.toggle_like(post_id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("toggle failed");
    }

    let id = user_id(&app, "eve").await;
    let rows = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT Count(*) FROM likes WHERE user_id = $1 AND post_id = $2",
    )
    .bind(id)
    .bind(post.id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert!(rows <= 1, "expected 0 or 1 like rows, found {}", rows);
}

#[tokio::test]
async fn self_follow_is_rejected_and_writes_nothing() {
    let app = spawn_app().await;
    let client = register(&app, "frank").await;

    let err = client.toggle_follow("frank").await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let id = user_id(&app, "frank").await;
    let rows = sqlx::query_scalar::<Sqlite, i64>(
        "SELECT Count(*) FROM follows WHERE follower_id = $1",
    )
    .bind(id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn follow_toggle_flips_the_profile_flag() {
    let app = spawn_app().await;
    register(&app, "gina").await;
    let client = register(&app, "hank").await;

    let state = client.toggle_follow("gina").await.unwrap();
    assert!(state.following);
    assert!(client.get_profile("gina").await.unwrap().following);

    let state = client.toggle_follow("gina").await.unwrap();
    assert!(!state.following);
    assert!(!client.get_profile("gina").await.unwrap().following);

    let err = client.toggle_follow("nobody").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn pagination_drains_the_full_set_without_dups_or_gaps() {
    let app = spawn_app().await;
    let client = register(&app, "iris").await;
    for n in 0..25 {
        client
            .create_post(&format!("post {:02}", n), "body")
            .await
            .unwrap();
    }

    // Page through by hand first: full pages carry a cursor, the short tail
    // page signals exhaustion.
    let first = client
        .list_posts(Some("iris"), None, 10, None)
        .await
        .unwrap();
    assert_eq!(first.items.len(), 10);
    let cursor = first.next_cursor.clone().expect("full page needs a cursor");

    let second = client
        .list_posts(Some("iris"), None, 10, Some(cursor))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 10);

    let third = client
        .list_posts(Some("iris"), None, 10, second.next_cursor.clone())
        .await
        .unwrap();
    assert_eq!(third.items.len(), 5);
    assert!(third.next_cursor.is_none());

    let all = drain_pages(
        |cursor| client.list_posts(Some("iris"), None, 10, cursor),
        |post| post.id,
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 25);
    // Newest first with the id tie-break; all 25 were created within the
    // same few seconds so ties are the common case here.
    for pair in all.windows(2) {
        assert!(pair[0].id > pair[1].id);
    }
}

#[tokio::test]
async fn malformed_cursor_is_a_400() {
    let app = spawn_app().await;
    let client = register(&app, "jack").await;
    let err = client
        .list_posts(None, None, 10, Some("not-a-cursor".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn search_matches_title_and_content() {
    let app = spawn_app().await;
    let client = register(&app, "kate").await;
    client.create_post("rust tricks", "ownership").await.unwrap();
    client.create_post("gardening", "borrow a rake").await.unwrap();
    client.create_post("cooking", "pasta").await.unwrap();

    let hits = client
        .list_posts(None, Some("rust"), 10, None)
        .await
        .unwrap();
    assert_eq!(hits.items.len(), 1);

    let hits = client
        .list_posts(None, Some("borrow"), 10, None)
        .await
        .unwrap();
    assert_eq!(hits.items.len(), 1);
    assert_eq!(hits.items[0].title, "gardening");
}

#[tokio::test]
async fn feed_contains_only_followed_authors() {
    let app = spawn_app().await;
    let reader = register(&app, "lena").await;
    let followed = register(&app, "mick").await;
    let stranger = register(&app, "nora").await;

    followed.create_post("from mick", "...").await.unwrap();
    stranger.create_post("from nora", "...").await.unwrap();
    reader.toggle_follow("mick").await.unwrap();

    let feed = reader.feed(10, None).await.unwrap();
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].author.username, "mick");
    assert!(feed.items[0].author.following);
}

#[tokio::test]
async fn bookmark_toggle_and_listing() {
    let app = spawn_app().await;
    let client = register(&app, "omar").await;
    let a = client.create_post("a", "...").await.unwrap();
    let b = client.create_post("b", "...").await.unwrap();

    assert!(client.toggle_bookmark(a.id).await.unwrap().bookmarked);
    assert!(client.toggle_bookmark(b.id).await.unwrap().bookmarked);

    let marks = client.bookmarks(10, None).await.unwrap();
    assert_eq!(marks.items.len(), 2);
    assert!(marks.items.iter().all(|post| post.is_bookmarked));

    assert!(!client.toggle_bookmark(a.id).await.unwrap().bookmarked);
    let marks = client.bookmarks(10, None).await.unwrap();
    assert_eq!(marks.items.len(), 1);
    assert_eq!(marks.items[0].id, b.id);

    let err = client.toggle_bookmark(999_999).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn comments_on_a_missing_post_are_404_not_empty() {
    let app = spawn_app().await;
    let client = register(&app, "pete").await;
    let err = client.list_comments(999_999, 10, None).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = client.create_comment(999_999, "hi").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn comments_are_author_owned() {
    let app = spawn_app().await;
    let author = register(&app, "quinn").await;
    let other = register(&app, "rhea").await;
    let post = author.create_post("discuss", "...").await.unwrap();

    let comment = author.create_comment(post.id, "first!").await.unwrap();
    assert_eq!(comment.author.username, "quinn");

    let err = other
        .update_comment(post.id, comment.id, "hijacked")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    let err = other.delete_comment(post.id, comment.id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let edited = author
        .update_comment(post.id, comment.id, "first, edited")
        .await
        .unwrap();
    assert_eq!(edited.content, "first, edited");

    author.delete_comment(post.id, comment.id).await.unwrap();
    let comments = author.list_comments(post.id, 10, None).await.unwrap();
    assert!(comments.items.is_empty());
}

#[tokio::test]
async fn comment_listing_pages_newest_first() {
    let app = spawn_app().await;
    let client = register(&app, "sara").await;
    let post = client.create_post("thread", "...").await.unwrap();
    for n in 0..7 {
        client
            .create_comment(post.id, &format!("comment {}", n))
            .await
            .unwrap();
    }

    let all = drain_pages(
        |cursor| client.list_comments(post.id, 3, cursor),
        |comment| comment.id,
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0].content, "comment 6");
    assert_eq!(all[6].content, "comment 0");

    let view = client.get_post(post.id).await.unwrap();
    assert_eq!(view.comment_count, 7);
}

#[tokio::test]
async fn posts_are_author_owned() {
    let app = spawn_app().await;
    let author = register(&app, "tess").await;
    let other = register(&app, "uma").await;
    let post = author.create_post("mine", "original").await.unwrap();

    let err = other
        .update_post(
            post.id,
            &UpdatePostRequest {
                content: Some("stolen".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    let err = other.delete_post(post.id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let updated = author
        .update_post(
            post.id,
            &UpdatePostRequest {
                content: Some("revised".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.content, "revised");

    author.delete_post(post.id).await.unwrap();
    let err = author.get_post(post.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn optimistic_like_rolls_back_when_the_request_fails() {
    let app = spawn_app().await;
    let author = register(&app, "vera").await;
    let post = author.create_post("popular", "...").await.unwrap();

    // Anonymous client: the toggle will come back 401 and the view model
    // must end up exactly where it started.
    let anonymous = app.client();
    let before = LikeState {
        liked: false,
        like_count: 0,
    };
    let mut view = Optimistic::new(before);

    let result = mutate(
        &mut view,
        |state| {
            state.liked = true;
            state.like_count += 1;
        },
        || async {
            anonymous
                .toggle_like(post.id)
                .await
                .map(Some)
        },
    )
    .await;

    assert!(result.is_err());
    assert!(view.is_settled());
    assert_eq!(*view.get(), before);

    // And the happy path settles on the server's authoritative state.
    let result = mutate(
        &mut view,
        |state| {
            state.liked = true;
            state.like_count += 1;
        },
        || async { author.toggle_like(post.id).await.map(Some) },
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(
        *view.get(),
        LikeState {
            liked: true,
            like_count: 1
        }
    );
}
