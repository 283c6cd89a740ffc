use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    core::{
        listing::{self, SortOrder},
        validation::{non_blank, Validate},
    },
    error::{ApiResponse, AppError},
    forms::CommentForm,
    handlers::{adjust_likes, AdminSession},
    server::AppState,
    types::{BlogPost, Comment, CommentAuthor, CommentThread},
};

const RELATED_POSTS: usize = 3;

#[derive(Serialize)]
struct BlogDetail {
    post: BlogPost,
    comments: Vec<CommentThread>,
    related: Vec<BlogPost>,
}

/// Newest threads first; replies stay in the order they were written.
/// Replies whose parent is gone are dropped.
pub fn threads(comments: Vec<Comment>) -> Vec<CommentThread> {
    let (roots, replies): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut threads: Vec<CommentThread> = roots
        .into_iter()
        .map(|comment| CommentThread {
            comment,
            replies: Vec::new(),
        })
        .collect();
    for reply in replies {
        if let Some(thread) = threads
            .iter_mut()
            .find(|thread| Some(thread.comment.id) == reply.parent_id)
        {
            thread.replies.push(reply);
        }
    }
    for thread in &mut threads {
        thread.replies.sort_by(|a, b| a.date.cmp(&b.date));
    }
    threads.sort_by(|a, b| b.comment.date.cmp(&a.comment.date));
    threads
}

/// Other posts in the same category, latest first.
fn related(post: &BlogPost, mut posts: Vec<BlogPost>) -> Vec<BlogPost> {
    posts.retain(|other| {
        other.id != post.id && other.category.eq_ignore_ascii_case(&post.category)
    });
    listing::sort(&mut posts, SortOrder::Latest);
    posts.truncate(RELATED_POSTS);
    posts
}

async fn post_comments(state: &AppState, post_id: u32) -> Vec<Comment> {
    state
        .store
        .comments
        .filter(|comment| comment.post_id == post_id)
        .await
}

pub async fn detail(state: Data<AppState>, path: Path<u32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let post = state.store.blogs.get(id).await?;
    let comments = threads(post_comments(&state, id).await);
    let related = related(&post, state.store.blogs.all().await);
    Ok(ApiResponse::success(BlogDetail {
        post,
        comments,
        related,
    }))
}

pub async fn categories(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let posts = state.store.blogs.all().await;
    Ok(ApiResponse::success(listing::categories(&posts)))
}

/// Removes the post and every comment on it.
pub async fn delete(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    state.store.blogs.remove(id).await?;
    let removed = state
        .store
        .comments
        .remove_where(|comment| comment.post_id == id)
        .await?;
    info!("Removed {} comments with blog post {}", removed, id);
    Ok(ApiResponse::no_content())
}

pub async fn list_comments(
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.store.blogs.contains(id).await {
        return Err(AppError::NotFound("blog post"));
    }
    Ok(ApiResponse::success(threads(post_comments(&state, id).await)))
}

/// A reply to a reply is attached to the top-level comment.
pub async fn add_comment(
    state: Data<AppState>,
    path: Path<u32>,
    form: Json<CommentForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;
    let post_id = path.into_inner();
    if !state.store.blogs.contains(post_id).await {
        return Err(AppError::NotFound("blog post"));
    }

    let form = form.into_inner();
    let parent_id = match form.parent_id {
        Some(parent_id) => {
            let parent = state.store.comments.get(parent_id).await?;
            if parent.post_id != post_id {
                return Err(AppError::NotFound("comment"));
            }
            Some(parent.parent_id.unwrap_or(parent.id))
        }
        None => None,
    };

    let comment = Comment {
        id: 0,
        post_id,
        parent_id,
        author: CommentAuthor {
            name: form.author.name.trim().to_string(),
            avatar_url: non_blank(form.author.avatar_url),
        },
        content: form.content.trim().to_string(),
        date: Utc::now(),
        likes: 0,
    };
    let comment = attach_comment(&state, comment).await?;
    Ok(ApiResponse::created(comment))
}

/// Stores the comment and refreshes the post's count. If the post is gone by
/// then, the comment is taken back out.
async fn attach_comment(state: &AppState, comment: Comment) -> Result<Comment, AppError> {
    let comment = state.store.comments.insert(comment).await?;
    let post_id = comment.post_id;

    // Comments only leave together with their post, so the count never shrinks.
    let count = post_comments(state, post_id).await.len() as u32;
    let updated = state
        .store
        .blogs
        .update(post_id, |post| post.comment_count = post.comment_count.max(count))
        .await;
    if let Err(err) = updated {
        warn!("Dropping comment {} on missing blog post {}", comment.id, post_id);
        state.store.comments.remove(comment.id).await?;
        return Err(err);
    }
    Ok(comment)
}

async fn set_comment_like(
    state: &AppState,
    post_id: u32,
    comment_id: u32,
    liked: bool,
) -> Result<Comment, AppError> {
    if state.store.comments.get(comment_id).await?.post_id != post_id {
        return Err(AppError::NotFound("comment"));
    }
    adjust_likes(state, comment_id, liked).await
}

pub async fn like_comment(
    state: Data<AppState>,
    path: Path<(u32, u32)>,
) -> Result<HttpResponse, AppError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = set_comment_like(&state, post_id, comment_id, true).await?;
    Ok(ApiResponse::success(comment))
}

pub async fn unlike_comment(
    state: Data<AppState>,
    path: Path<(u32, u32)>,
) -> Result<HttpResponse, AppError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = set_comment_like(&state, post_id, comment_id, false).await?;
    Ok(ApiResponse::success(comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        http::StatusCode,
        test::{call_and_read_body_json, call_service, read_body_json, TestRequest},
    };
    use chrono::{Duration, NaiveDate};
    use serde_json::{json, Value};

    use crate::handlers::testing::{bearer, env, test_app};

    fn post(title: &str, date: &str, category: &str) -> BlogPost {
        BlogPost {
            id: 0,
            title: title.to_string(),
            excerpt: "An excerpt that is long enough.".to_string(),
            content: "x".repeat(60),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            author: "Hadi Hijazi".to_string(),
            image_url: String::new(),
            category: category.to_string(),
            tags: Vec::new(),
            featured: false,
            comment_count: 0,
        }
    }

    fn comment(id: u32, parent_id: Option<u32>, minutes: i64) -> Comment {
        Comment {
            id,
            post_id: 1,
            parent_id,
            author: CommentAuthor {
                name: "Reader".to_string(),
                avatar_url: None,
            },
            content: "Nice".to_string(),
            date: Utc::now() + Duration::minutes(minutes),
            likes: 0,
        }
    }

    #[test]
    fn threads_group_replies_under_roots() {
        let threads = threads(vec![
            comment(1, None, 0),
            comment(2, Some(1), 5),
            comment(3, None, 10),
            comment(4, Some(1), 2),
            comment(5, Some(99), 1),
        ]);

        let roots: Vec<u32> = threads.iter().map(|t| t.comment.id).collect();
        assert_eq!(roots, vec![3, 1]);
        let replies: Vec<u32> = threads[1].replies.iter().map(|c| c.id).collect();
        assert_eq!(replies, vec![4, 2]);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn related_posts_share_category_and_exclude_self() {
        let mut posts = vec![
            post("Optimize React Performance", "2023-01-15", "React"),
            post("Redux Toolkit", "2023-05-18", "React"),
            post("Responsive Layouts", "2023-04-05", "CSS"),
            post("React Router", "2023-02-20", "react"),
        ];
        for (index, post) in posts.iter_mut().enumerate() {
            post.id = index as u32 + 1;
        }

        let related = related(&posts[0], posts.clone());

        let titles: Vec<&str> = related.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Redux Toolkit", "React Router"]);
    }

    #[actix_web::test]
    async fn reply_to_reply_attaches_to_root_and_counts() {
        let env = env();
        let app = test_app!(env.state);
        env.state
            .store
            .blogs
            .insert(post("Optimize React Performance", "2023-01-15", "React"))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for parent in [None, Some(1), Some(2)] {
            let req = TestRequest::post()
                .uri("/api/blogs/1/comments")
                .set_json(json!({
                    "author": { "name": "Reader" },
                    "content": "Great write-up!",
                    "parent_id": parent
                }))
                .to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = read_body_json(resp).await;
            ids.push((body["data"]["id"].clone(), body["data"]["parent_id"].clone()));
        }

        assert_eq!(ids[1], (json!(2), json!(1)));
        assert_eq!(ids[2], (json!(3), json!(1)));
        assert_eq!(env.state.store.blogs.get(1).await.unwrap().comment_count, 3);

        let req = TestRequest::get().uri("/api/blogs/1").to_request();
        let detail: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(detail["data"]["comments"][0]["replies"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn empty_comment_is_rejected() {
        let env = env();
        let app = test_app!(env.state);
        env.state
            .store
            .blogs
            .insert(post("TypeScript Best Practices", "2023-03-10", "TypeScript"))
            .await
            .unwrap();

        let req = TestRequest::post()
            .uri("/api/blogs/1/comments")
            .set_json(json!({ "author": { "name": "Reader" }, "content": "   " }))
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(env.state.store.comments.len().await, 0);
    }

    #[actix_web::test]
    async fn comment_on_missing_post_is_not_found() {
        let env = env();
        let app = test_app!(env.state);

        let req = TestRequest::post()
            .uri("/api/blogs/7/comments")
            .set_json(json!({ "author": { "name": "Reader" }, "content": "Hello" }))
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn categories_route_is_not_an_id() {
        let env = env();
        let app = test_app!(env.state);
        for (title, category) in [("React Hooks", "React"), ("Grid Layouts", "CSS")] {
            env.state
                .store
                .blogs
                .insert(post(title, "2023-02-01", category))
                .await
                .unwrap();
        }

        let req = TestRequest::get().uri("/api/blogs/categories").to_request();
        let body: Value = call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"], json!(["all", "React", "CSS"]));
    }

    #[actix_web::test]
    async fn deleting_a_post_removes_its_comments() {
        let env = env();
        let app = test_app!(env.state);
        let auth = bearer(&env.state).await;
        env.state
            .store
            .blogs
            .insert(post("Accessible Web Apps", "2023-06-30", "Accessibility"))
            .await
            .unwrap();
        env.state.store.comments.insert(comment(0, None, 0)).await.unwrap();

        let req = TestRequest::delete()
            .uri("/api/blogs/1")
            .insert_header(auth)
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(env.state.store.comments.len().await, 0);
    }

    #[actix_web::test]
    async fn comment_on_vanished_post_is_taken_back() {
        let env = env();
        let mut orphan = comment(0, None, 0);
        orphan.post_id = 7;

        let result = attach_comment(&env.state, orphan).await;

        assert!(matches!(result, Err(AppError::NotFound("blog post"))));
        assert_eq!(env.state.store.comments.len().await, 0);
    }

    #[actix_web::test]
    async fn stale_count_never_lowers_the_stored_one() {
        let env = env();
        let mut stored = post("Optimize React Performance", "2023-01-15", "React");
        stored.comment_count = 5;
        env.state.store.blogs.insert(stored).await.unwrap();

        attach_comment(&env.state, comment(0, None, 0)).await.unwrap();

        assert_eq!(env.state.store.blogs.get(1).await.unwrap().comment_count, 5);
    }

    #[actix_web::test]
    async fn comment_like_toggles_and_checks_the_post() {
        let env = env();
        let app = test_app!(env.state);
        env.state
            .store
            .blogs
            .insert(post("Optimize React Performance", "2023-01-15", "React"))
            .await
            .unwrap();
        env.state.store.comments.insert(comment(0, None, 0)).await.unwrap();

        let req = TestRequest::post()
            .uri("/api/blogs/1/comments/1/like")
            .to_request();
        let liked: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(liked["data"]["likes"], 1);

        let req = TestRequest::delete()
            .uri("/api/blogs/1/comments/1/like")
            .to_request();
        let unliked: Value = call_and_read_body_json(&app, req).await;
        assert_eq!(unliked["data"]["likes"], 0);

        let req = TestRequest::delete()
            .uri("/api/blogs/2/comments/1/like")
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
