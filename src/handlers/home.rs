use actix_web::{web::Data, HttpResponse};
use serde::Serialize;

use crate::{
    analytics::Event,
    core::listing::{self, SortOrder},
    error::{ApiResponse, AppError},
    server::AppState,
    types::{BlogPost, Course, ProfileLinks, Project},
};

const LATEST_POSTS: usize = 3;

#[derive(Serialize)]
struct ProfileSummary {
    full_name: String,
    title: String,
    bio: String,
    avatar_url: String,
    links: ProfileLinks,
}

#[derive(Serialize)]
struct SiteStats {
    projects: usize,
    courses: usize,
    blog_posts: usize,
    materials: usize,
}

#[derive(Serialize)]
struct HomeView {
    profile: ProfileSummary,
    featured_projects: Vec<Project>,
    featured_courses: Vec<Course>,
    latest_posts: Vec<BlogPost>,
    stats: SiteStats,
}

/// Landing page payload. Each call counts as a visit.
pub async fn home(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    state.store.track(Event::Visit).await;

    let store = &state.store;
    let profile = store.profile.get().await;
    let mut posts = store.blogs.all().await;
    let stats = SiteStats {
        projects: store.projects.len().await,
        courses: store.courses.len().await,
        blog_posts: posts.len(),
        materials: store.materials.len().await,
    };
    listing::sort(&mut posts, SortOrder::Latest);
    posts.truncate(LATEST_POSTS);

    Ok(ApiResponse::success(HomeView {
        profile: ProfileSummary {
            full_name: profile.full_name,
            title: profile.title,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            links: profile.links,
        },
        featured_projects: store.projects.filter(|project| project.featured).await,
        featured_courses: store.courses.filter(|course| course.featured).await,
        latest_posts: posts,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use chrono::NaiveDate;
    use serde_json::Value;

    use crate::handlers::testing::{env, test_app};
    use crate::types::BlogPost;

    #[actix_web::test]
    async fn home_lists_latest_three_posts_and_counts_visit() {
        let env = env();
        let app = test_app!(env.state);
        for day in 1..=5 {
            env.state
                .store
                .blogs
                .insert(BlogPost {
                    id: 0,
                    title: format!("Post {}", day),
                    excerpt: "An excerpt for the post.".to_string(),
                    content: "body".to_string(),
                    date: NaiveDate::from_ymd_opt(2023, 3, day).unwrap(),
                    author: "Hadi Hijazi".to_string(),
                    image_url: String::new(),
                    category: "React".to_string(),
                    tags: Vec::new(),
                    featured: false,
                    comment_count: 0,
                })
                .await
                .unwrap();
        }

        let req = test::TestRequest::get().uri("/api/home").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let titles: Vec<&str> = body["data"]["latest_posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|post| post["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Post 5", "Post 4", "Post 3"]);
        assert_eq!(body["data"]["stats"]["blog_posts"], 5);
        assert_eq!(body["data"]["profile"]["full_name"], "New Owner");
        assert_eq!(env.state.store.analytics.get().await.totals().visits, 1);
    }
}
