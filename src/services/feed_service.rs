// src/services/feed_service.rs - feed pages and post details assembled from per-post queries
use futures::future::try_join_all;
use futures::try_join;
use uuid::Uuid;

use crate::dtos::comment_dtos::CommentOut;
use crate::dtos::pagination::Page;
use crate::dtos::post_dtos::{FeedPageOut, FeedPostOut, PostDetailOut};
use crate::repositories::comment_repository::CommentRepository;
use crate::repositories::like_repository::LikeRepository;
use crate::repositories::post_repository::{PostRepository, PostWithAuthor};
use crate::repositories::postgrest::{RepoError, SupabaseRest};

pub const RECENT_COMMENTS_PER_POST: usize = 2;

/// Per-post aggregates shown in the feed.
struct PostStats {
    like_count: u64,
    comment_count: u64,
    liked_by_me: bool,
    recent_comments: Vec<CommentOut>,
}

async fn liked_by(rest: &SupabaseRest, post_id: Uuid, viewer: Option<Uuid>) -> Result<bool, RepoError> {
    match viewer {
        Some(viewer_id) => LikeRepository::exists(rest, post_id, viewer_id).await,
        None => Ok(false),
    }
}

/// Counts are `count=exact` totals, never the length of a returned row set.
async fn post_stats(rest: &SupabaseRest, post_id: Uuid, viewer: Option<Uuid>) -> Result<PostStats, RepoError> {
    let (like_count, comment_count, liked_by_me, mut recent_comments) = try_join!(
        LikeRepository::count_for_post(rest, post_id),
        CommentRepository::count_for_post(rest, post_id),
        liked_by(rest, post_id, viewer),
        CommentRepository::list_recent(rest, post_id, RECENT_COMMENTS_PER_POST)
    )?;

    // fetched newest first, shown oldest first
    recent_comments.reverse();
    Ok(PostStats { like_count, comment_count, liked_by_me, recent_comments })
}

fn feed_post(post: PostWithAuthor, stats: PostStats, viewer: Option<Uuid>) -> FeedPostOut {
    FeedPostOut {
        is_own_post: viewer == Some(post.user_id),
        id: post.id,
        user_id: post.user_id,
        image_url: post.image_url,
        caption: post.caption,
        created_at: post.created_at,
        author: post.author,
        like_count: stats.like_count,
        comment_count: stats.comment_count,
        liked_by_me: stats.liked_by_me,
        recent_comments: stats.recent_comments,
    }
}

/// One page of posts (optionally a single author's) with like and comment
/// counts and the latest comments. Each post's aggregates are fetched
/// concurrently once the page is known.
pub async fn load_feed(
    rest: &SupabaseRest,
    viewer: Option<Uuid>,
    page: Page,
    author_id: Option<Uuid>,
) -> Result<FeedPageOut, RepoError> {
    let (posts, total) = PostRepository::list_page(rest, author_id, page.offset(), page.limit).await?;
    let stats = try_join_all(posts.iter().map(|p| post_stats(rest, p.id, viewer))).await?;

    let has_more = page.has_more(posts.len(), total);
    Ok(FeedPageOut {
        posts: posts
            .into_iter()
            .zip(stats)
            .map(|(post, stats)| feed_post(post, stats, viewer))
            .collect(),
        page: page.page,
        limit: page.limit,
        total,
        has_more,
    })
}

pub async fn load_post_detail(
    rest: &SupabaseRest,
    post_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Option<PostDetailOut>, RepoError> {
    let Some(post) = PostRepository::find_with_author(rest, post_id).await? else {
        return Ok(None);
    };

    let (like_count, liked_by_me, comments) = try_join!(
        LikeRepository::count_for_post(rest, post_id),
        liked_by(rest, post_id, viewer),
        CommentRepository::list_for_post(rest, post_id)
    )?;

    Ok(Some(PostDetailOut {
        is_own_post: viewer == Some(post.user_id),
        id: post.id,
        user_id: post.user_id,
        image_url: post.image_url,
        caption: post.caption,
        created_at: post.created_at,
        author: post.author,
        like_count,
        liked_by_me,
        comments,
    }))
}
