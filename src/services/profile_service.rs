use futures::try_join;
use uuid::Uuid;

use crate::dtos::user_dtos::{ProfileOut, ProfileStats};
use crate::models::user::User;
use crate::repositories::follow_repository::FollowRepository;
use crate::repositories::post_repository::PostRepository;
use crate::repositories::postgrest::{RepoError, SupabaseRest};
use crate::repositories::user_repository::UserRepository;

/// Profile of `user_id` as seen by `viewer`; `None` when the user is unknown.
pub async fn load_profile(
    rest: &SupabaseRest,
    user_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Option<ProfileOut>, RepoError> {
    let Some(user) = UserRepository::find_by_id(rest, user_id).await? else {
        return Ok(None);
    };
    profile_for(rest, user, viewer).await.map(Some)
}

/// Gathers the counters for an already loaded user.
pub async fn profile_for(rest: &SupabaseRest, user: User, viewer: Option<Uuid>) -> Result<ProfileOut, RepoError> {
    let user_id = user.id;
    let is_self = viewer == Some(user_id);

    let is_following = async {
        match viewer {
            Some(viewer_id) if viewer_id != user_id => FollowRepository::exists(rest, viewer_id, user_id).await,
            _ => Ok(false),
        }
    };

    let (posts, followers, following, is_following) = try_join!(
        PostRepository::count_by_user(rest, user_id),
        FollowRepository::count_followers(rest, user_id),
        FollowRepository::count_following(rest, user_id),
        is_following
    )?;

    Ok(ProfileOut {
        user,
        stats: ProfileStats { posts, followers, following },
        is_following,
        is_self,
    })
}
