use pinnwand_common::model::{
    post::{PostOrderField, PostOrdering},
    profile::{ProfileOrderField, ProfileOrdering},
};

pub(crate) const DEFAULT_PAGE_LIMIT: u32 = 50;
pub(crate) const MAX_PAGE_LIMIT: u32 = 100;

/// Resolves the requested pagination window into bindable `LIMIT`/`OFFSET`
/// values, clamping the limit to [`MAX_PAGE_LIMIT`].
pub(crate) fn page_window(limit: Option<u32>, offset: Option<u32>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
    (i64::from(limit), i64::from(offset.unwrap_or(0)))
}

/// Escapes `LIKE` metacharacters so a search term only ever matches
/// literally.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Substring-match pattern for `ILIKE` from a raw search term.
pub(crate) fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

fn direction(descending: bool) -> &'static str {
    if descending { "DESC" } else { "ASC" }
}

/// `ORDER BY` clause for the post list. The sort expression comes from a
/// fixed table, never from request input; the id tiebreak keeps pages
/// stable.
pub(crate) fn post_order_clause(ordering: PostOrdering) -> String {
    let expression = match ordering.field {
        PostOrderField::CommentsCount => "comments_count",
        PostOrderField::LikesCount => "likes_count",
        PostOrderField::LikesCreatedAt => "MAX(likes.created_at)",
        PostOrderField::CreatedAt => "posts.created_at",
        PostOrderField::UpdatedAt => "posts.updated_at",
    };
    // MAX over the joined likes is NULL for never-liked posts; keep those
    // trailing instead of letting DESC float the NULLs to the top.
    let nulls = match ordering.field {
        PostOrderField::LikesCreatedAt if ordering.descending => " NULLS LAST",
        _ => "",
    };

    format!(
        "ORDER BY {expression} {}{nulls}, posts.post_id DESC",
        direction(ordering.descending)
    )
}

/// `ORDER BY` clause for the profile list.
pub(crate) fn profile_order_clause(ordering: ProfileOrdering) -> String {
    let expression = match ordering.field {
        ProfileOrderField::PostsCount => "posts_count",
        ProfileOrderField::FollowersCount => "followers_count",
        ProfileOrderField::FollowingCount => "following_count",
        ProfileOrderField::FollowingAt => "MAX(following_edges.created_at)",
        ProfileOrderField::FollowedAt => "MAX(followed_edges.created_at)",
        ProfileOrderField::CreatedAt => "profiles.created_at",
    };
    let nulls = match ordering.field {
        ProfileOrderField::FollowingAt | ProfileOrderField::FollowedAt
            if ordering.descending =>
        {
            " NULLS LAST"
        }
        _ => "",
    };

    format!(
        "ORDER BY {expression} {}{nulls}, profiles.profile_id DESC",
        direction(ordering.descending)
    )
}

#[cfg(test)]
mod tests {
    use crate::query::{
        MAX_PAGE_LIMIT, contains_pattern, escape_like, page_window, post_order_clause,
        profile_order_clause,
    };
    use pinnwand_common::model::{
        post::PostOrdering,
        profile::{ProfileOrderField, ProfileOrdering},
    };
    use std::str::FromStr;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (50, 0));
        assert_eq!(page_window(Some(10), Some(30)), (10, 30));
        assert_eq!(page_window(Some(100_000), None), (i64::from(MAX_PAGE_LIMIT), 0));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn post_order_clauses() {
        assert_eq!(
            post_order_clause(PostOrdering::default()),
            "ORDER BY posts.created_at DESC, posts.post_id DESC"
        );
        assert_eq!(
            post_order_clause(PostOrdering::from_str("likes_count").unwrap()),
            "ORDER BY likes_count ASC, posts.post_id DESC"
        );
        assert_eq!(
            post_order_clause(PostOrdering::from_str("-likes_created_at").unwrap()),
            "ORDER BY MAX(likes.created_at) DESC NULLS LAST, posts.post_id DESC"
        );
    }

    #[test]
    fn profile_order_clauses() {
        assert_eq!(
            profile_order_clause(ProfileOrdering::default()),
            "ORDER BY profiles.created_at DESC, profiles.profile_id DESC"
        );
        assert_eq!(
            profile_order_clause(ProfileOrdering {
                field: ProfileOrderField::FollowersCount,
                descending: true,
            }),
            "ORDER BY followers_count DESC, profiles.profile_id DESC"
        );
        assert_eq!(
            profile_order_clause(ProfileOrdering::from_str("-followed_at").unwrap()),
            "ORDER BY MAX(followed_edges.created_at) DESC NULLS LAST, profiles.profile_id DESC"
        );
    }
}
