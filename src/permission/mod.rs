//! Role and ownership predicates
//!
//! Two predicates compose per endpoint: admin-or-read-only alone guards the
//! catalog surfaces (titles, categories, genres), and the review/comment
//! endpoints accept it OR author-or-moderator. Moderators get PATCH and
//! DELETE on other people's content, never create.

use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use actix_web::{error, http::Method, Error};

/// Read methods that always pass.
pub fn is_safe(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

/// Verbs a moderator may use on someone else's content.
fn is_moderator_method(method: &Method) -> bool {
    *method == Method::PATCH || *method == Method::DELETE
}

/// Safe methods pass; unsafe methods require an authenticated admin.
pub fn admin_or_read_only(client: &ClientCtx, method: &Method) -> bool {
    is_safe(method) || client.is_admin()
}

/// The resource's author may do anything to it; a moderator only
/// PATCH/DELETE.
pub fn author_or_moderator(client: &ClientCtx, method: &Method, author_id: i32) -> bool {
    if is_safe(method) {
        return true;
    }
    if client.get_id() == Some(author_id) {
        return true;
    }
    is_moderator_method(method) && client.has_role(Role::Moderator)
}

/// Endpoint-level combination used by review/comment mutation.
pub fn can_modify_content(client: &ClientCtx, method: &Method, author_id: i32) -> bool {
    admin_or_read_only(client, method) || author_or_moderator(client, method, author_id)
}

/// Guard for review/comment mutation: 401 for guests, 403 when the
/// combined predicate denies.
pub fn require_content_permission(
    client: &ClientCtx,
    method: &Method,
    author_id: i32,
) -> Result<(), Error> {
    client.require_login()?;
    if !can_modify_content(client, method, author_id) {
        return Err(error::ErrorForbidden("Insufficient permissions"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::users;
    use chrono::Utc;

    fn user_with_role(id: i32, role: Role) -> ClientCtx {
        ClientCtx::for_user(users::Model {
            id,
            email: format!("user{}@example.com", id),
            username: format!("user{}", id),
            role,
            bio: None,
            first_name: None,
            last_name: None,
            is_superuser: false,
            created_at: Utc::now().naive_utc(),
        })
    }

    fn superuser(id: i32) -> ClientCtx {
        ClientCtx::for_user(users::Model {
            id,
            email: format!("root{}@example.com", id),
            username: format!("root{}", id),
            role: Role::User,
            bio: None,
            first_name: None,
            last_name: None,
            is_superuser: true,
            created_at: Utc::now().naive_utc(),
        })
    }

    #[test]
    fn safe_methods_always_pass_admin_or_read_only() {
        let guest = ClientCtx::guest();
        assert!(admin_or_read_only(&guest, &Method::GET));
        assert!(admin_or_read_only(&guest, &Method::HEAD));
        assert!(admin_or_read_only(&guest, &Method::OPTIONS));
        assert!(!admin_or_read_only(&guest, &Method::POST));
    }

    #[test]
    fn only_admins_pass_unsafe_admin_or_read_only() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(!admin_or_read_only(&user_with_role(1, Role::User), &method));
            assert!(!admin_or_read_only(
                &user_with_role(2, Role::Moderator),
                &method
            ));
            assert!(admin_or_read_only(&user_with_role(3, Role::Admin), &method));
            assert!(admin_or_read_only(&superuser(4), &method));
        }
    }

    #[test]
    fn author_passes_all_verbs_on_own_content() {
        let author = user_with_role(5, Role::User);
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(author_or_moderator(&author, &method, 5));
        }
    }

    #[test]
    fn moderator_limited_to_patch_and_delete() {
        let moderator = user_with_role(6, Role::Moderator);
        assert!(author_or_moderator(&moderator, &Method::PATCH, 99));
        assert!(author_or_moderator(&moderator, &Method::DELETE, 99));
        assert!(!author_or_moderator(&moderator, &Method::PUT, 99));
        assert!(!author_or_moderator(&moderator, &Method::POST, 99));
    }

    #[test]
    fn plain_user_cannot_touch_others_content() {
        let user = user_with_role(7, Role::User);
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(!can_modify_content(&user, &method, 99));
        }
    }

    #[test]
    fn admin_passes_combined_predicate_everywhere() {
        let admin = user_with_role(8, Role::Admin);
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(can_modify_content(&admin, &method, 99));
        }
    }

    #[test]
    fn admin_outranks_moderator() {
        let admin = user_with_role(9, Role::Admin);
        assert!(admin.has_role(Role::Moderator));
        let user = user_with_role(10, Role::User);
        assert!(!user.has_role(Role::Moderator));
    }
}
