use uuid::Uuid;

use crate::users::repo_types::Role;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Requester {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Recipes are mutated and deleted by their owner or an admin.
pub fn can_modify_recipe(requester: &Requester, recipe_owner: Uuid) -> bool {
    requester.is_admin() || requester.id == recipe_owner
}

/// Comments are moderated by their author, the owner of the recipe they sit
/// on, or an admin.
pub fn can_delete_comment(requester: &Requester, comment_author: Uuid, recipe_owner: Uuid) -> bool {
    requester.is_admin() || requester.id == comment_author || requester.id == recipe_owner
}
