use crate::models::db_operations::{recipes_db_operations, users_db_operations};
use crate::models::{Recipe, RecipeSummary, User};
use crate::DbPool;
use actix_web::web;
use redb::Database;

pub fn verify_user_credentials(pool: &web::Data<DbPool>, email: &str, password: &str) -> Option<User> {
    if let Ok(conn) = pool.get() {
        users_db_operations::verify_credentials(&conn, email, password)
    } else {
        None
    }
}

pub fn record_login(pool: &web::Data<DbPool>, email: &str) {
    if let Ok(conn) = pool.get() {
        if let Err(e) = users_db_operations::update_last_login_time(&conn, email) {
            log::warn!("Failed to record last login time for '{}': {}", email, e);
        }
    }
}

/// Detail-page fetch: bumps the view counter as a side effect.
pub fn fetch_recipe_for_display(
    db: &web::Data<Database>,
    id_or_slug: &str,
) -> Result<Option<Recipe>, recipes_db_operations::DbError> {
    recipes_db_operations::read_recipe_and_bump_views(db, id_or_slug)
}

pub fn fetch_recipes(
    db: &web::Data<Database>,
    filter: &recipes_db_operations::ListFilter,
) -> Result<(Vec<RecipeSummary>, u64), recipes_db_operations::DbError> {
    recipes_db_operations::list_recipes(db, filter)
}
