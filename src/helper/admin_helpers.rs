use crate::helper::input_helpers::RecipeInput;
use crate::models::db_operations::{recipes_db_operations, users_db_operations};
use crate::models::{Recipe, User};
use crate::DbPool;
use actix_web::web;
use redb::Database;
use rusqlite::TransactionBehavior;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Recipe store error: {0}")]
    RecipeStore(#[from] recipes_db_operations::DbError),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("An administrator account already exists")]
    AdminAlreadyExists,
}

fn get_conn(
    pool: &web::Data<DbPool>,
) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, AdminHelperError> {
    pool.get().map_err(AdminHelperError::Pool)
}

/// One-time bootstrap: creates the first admin account, refused once any
/// admin-role record exists. The exists check and the insert run inside one
/// immediate transaction, so two racing setup requests cannot both pass the
/// check.
pub fn bootstrap_admin(
    pool: &web::Data<DbPool>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AdminHelperError> {
    let mut conn = get_conn(pool)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if users_db_operations::admin_exists(&tx)? {
        return Err(AdminHelperError::AdminAlreadyExists);
    }
    let user = users_db_operations::create_user(&tx, name, email, password, "admin")?;
    tx.commit()?;
    Ok(user)
}

pub fn create_recipe(
    db: &web::Data<Database>,
    input: RecipeInput,
) -> Result<Recipe, AdminHelperError> {
    Ok(recipes_db_operations::create_recipe(db, input)?)
}

pub fn update_recipe(
    db: &web::Data<Database>,
    id: Uuid,
    input: RecipeInput,
) -> Result<Option<Recipe>, AdminHelperError> {
    Ok(recipes_db_operations::update_recipe(db, id, input)?)
}

pub fn delete_recipe(db: &web::Data<Database>, id: Uuid) -> Result<bool, AdminHelperError> {
    Ok(recipes_db_operations::delete_recipe(db, id)?)
}
