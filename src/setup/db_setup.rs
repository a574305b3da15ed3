use crate::models::db_operations::recipes_db_operations::{
    CHRONOLOGICAL_INDEX, RECIPES, SLUG_INDEX,
};
use redb::{CommitError, Database, StorageError, TableError, TransactionError};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
}

pub fn setup_users_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    println!("- Creating 'users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin', 'editor')),
            is_active INTEGER NOT NULL DEFAULT 1,
            last_login_time TEXT
        )",
        [],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn setup_recipes_db(db: &Database) -> Result<(), SetupError> {
    let write_txn = db.begin_write()?;
    {
        println!("- Creating 'recipes' table in Redb...");
        write_txn.open_table(RECIPES)?;

        println!("- Creating 'slug_index' table in Redb...");
        write_txn.open_table(SLUG_INDEX)?;

        println!("- Creating 'chronological_index' table in Redb...");
        write_txn.open_table(CHRONOLOGICAL_INDEX)?;
    }
    write_txn.commit()?;
    Ok(())
}
