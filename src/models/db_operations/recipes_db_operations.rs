use crate::helper::input_helpers::RecipeInput;
use crate::helper::slug_helpers::{slug_candidates, slugify};
use crate::models::{Recipe, RecipeSummary};
use chrono::Utc;
use redb::{
    CommitError, Database, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Recipe documents, one JSON value per recipe.
pub const RECIPES: TableDefinition<&[u8; 16], &str> = TableDefinition::new("recipes");
/// Unique slug -> recipe id. Doubles as the uniqueness probe for slug
/// assignment, inside the same write transaction as the insert.
pub const SLUG_INDEX: TableDefinition<&str, &[u8; 16]> = TableDefinition::new("slug_index");
/// Negated created-at timestamp -> id, so iteration order is newest first.
pub const CHRONOLOGICAL_INDEX: TableDefinition<(i64, &[u8; 16]), ()> =
    TableDefinition::new("chronological_index");

/// Listing filter. Drafts stay hidden unless `include_drafts` is set, and
/// the route layer only sets it for an authenticated caller.
#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    pub include_drafts: bool,
    pub featured_only: bool,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListFilter {
    fn matches(&self, recipe: &Recipe) -> bool {
        if !self.include_drafts && !recipe.is_published {
            return false;
        }
        if self.featured_only && !recipe.is_featured {
            return false;
        }
        if let Some(category) = self.category.as_deref() {
            if !category.is_empty() && category != "all" && recipe.category != category {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            if !needle.is_empty() {
                let haystack_hit = recipe.title.to_lowercase().contains(&needle)
                    || recipe.description.to_lowercase().contains(&needle)
                    || recipe.focus_keyword.to_lowercase().contains(&needle);
                if !haystack_hit {
                    return false;
                }
            }
        }
        true
    }
}

/// Creates a recipe: normalizes the input, assigns id, creation time and a
/// unique slug, and writes the document plus both index entries in one
/// transaction. Missing optional content defaults; creation never rejects.
pub fn create_recipe(db: &Database, input: RecipeInput) -> Result<Recipe, DbError> {
    let id = Uuid::new_v4();
    let mut recipe = Recipe::new(id, Utc::now());
    input.apply_to(&mut recipe);

    let base_slug = slugify(&recipe.title);
    let id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    {
        let mut recipes_table = write_txn.open_table(RECIPES)?;
        let mut slug_index = write_txn.open_table(SLUG_INDEX)?;
        let mut chrono_index = write_txn.open_table(CHRONOLOGICAL_INDEX)?;

        let mut chosen = None;
        for candidate in slug_candidates(&base_slug) {
            if slug_index.get(candidate.as_str())?.is_none() {
                chosen = Some(candidate);
                break;
            }
        }
        // The last candidate carries a millisecond timestamp; if even that
        // is taken, a random suffix settles it.
        recipe.slug =
            chosen.unwrap_or_else(|| format!("{}-{}", base_slug, Uuid::new_v4().simple()));

        let document = serde_json::to_string(&recipe)?;
        recipes_table.insert(&id_bytes, document.as_str())?;
        slug_index.insert(recipe.slug.as_str(), &id_bytes)?;
        chrono_index.insert((-recipe.created_at.timestamp(), &id_bytes), ())?;
    }
    write_txn.commit()?;

    Ok(recipe)
}

/// Fetches one recipe by primary key or slug, dispatching on shape: a token
/// that parses as a UUID is an id, anything else is a slug. No side effect.
pub fn read_recipe(db: &Database, id_or_slug: &str) -> Result<Option<Recipe>, DbError> {
    let read_txn = db.begin_read()?;
    let recipes_table = read_txn.open_table(RECIPES)?;

    let id_bytes = match Uuid::parse_str(id_or_slug) {
        Ok(id) => id.into_bytes(),
        Err(_) => {
            let slug_index = read_txn.open_table(SLUG_INDEX)?;
            let found = slug_index.get(id_or_slug)?.map(|guard| *guard.value());
            match found {
                Some(bytes) => bytes,
                None => return Ok(None),
            }
        }
    };

    let result = match recipes_table.get(&id_bytes)? {
        Some(guard) => Some(serde_json::from_str(guard.value())?),
        None => None,
    };
    Ok(result)
}

/// Detail-page read: fetches by id or slug and increments the view counter
/// by exactly one. Best effort only; nothing de-duplicates viewers.
pub fn read_recipe_and_bump_views(
    db: &Database,
    id_or_slug: &str,
) -> Result<Option<Recipe>, DbError> {
    let write_txn = db.begin_write()?;
    let updated = {
        let mut recipes_table = write_txn.open_table(RECIPES)?;

        let id_bytes = match Uuid::parse_str(id_or_slug) {
            Ok(id) => Some(id.into_bytes()),
            Err(_) => {
                let slug_index = write_txn.open_table(SLUG_INDEX)?;
                let found = slug_index.get(id_or_slug)?.map(|guard| *guard.value());
                found
            }
        };

        match id_bytes {
            Some(id_bytes) => {
                let existing: Option<Recipe> = match recipes_table.get(&id_bytes)? {
                    Some(guard) => Some(serde_json::from_str(guard.value())?),
                    None => None,
                };
                match existing {
                    Some(mut recipe) => {
                        recipe.views += 1;
                        let document = serde_json::to_string(&recipe)?;
                        recipes_table.insert(&id_bytes, document.as_str())?;
                        Some(recipe)
                    }
                    None => None,
                }
            }
            None => None,
        }
    };
    write_txn.commit()?;

    Ok(updated)
}

/// Newest-first listing with publication/category/featured/search filters.
/// Returns one page of summaries plus the total match count so the route
/// layer can report page counts. A filtered scan is fine at blog scale.
pub fn list_recipes(
    db: &Database,
    filter: &ListFilter,
) -> Result<(Vec<RecipeSummary>, u64), DbError> {
    let read_txn = db.begin_read()?;
    let chrono_index = read_txn.open_table(CHRONOLOGICAL_INDEX)?;
    let recipes_table = read_txn.open_table(RECIPES)?;

    let mut matches: Vec<RecipeSummary> = Vec::new();
    for entry in chrono_index.iter()? {
        let (key, _) = entry?;
        let id_bytes = *key.value().1;
        if let Some(guard) = recipes_table.get(&id_bytes)? {
            let recipe: Recipe = serde_json::from_str(guard.value())?;
            if filter.matches(&recipe) {
                matches.push(RecipeSummary::from(&recipe));
            }
        }
    }

    let total = matches.len() as u64;
    let page = filter.page.max(1);
    let limit = filter.limit.max(1);
    let page_items = matches
        .into_iter()
        .skip((page as usize - 1).saturating_mul(limit as usize))
        .take(limit as usize)
        .collect();

    Ok((page_items, total))
}

/// Merges the supplied fields into the stored document. The slug is never
/// re-derived, even when the title changes; `updated_at` is set here and
/// nowhere else. Returns `None` when the id is unknown.
pub fn update_recipe(
    db: &Database,
    id: Uuid,
    input: RecipeInput,
) -> Result<Option<Recipe>, DbError> {
    let id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let updated = {
        let mut recipes_table = write_txn.open_table(RECIPES)?;

        let existing: Option<Recipe> = match recipes_table.get(&id_bytes)? {
            Some(guard) => Some(serde_json::from_str(guard.value())?),
            None => None,
        };
        match existing {
            Some(mut recipe) => {
                input.apply_to(&mut recipe);
                recipe.updated_at = Some(Utc::now());
                let document = serde_json::to_string(&recipe)?;
                recipes_table.insert(&id_bytes, document.as_str())?;
                Some(recipe)
            }
            None => None,
        }
    };
    write_txn.commit()?;

    Ok(updated)
}

/// Hard delete: removes the document and its slug/chronological index
/// entries. Returns `false` when the id does not exist; no tombstone, no
/// cascade (nothing references a recipe by foreign key).
pub fn delete_recipe(db: &Database, id: Uuid) -> Result<bool, DbError> {
    let id_bytes = id.into_bytes();

    let write_txn = db.begin_write()?;
    let removed = {
        let mut recipes_table = write_txn.open_table(RECIPES)?;
        let mut slug_index = write_txn.open_table(SLUG_INDEX)?;
        let mut chrono_index = write_txn.open_table(CHRONOLOGICAL_INDEX)?;

        let old: Option<Recipe> = match recipes_table.remove(&id_bytes)? {
            Some(guard) => Some(serde_json::from_str(guard.value())?),
            None => None,
        };
        match old {
            Some(recipe) => {
                slug_index.remove(recipe.slug.as_str())?;
                chrono_index.remove((-recipe.created_at.timestamp(), &id_bytes))?;
                true
            }
            None => false,
        }
    };
    write_txn.commit()?;

    Ok(removed)
}
