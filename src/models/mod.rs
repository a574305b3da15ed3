use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Step {
    #[serde(default)]
    pub step_number: u32,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub tip: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NutritionalInfo {
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub protein: String,
    #[serde(default)]
    pub carbs: String,
    #[serde(default)]
    pub fat: String,
    #[serde(default)]
    pub fiber: String,
    #[serde(default)]
    pub sugar: String,
    #[serde(default)]
    pub sodium: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Faq {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// The canonical recipe document, stored as one JSON value per recipe.
///
/// Every field beyond `id`, `slug` and `created_at` carries a serde default
/// so documents written by older revisions with fewer fields still
/// deserialize; the defaults are the migration step.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Recipe {
    pub id: Uuid,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub focus_keyword: String,
    #[serde(default)]
    pub nlp_keywords: Vec<String>,
    #[serde(default)]
    pub meta_description: String,

    #[serde(default)]
    pub introduction: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub preparation_time: u32,
    #[serde(default)]
    pub cooking_time: u32,
    #[serde(default)]
    pub total_time: u32,
    #[serde(default)]
    pub servings: u32,

    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,

    #[serde(default)]
    pub healthy_alternatives: String,
    #[serde(default)]
    pub serving_suggestions: String,
    #[serde(default)]
    pub common_mistakes: String,
    #[serde(default)]
    pub storing_tips: String,
    #[serde(default)]
    pub conclusion: String,

    #[serde(default)]
    pub faqs: Vec<Faq>,

    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub views: u64,

    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// An empty document carrying only identity; content arrives through the
    /// input-normalization boundary.
    pub fn new(id: Uuid, created_at: DateTime<Utc>) -> Self {
        Recipe {
            id,
            slug: String::new(),
            title: String::new(),
            description: String::new(),
            image: String::new(),
            category: String::new(),
            focus_keyword: String::new(),
            nlp_keywords: Vec::new(),
            meta_description: String::new(),
            introduction: String::new(),
            ingredients: Vec::new(),
            preparation_time: 0,
            cooking_time: 0,
            total_time: 0,
            servings: 0,
            steps: Vec::new(),
            nutritional_info: NutritionalInfo::default(),
            healthy_alternatives: String::new(),
            serving_suggestions: String::new(),
            common_mistakes: String::new(),
            storing_tips: String::new(),
            conclusion: String::new(),
            faqs: Vec::new(),
            is_published: false,
            is_featured: false,
            views: 0,
            created_at,
            updated_at: None,
        }
    }
}

/// The listing view: enough for a card grid, none of the long-form content.
#[derive(Debug, Serialize, Clone)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub is_published: bool,
    pub is_featured: bool,
    pub views: u64,
    pub total_time: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        RecipeSummary {
            id: recipe.id,
            slug: recipe.slug.clone(),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            image: recipe.image.clone(),
            category: recipe.category.clone(),
            is_published: recipe.is_published,
            is_featured: recipe.is_featured,
            views: recipe.views,
            total_time: recipe.total_time,
            created_at: recipe.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_time: Option<String>,
}

/// What login/setup responses expose; never the hash, never the active flag.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

pub mod db_operations;
