use crate::models::{Faq, Ingredient, NutritionalInfo, Recipe, Step};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The write payload for recipes. Every field is optional: create fills the
/// gaps with defaults, update only touches the fields the caller supplied.
///
/// The admin form is sloppy about types (numbers arrive as strings, nested
/// lists sometimes arrive as JSON-encoded strings), so the numeric and list
/// fields go through lenient deserializers instead of ad hoc coercion in
/// the handlers.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,

    pub focus_keyword: Option<String>,
    #[serde(deserialize_with = "list_or_comma_string")]
    pub nlp_keywords: Option<Vec<String>>,
    pub meta_description: Option<String>,

    pub introduction: Option<String>,
    #[serde(deserialize_with = "structured_or_json_string")]
    pub ingredients: Option<Vec<Ingredient>>,

    #[serde(deserialize_with = "lenient_u32")]
    pub preparation_time: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub cooking_time: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub total_time: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub servings: Option<u32>,

    #[serde(deserialize_with = "structured_or_json_string")]
    pub steps: Option<Vec<Step>>,
    #[serde(deserialize_with = "structured_or_json_string")]
    pub nutritional_info: Option<NutritionalInfo>,

    pub healthy_alternatives: Option<String>,
    pub serving_suggestions: Option<String>,
    pub common_mistakes: Option<String>,
    pub storing_tips: Option<String>,
    pub conclusion: Option<String>,

    #[serde(deserialize_with = "structured_or_json_string")]
    pub faqs: Option<Vec<Faq>>,

    #[serde(rename = "isPublished", alias = "is_published")]
    pub is_published: Option<bool>,
    #[serde(rename = "isFeatured", alias = "is_featured")]
    pub is_featured: Option<bool>,
}

impl RecipeInput {
    /// Merges the supplied fields into `recipe`. Identity fields (`id`,
    /// `slug`, `views`, `created_at`) are never touched here; the slug in
    /// particular stays whatever it was at creation even when the title
    /// changes, so public URLs survive a re-title.
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            recipe.description = description;
        }
        if let Some(image) = self.image {
            recipe.image = image;
        }
        if let Some(category) = self.category {
            recipe.category = category.trim().to_string();
        }
        if let Some(focus_keyword) = self.focus_keyword {
            recipe.focus_keyword = focus_keyword;
        }
        if let Some(nlp_keywords) = self.nlp_keywords {
            recipe.nlp_keywords = nlp_keywords;
        }
        if let Some(meta_description) = self.meta_description {
            recipe.meta_description = meta_description;
        }
        if let Some(introduction) = self.introduction {
            recipe.introduction = introduction;
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(preparation_time) = self.preparation_time {
            recipe.preparation_time = preparation_time;
        }
        if let Some(cooking_time) = self.cooking_time {
            recipe.cooking_time = cooking_time;
        }
        if let Some(total_time) = self.total_time {
            recipe.total_time = total_time;
        }
        if let Some(servings) = self.servings {
            recipe.servings = servings;
        }
        if let Some(steps) = self.steps {
            recipe.steps = steps;
        }
        if let Some(nutritional_info) = self.nutritional_info {
            recipe.nutritional_info = nutritional_info;
        }
        if let Some(healthy_alternatives) = self.healthy_alternatives {
            recipe.healthy_alternatives = healthy_alternatives;
        }
        if let Some(serving_suggestions) = self.serving_suggestions {
            recipe.serving_suggestions = serving_suggestions;
        }
        if let Some(common_mistakes) = self.common_mistakes {
            recipe.common_mistakes = common_mistakes;
        }
        if let Some(storing_tips) = self.storing_tips {
            recipe.storing_tips = storing_tips;
        }
        if let Some(conclusion) = self.conclusion {
            recipe.conclusion = conclusion;
        }
        if let Some(faqs) = self.faqs {
            recipe.faqs = faqs;
        }
        if let Some(is_published) = self.is_published {
            recipe.is_published = is_published;
        }
        if let Some(is_featured) = self.is_featured {
            recipe.is_featured = is_featured;
        }

        // Step numbers are a dense 1-based sequence no matter what the
        // client sent; inserts and deletes in the form never leave gaps.
        renumber_steps(&mut recipe.steps);
    }
}

/// Rewrites `step_number` as 1, 2, 3, ... in list order.
pub fn renumber_steps(steps: &mut [Step]) {
    for (index, step) in steps.iter_mut().enumerate() {
        step.step_number = (index + 1) as u32;
    }
}

/// Accepts a JSON number, a numeric string, an empty string, or null.
/// Anything that does not parse as a non-negative integer becomes 0.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Null => 0,
        Value::Number(n) => n.as_u64().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(0),
        Value::String(s) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    };
    Ok(Some(parsed))
}

/// Accepts either the structured value itself or the same value serialized
/// into a JSON string (the admin form does both, depending on the tab).
/// A malformed embedded string is a validation error, not a silent default.
fn structured_or_json_string<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(Some(T::default())),
        Value::String(s) => {
            if s.trim().is_empty() {
                Ok(Some(T::default()))
            } else {
                serde_json::from_str(&s).map(Some).map_err(de::Error::custom)
            }
        }
        other => serde_json::from_value(other).map(Some).map_err(de::Error::custom),
    }
}

/// Accepts a list of strings or a single comma-separated string.
fn list_or_comma_string<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(Some(Vec::new())),
        Value::String(s) => Ok(Some(
            s.split(',')
                .map(|keyword| keyword.trim().to_string())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        )),
        other => serde_json::from_value(other).map(Some).map_err(de::Error::custom),
    }
}

/// The contact form payload.
#[derive(Debug, Deserialize, Clone)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Required-field check for the contact form. Runs before any relay call so
/// an empty submission never reaches the SMTP client.
pub fn validate_contact(form: &ContactMessage) -> Result<(), &'static str> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty()
    {
        return Err("Name, email and message are required.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn blank_recipe() -> Recipe {
        serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "slug": "blank",
            "created_at": Utc::now(),
        }))
        .unwrap()
    }

    #[test]
    fn numeric_fields_accept_strings_and_coerce_garbage_to_zero() {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "preparation_time": "25",
            "cooking_time": "",
            "total_time": "not a number",
            "servings": -3,
        }))
        .unwrap();

        assert_eq!(input.preparation_time, Some(25));
        assert_eq!(input.cooking_time, Some(0));
        assert_eq!(input.total_time, Some(0));
        assert_eq!(input.servings, Some(0));
    }

    #[test]
    fn lists_accept_json_encoded_strings() {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "ingredients": "[{\"name\":\"flour\",\"amount\":\"200\",\"unit\":\"g\",\"notes\":\"\"}]",
            "nlp_keywords": "cookies, baking , , dessert",
        }))
        .unwrap();

        let ingredients = input.ingredients.unwrap();
        assert_eq!(ingredients.len(), 1);
        assert_eq!(ingredients[0].name, "flour");
        assert_eq!(
            input.nlp_keywords.unwrap(),
            vec!["cookies", "baking", "dessert"]
        );
    }

    #[test]
    fn malformed_embedded_json_is_an_error() {
        let result: Result<RecipeInput, _> =
            serde_json::from_value(serde_json::json!({ "steps": "[{ not json" }));
        assert!(result.is_err());
    }

    #[test]
    fn steps_are_renumbered_densely_from_one() {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "steps": [
                { "step_number": 4, "instruction": "Preheat", "tip": "" },
                { "step_number": 9, "instruction": "Mix", "tip": "" },
                { "instruction": "Bake", "tip": "" },
            ],
        }))
        .unwrap();

        let mut recipe = blank_recipe();
        input.apply_to(&mut recipe);
        let numbers: Vec<u32> = recipe.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn apply_never_touches_identity_fields() {
        let mut recipe = blank_recipe();
        recipe.slug = "original-slug".to_string();
        recipe.views = 7;
        let created_at = recipe.created_at;

        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "title": "  A Completely New Title  ",
            "isPublished": true,
        }))
        .unwrap();
        input.apply_to(&mut recipe);

        assert_eq!(recipe.title, "A Completely New Title");
        assert!(recipe.is_published);
        assert_eq!(recipe.slug, "original-slug");
        assert_eq!(recipe.views, 7);
        assert_eq!(recipe.created_at, created_at);
    }

    #[test]
    fn partial_update_leaves_other_fields_alone() {
        let mut recipe = blank_recipe();
        recipe.description = "keep me".to_string();

        let input: RecipeInput =
            serde_json::from_value(serde_json::json!({ "category": "dessert" })).unwrap();
        input.apply_to(&mut recipe);

        assert_eq!(recipe.description, "keep me");
        assert_eq!(recipe.category, "dessert");
    }

    #[test]
    fn contact_requires_name_email_and_message() {
        let valid = ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: None,
            message: "Bonjour".into(),
        };
        assert!(validate_contact(&valid).is_ok());

        let mut missing_message = valid.clone();
        missing_message.message = "   ".into();
        assert!(validate_contact(&missing_message).is_err());

        let mut missing_name = valid.clone();
        missing_name.name = String::new();
        assert!(validate_contact(&missing_name).is_err());
    }
}
