use serde_json::{Map, Value};
use tracing::{info, warn};
use validator::ValidationErrors;

use crate::{
    error::ApiError,
    recipes::{
        repo::RecipeRepo,
        repo_types::{Difficulty, NewRecipe, Recipe, RecipeChanges},
        search::SearchCriteria,
    },
    validation::{
        below_zero, field_error, has_nul, label, not_integer, parse_int, required, single,
    },
};

pub const RECIPE_NOT_FOUND: &str = "Recipe not found";

/// Path ids that are not integers cannot name a recipe.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::NotFound(RECIPE_NOT_FOUND))
}

/// Reads typed fields out of a JSON object, collecting every failure.
struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    partial: bool,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a Map<String, Value>, partial: bool) -> Self {
        Self {
            body,
            partial,
            errors: ValidationErrors::new(),
        }
    }

    fn value(&mut self, field: &'static str) -> Option<&'a Value> {
        let body = self.body;
        match body.get(field) {
            None if self.partial => None,
            None | Some(Value::Null) => {
                self.errors.add(field, required(field));
                None
            }
            Some(v) => Some(v),
        }
    }

    fn text(&mut self, field: &'static str) -> Option<String> {
        match self.value(field)? {
            Value::String(s) if s.trim().is_empty() => {
                self.errors.add(field, required(field));
                None
            }
            Value::String(s) if s.contains('\0') => {
                self.errors.add(field, has_nul(field));
                None
            }
            Value::String(s) => Some(s.trim().to_string()),
            _ => {
                self.errors.add(
                    field,
                    field_error("string", format!("The {} field must be a string.", label(field))),
                );
                None
            }
        }
    }

    fn minutes(&mut self, field: &'static str) -> Option<i32> {
        let parsed = match self.value(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => parse_int(s),
            _ => None,
        };
        let Some(n) = parsed else {
            self.errors.add(field, not_integer(field));
            return None;
        };
        if n < 0 {
            self.errors.add(field, below_zero(field));
            return None;
        }
        match i32::try_from(n) {
            Ok(v) => Some(v),
            Err(_) => {
                self.errors.add(
                    field,
                    field_error(
                        "max",
                        format!("The {} field must not be greater than {}.", label(field), i32::MAX),
                    ),
                );
                None
            }
        }
    }

    fn difficulty(&mut self, field: &'static str) -> Option<Difficulty> {
        let value = self.value(field)?;
        match value.as_str().and_then(|s| s.parse::<Difficulty>().ok()) {
            Some(level) => Some(level),
            None => {
                self.errors.add(
                    field,
                    field_error("in", format!("The selected {} is invalid.", label(field))),
                );
                None
            }
        }
    }
}

/// All six fields are required on create.
pub fn validate_new(body: &Map<String, Value>) -> Result<NewRecipe, ValidationErrors> {
    let mut reader = FieldReader::new(body, false);
    let name = reader.text("name");
    let ingredients = reader.text("ingredients");
    let prep_time = reader.minutes("prep_time");
    let cook_time = reader.minutes("cook_time");
    let difficulty = reader.difficulty("difficulty");
    let description = reader.text("description");

    match (name, ingredients, prep_time, cook_time, difficulty, description) {
        (
            Some(name),
            Some(ingredients),
            Some(prep_time),
            Some(cook_time),
            Some(difficulty),
            Some(description),
        ) => Ok(NewRecipe {
            name,
            ingredients,
            prep_time,
            cook_time,
            difficulty,
            description,
        }),
        _ => Err(reader.errors),
    }
}

/// Same rules as create, but only for the fields that are present.
pub fn validate_changes(body: &Map<String, Value>) -> Result<RecipeChanges, ValidationErrors> {
    let mut reader = FieldReader::new(body, true);
    let changes = RecipeChanges {
        name: reader.text("name"),
        ingredients: reader.text("ingredients"),
        prep_time: reader.minutes("prep_time"),
        cook_time: reader.minutes("cook_time"),
        difficulty: reader.difficulty("difficulty"),
        description: reader.text("description"),
    };
    if reader.errors.is_empty() {
        Ok(changes)
    } else {
        Err(reader.errors)
    }
}

pub fn parse_difficulty(level: &str) -> Result<Difficulty, ValidationErrors> {
    level.parse::<Difficulty>().map_err(|_| {
        single(
            "level",
            field_error("in", "The selected difficulty level is invalid.".into()),
        )
    })
}

pub async fn create(repo: &dyn RecipeRepo, body: &Map<String, Value>) -> Result<Recipe, ApiError> {
    let new = validate_new(body)?;
    let recipe = repo.insert(new).await?;
    info!(recipe_id = recipe.id, "recipe created");
    Ok(recipe)
}

pub async fn list(repo: &dyn RecipeRepo) -> Result<Vec<Recipe>, ApiError> {
    Ok(repo.list().await?)
}

pub async fn get(repo: &dyn RecipeRepo, id: i64) -> Result<Recipe, ApiError> {
    repo.find(id)
        .await?
        .ok_or(ApiError::NotFound(RECIPE_NOT_FOUND))
}

/// Existence is checked before the body is validated.
pub async fn update(
    repo: &dyn RecipeRepo,
    id: i64,
    body: &Map<String, Value>,
) -> Result<Recipe, ApiError> {
    let current = get(repo, id).await?;
    let changes = validate_changes(body)?;
    if changes.is_empty() {
        return Ok(current);
    }
    let recipe = repo
        .update(id, changes)
        .await?
        .ok_or(ApiError::NotFound(RECIPE_NOT_FOUND))?;
    info!(recipe_id = id, "recipe updated");
    Ok(recipe)
}

pub async fn delete(repo: &dyn RecipeRepo, id: i64) -> Result<(), ApiError> {
    if !repo.delete(id).await? {
        warn!(recipe_id = id, "delete of missing recipe");
        return Err(ApiError::NotFound(RECIPE_NOT_FOUND));
    }
    info!(recipe_id = id, "recipe deleted");
    Ok(())
}

pub async fn filter_by_difficulty(
    repo: &dyn RecipeRepo,
    level: &str,
) -> Result<Vec<Recipe>, ApiError> {
    let level = parse_difficulty(level)?;
    Ok(repo.by_difficulty(level).await?)
}

pub async fn search(
    repo: &dyn RecipeRepo,
    query: &[(String, String)],
) -> Result<Vec<Recipe>, ApiError> {
    let criteria = SearchCriteria::from_query(query)?;
    Ok(repo.search(&criteria).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryRecipes;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn pasta() -> Map<String, Value> {
        object(json!({
            "name": "Tomato Pasta",
            "ingredients": "tomato, pasta, salt",
            "prep_time": 10,
            "cook_time": 20,
            "difficulty": "easy",
            "description": "Simple and delicious tomato pasta.",
        }))
    }

    #[test]
    fn valid_body_becomes_new_recipe() {
        let new = validate_new(&pasta()).unwrap();
        assert_eq!(new.name, "Tomato Pasta");
        assert_eq!(new.prep_time, 10);
        assert_eq!(new.difficulty, Difficulty::Easy);
    }

    #[test]
    fn integer_strings_are_accepted() {
        let mut body = pasta();
        body.insert("cook_time".into(), json!("25"));
        assert_eq!(validate_new(&body).unwrap().cook_time, 25);
    }

    #[test]
    fn every_failing_field_is_listed() {
        let body = object(json!({
            "name": "",
            "ingredients": 42,
            "prep_time": -5,
            "cook_time": "soon",
            "difficulty": "extreme",
        }));
        let errors = validate_new(&body).unwrap_err();
        let fields = errors.field_errors();
        for field in [
            "name",
            "ingredients",
            "prep_time",
            "cook_time",
            "difficulty",
            "description",
        ] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn nul_bytes_in_text_are_rejected() {
        let mut body = pasta();
        body.insert("description".into(), json!("tasty\u{0}"));
        let errors = validate_new(&body).unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);
        assert!(errors.field_errors().contains_key("description"));

        let errors = validate_changes(&object(json!({ "name": "a\u{0}b" }))).unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn oversized_minutes_are_rejected() {
        let mut body = pasta();
        body.insert("prep_time".into(), json!(i64::from(i32::MAX) + 1));
        body.insert("cook_time".into(), json!(1.5));
        let errors = validate_new(&body).unwrap_err();
        assert!(errors.field_errors().contains_key("prep_time"));
        assert!(errors.field_errors().contains_key("cook_time"));
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let changes = validate_changes(&object(json!({ "name": "Renamed" }))).unwrap();
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert_eq!(changes.cook_time, None);

        let errors =
            validate_changes(&object(json!({ "description": null, "prep_time": -1 }))).unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
        assert!(errors.field_errors().contains_key("prep_time"));
        assert!(!errors.field_errors().contains_key("name"));
    }

    #[test]
    fn unknown_difficulty_level_is_a_validation_error() {
        assert_eq!(parse_difficulty("hard").unwrap(), Difficulty::Hard);
        let errors = parse_difficulty("invalid").unwrap_err();
        assert!(errors.field_errors().contains_key("level"));
    }

    #[test]
    fn non_numeric_id_is_not_found() {
        assert!(matches!(parse_id("abc"), Err(ApiError::NotFound(_))));
        assert_eq!(parse_id("7").unwrap(), 7);
    }

    #[tokio::test]
    async fn create_then_get_returns_the_same_fields() {
        let repo = MemoryRecipes::default();
        let created = create(&repo, &pasta()).await.unwrap();
        let fetched = get(&repo, created.id).await.unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.ingredients, "tomato, pasta, salt");
        assert_eq!(fetched.cook_time, 20);
    }

    #[tokio::test]
    async fn update_missing_recipe_is_not_found_even_with_bad_body() {
        let repo = MemoryRecipes::default();
        let err = update(&repo, 999_999, &object(json!({ "prep_time": -1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let repo = MemoryRecipes::default();
        let created = create(&repo, &pasta()).await.unwrap();
        let updated = update(
            &repo,
            created.id,
            &object(json!({ "name": "Updated Recipe Name", "difficulty": "medium" })),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Updated Recipe Name");
        assert_eq!(updated.difficulty, Difficulty::Medium);
        assert_eq!(updated.ingredients, created.ingredients);
        assert_eq!(updated.prep_time, created.prep_time);
        assert_eq!(updated.cook_time, created.cook_time);
        assert_eq!(updated.description, created.description);
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let repo = MemoryRecipes::default();
        let created = create(&repo, &pasta()).await.unwrap();
        delete(&repo, created.id).await.unwrap();
        assert!(matches!(get(&repo, created.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            delete(&repo, created.id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
