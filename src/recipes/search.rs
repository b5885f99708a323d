use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

use crate::{
    recipes::repo_types::Recipe,
    validation::{below_zero, field_error, has_nul, not_integer, parse_int, required},
};

lazy_static! {
    // ingredients, ingredients[] and ingredients[N] all feed the same list
    static ref INGREDIENT_KEY: Regex = Regex::new(r"^ingredients(\[\d*\])?$").unwrap();
}

/// Validated search input: every ingredient must appear in the recipe text and the
/// total time must fall inside `[min_time, max_time]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub ingredients: Vec<String>,
    pub min_time: i64,
    pub max_time: i64,
}

impl SearchCriteria {
    /// Builds criteria from decoded query-string pairs, reporting every bad field at once.
    pub fn from_query(pairs: &[(String, String)]) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut ingredients = Vec::new();
        let mut min_raw = None;
        let mut max_raw = None;

        for (key, value) in pairs {
            match key.as_str() {
                "min_time" => min_raw = Some(value.as_str()),
                "max_time" => max_raw = Some(value.as_str()),
                k if INGREDIENT_KEY.is_match(k) => ingredients.push(value.trim().to_string()),
                _ => {}
            }
        }

        if ingredients.is_empty() {
            errors.add("ingredients", required("ingredients"));
        } else if ingredients.iter().any(|i| i.is_empty()) {
            errors.add(
                "ingredients",
                field_error("string", "Each ingredient must be a non-empty string.".into()),
            );
        } else if ingredients.iter().any(|i| i.contains('\0')) {
            errors.add("ingredients", has_nul("ingredients"));
        }

        let min_time = match read_int("min_time", min_raw, &mut errors) {
            Some(v) if v < 0 => {
                errors.add("min_time", below_zero("min_time"));
                None
            }
            other => other,
        };

        let max_time = match (read_int("max_time", max_raw, &mut errors), min_time) {
            (Some(max), Some(min)) if max < min => {
                errors.add(
                    "max_time",
                    field_error(
                        "gte",
                        "The max time field must be greater than or equal to min time.".into(),
                    ),
                );
                None
            }
            (max, _) => max,
        };

        match (min_time, max_time) {
            (Some(min_time), Some(max_time)) if errors.is_empty() => Ok(Self {
                ingredients,
                min_time,
                max_time,
            }),
            _ => Err(errors),
        }
    }

    /// Case-sensitive substring match on the whole ingredients text, AND across terms.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let total = recipe.total_time();
        total >= self.min_time
            && total <= self.max_time
            && self
                .ingredients
                .iter()
                .all(|i| recipe.ingredients.contains(i.as_str()))
    }
}

fn read_int(
    field: &'static str,
    raw: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        errors.add(field, required(field));
        return None;
    };
    let parsed = parse_int(raw);
    if parsed.is_none() {
        errors.add(field, not_integer(field));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::repo_types::Difficulty;
    use time::OffsetDateTime;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn recipe(ingredients: &str, prep_time: i32, cook_time: i32) -> Recipe {
        Recipe {
            id: 1,
            name: "Test".into(),
            ingredients: ingredients.into(),
            prep_time,
            cook_time,
            difficulty: Difficulty::Easy,
            description: "Test".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn parses_indexed_array_keys() {
        let criteria = SearchCriteria::from_query(&pairs(&[
            ("ingredients[0]", " salt "),
            ("ingredients[1]", "pepper"),
            ("min_time", "10"),
            ("max_time", "20"),
        ]))
        .unwrap();
        assert_eq!(criteria.ingredients, vec!["salt", "pepper"]);
        assert_eq!((criteria.min_time, criteria.max_time), (10, 20));
    }

    #[test]
    fn accepts_repeated_and_bracket_keys() {
        let criteria = SearchCriteria::from_query(&pairs(&[
            ("ingredients[]", "salt"),
            ("ingredients", "pepper"),
            ("min_time", "0"),
            ("max_time", "0"),
        ]))
        .unwrap();
        assert_eq!(criteria.ingredients.len(), 2);
    }

    #[test]
    fn empty_ingredients_and_negative_min_are_both_reported() {
        let errors = SearchCriteria::from_query(&pairs(&[("min_time", "-1"), ("max_time", "0")]))
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("ingredients"));
        assert!(fields.contains_key("min_time"));
        assert!(!fields.contains_key("max_time"));
    }

    #[test]
    fn max_below_min_is_rejected() {
        let errors = SearchCriteria::from_query(&pairs(&[
            ("ingredients[]", "salt"),
            ("min_time", "30"),
            ("max_time", "10"),
        ]))
        .unwrap_err();
        assert!(errors.field_errors().contains_key("max_time"));
    }

    #[test]
    fn missing_and_non_integer_times() {
        let errors = SearchCriteria::from_query(&pairs(&[
            ("ingredients[]", "salt"),
            ("min_time", "soon"),
        ]))
        .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("min_time"));
        assert!(fields.contains_key("max_time"));
    }

    #[test]
    fn nul_in_ingredient_is_rejected() {
        let errors = SearchCriteria::from_query(&pairs(&[
            ("ingredients[]", "salt\u{0}"),
            ("min_time", "0"),
            ("max_time", "10"),
        ]))
        .unwrap_err();
        assert!(errors.field_errors().contains_key("ingredients"));
        assert_eq!(errors.field_errors().len(), 1);
    }

    #[test]
    fn blank_ingredient_is_rejected() {
        let errors = SearchCriteria::from_query(&pairs(&[
            ("ingredients[]", "salt"),
            ("ingredients[]", "  "),
            ("min_time", "0"),
            ("max_time", "10"),
        ]))
        .unwrap_err();
        assert!(errors.field_errors().contains_key("ingredients"));
    }

    #[test]
    fn matching_requires_every_ingredient_and_time_in_range() {
        let criteria = SearchCriteria {
            ingredients: vec!["salt".into(), "pepper".into()],
            min_time: 10,
            max_time: 20,
        };
        assert!(criteria.matches(&recipe("salt,pepper", 5, 10)));
        assert!(!criteria.matches(&recipe("salt,sugar", 20, 15)));
        assert!(!criteria.matches(&recipe("salt,pepper", 20, 15)));
        // bounds are inclusive
        assert!(criteria.matches(&recipe("pepper, salt", 10, 0)));
        assert!(criteria.matches(&recipe("pepper, salt", 10, 10)));
    }

    #[test]
    fn matching_is_substring_and_case_sensitive() {
        let criteria = SearchCriteria {
            ingredients: vec!["egg".into()],
            min_time: 0,
            max_time: 100,
        };
        assert!(criteria.matches(&recipe("veggies, rice", 5, 5)));
        assert!(!criteria.matches(&recipe("Eggs, rice", 5, 5)));
    }
}
