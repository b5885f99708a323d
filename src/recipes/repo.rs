use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::recipes::{
    repo_types::{Difficulty, NewRecipe, Recipe, RecipeChanges},
    search::SearchCriteria,
};

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe>;
    async fn list(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn find(&self, id: i64) -> anyhow::Result<Option<Recipe>>;
    /// `None` when no recipe has this id.
    async fn update(&self, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>>;
    /// `false` when no recipe has this id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    async fn by_difficulty(&self, level: Difficulty) -> anyhow::Result<Vec<Recipe>>;
    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Recipe>>;
    async fn count(&self) -> anyhow::Result<i64>;
}

const RECIPE_COLUMNS: &str =
    "id, name, ingredients, prep_time, cook_time, difficulty, description, created_at, updated_at";

#[derive(Clone)]
pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe> {
        let sql = format!(
            "INSERT INTO recipes (name, ingredients, prep_time, cook_time, difficulty, description) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {RECIPE_COLUMNS}"
        );
        let recipe = sqlx::query_as::<_, Recipe>(&sql)
            .bind(&new.name)
            .bind(&new.ingredients)
            .bind(new.prep_time)
            .bind(new.cook_time)
            .bind(new.difficulty)
            .bind(&new.description)
            .fetch_one(&self.db)
            .await
            .context("insert recipe")?;
        Ok(recipe)
    }

    async fn list(&self) -> anyhow::Result<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY id");
        let rows = sqlx::query_as::<_, Recipe>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list recipes")?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
        let row = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find recipe")?;
        Ok(row)
    }

    async fn update(&self, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>> {
        let sql = format!(
            r#"
            UPDATE recipes
               SET name        = COALESCE($2, name),
                   ingredients = COALESCE($3, ingredients),
                   prep_time   = COALESCE($4, prep_time),
                   cook_time   = COALESCE($5, cook_time),
                   difficulty  = COALESCE($6, difficulty),
                   description = COALESCE($7, description),
                   updated_at  = now()
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.ingredients)
            .bind(changes.prep_time)
            .bind(changes.cook_time)
            .bind(changes.difficulty)
            .bind(changes.description)
            .fetch_optional(&self.db)
            .await
            .context("update recipe")?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(result.rows_affected() > 0)
    }

    async fn by_difficulty(&self, level: Difficulty) -> anyhow::Result<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE difficulty = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, Recipe>(&sql)
            .bind(level)
            .fetch_all(&self.db)
            .await
            .context("list recipes by difficulty")?;
        Ok(rows)
    }

    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Recipe>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(RECIPE_COLUMNS)
            .push(" FROM recipes WHERE (prep_time::BIGINT + cook_time::BIGINT) BETWEEN ")
            .push_bind(criteria.min_time)
            .push(" AND ")
            .push_bind(criteria.max_time);
        // strpos keeps LIKE wildcards in user input literal
        for ingredient in &criteria.ingredients {
            qb.push(" AND strpos(ingredients, ")
                .push_bind(ingredient.clone())
                .push(") > 0");
        }
        qb.push(" ORDER BY id");

        let rows = qb
            .build_query_as::<Recipe>()
            .fetch_all(&self.db)
            .await
            .context("search recipes")?;
        Ok(rows)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.db)
            .await
            .context("count recipes")?;
        Ok(n)
    }
}
