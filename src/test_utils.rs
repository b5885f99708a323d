//! In-memory repositories with the same observable behavior as the Postgres ones.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::{TokenRevocations, UserRepo},
        repo_types::{NewUser, User},
    },
    recipes::{
        repo::RecipeRepo,
        repo_types::{Difficulty, NewRecipe, Recipe, RecipeChanges},
        search::SearchCriteria,
    },
};

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUsers {
    async fn create(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }
}

impl MemoryUsers {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[derive(Default)]
pub struct MemoryRevocations {
    revoked: Mutex<HashSet<Uuid>>,
}

#[async_trait]
impl TokenRevocations for MemoryRevocations {
    async fn revoke(
        &self,
        jti: Uuid,
        _user_id: Uuid,
        _expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        self.revoked.lock().unwrap().insert(jti);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> anyhow::Result<bool> {
        Ok(self.revoked.lock().unwrap().contains(&jti))
    }
}

#[derive(Default)]
pub struct MemoryRecipes {
    next_id: AtomicI64,
    rows: Mutex<Vec<Recipe>>,
}

fn apply(recipe: &mut Recipe, changes: RecipeChanges) {
    if let Some(v) = changes.name {
        recipe.name = v;
    }
    if let Some(v) = changes.ingredients {
        recipe.ingredients = v;
    }
    if let Some(v) = changes.prep_time {
        recipe.prep_time = v;
    }
    if let Some(v) = changes.cook_time {
        recipe.cook_time = v;
    }
    if let Some(v) = changes.difficulty {
        recipe.difficulty = v;
    }
    if let Some(v) = changes.description {
        recipe.description = v;
    }
    recipe.updated_at = OffsetDateTime::now_utc();
}

#[async_trait]
impl RecipeRepo for MemoryRecipes {
    async fn insert(&self, new: NewRecipe) -> anyhow::Result<Recipe> {
        let now = OffsetDateTime::now_utc();
        let recipe = Recipe {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: new.name,
            ingredients: new.ingredients,
            prep_time: new.prep_time,
            cook_time: new.cook_time,
            difficulty: new.difficulty,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(recipe.clone());
        Ok(recipe)
    }

    async fn list(&self) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: i64, changes: RecipeChanges) -> anyhow::Result<Option<Recipe>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(recipe) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        apply(recipe, changes);
        Ok(Some(recipe.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }

    async fn by_difficulty(&self, level: Difficulty) -> anyhow::Result<Vec<Recipe>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.difficulty == level).cloned().collect())
    }

    async fn search(&self, criteria: &SearchCriteria) -> anyhow::Result<Vec<Recipe>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| criteria.matches(r)).cloned().collect())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}
