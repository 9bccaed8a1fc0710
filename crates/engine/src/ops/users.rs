//! Identity & access: signup, login, bearer verification and profiles.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use std::collections::{HashMap, HashSet};

use crate::{
    EngineError, ResultEngine, password,
    users::{self, Identity, NameResolver, User, UserUpdate},
};

use super::{Engine, normalize_optional_text, normalize_required};

fn invalid_credentials() -> EngineError {
    EngineError::Unauthorized("Invalid credentials".to_string())
}

fn user_not_found() -> EngineError {
    EngineError::Unauthorized("User not found".to_string())
}

impl Engine {
    /// Registers a user and returns its id.
    ///
    /// The email must not be in use already.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        profile_pic: Option<&str>,
    ) -> ResultEngine<i32> {
        let email = normalize_required(email, "email")?;
        let name = normalize_required(name, "name")?;
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&db_tx)
            .await?
            .is_some();
        if taken {
            return Err(EngineError::ExistingKey(
                "This email is already in use.".to_string(),
            ));
        }

        let user = users::ActiveModel {
            id: ActiveValue::NotSet,
            email: ActiveValue::Set(email),
            password: ActiveValue::Set(password::hash(password)),
            name: ActiveValue::Set(name),
            profile_pic: ActiveValue::Set(normalize_optional_text(profile_pic)),
            about: ActiveValue::Set(None),
        }
        .insert(&db_tx)
        .await?;
        db_tx.commit().await?;

        tracing::debug!(user_id = user.id, "user created");
        Ok(user.id)
    }

    /// Exchanges email and password for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> ResultEngine<String> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim()))
            .one(&self.database)
            .await?
            .ok_or_else(invalid_credentials)?;
        if !password::verify(password, &user.password) {
            return Err(invalid_credentials());
        }

        let identity = Identity {
            user_id: user.id,
            email: user.email,
        };
        Ok(self.tokens.issue(&identity, Utc::now()))
    }

    /// Resolves a bearer token to the caller.
    pub fn authenticate(&self, token: &str) -> ResultEngine<Identity> {
        self.tokens.verify(token, Utc::now())
    }

    pub async fn user_profile(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(user_not_found)
    }

    /// Applies a partial profile update.
    ///
    /// A blank `name` or `profile_pic` is ignored, `about` is stored as given
    /// (even empty).
    pub async fn update_user(&self, user_id: i32, update: UserUpdate) -> ResultEngine<User> {
        let db_tx = self.database.begin().await?;
        let model = users::Entity::find_by_id(user_id)
            .one(&db_tx)
            .await?
            .ok_or_else(user_not_found)?;

        let mut active: users::ActiveModel = model.clone().into();
        if let Some(name) = normalize_optional_text(update.name.as_deref()) {
            active.name = ActiveValue::Set(name);
        }
        if let Some(about) = update.about {
            active.about = ActiveValue::Set(Some(about));
        }
        if let Some(profile_pic) = normalize_optional_text(update.profile_pic.as_deref()) {
            active.profile_pic = ActiveValue::Set(Some(profile_pic));
        }

        let model = if active.is_changed() {
            active.update(&db_tx).await?
        } else {
            model
        };
        db_tx.commit().await?;

        Ok(model.into())
    }

    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }
}

impl NameResolver for Engine {
    async fn resolve_names(&self, ids: &HashSet<String>) -> ResultEngine<HashMap<String, String>> {
        // Non numeric ids cannot belong to anyone.
        let numeric: Vec<i32> = ids.iter().filter_map(|id| id.parse().ok()).collect();
        if numeric.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(users::Entity::find()
            .filter(users::Column::Id.is_in(numeric))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|user| (user.id.to_string(), user.name))
            .collect())
    }
}
