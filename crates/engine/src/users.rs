//! Users table and the public view of a user.
//!
//! Expenses reference users by `id` only; the password hash never leaves
//! this module except through [`Model`].

use sea_orm::entity::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub name: String,
    pub profile_pic: Option<String>,
    pub about: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A user as seen by anyone other than the credential check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub profile_pic: Option<String>,
    pub about: Option<String>,
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            profile_pic: model.profile_pic,
            about: model.about,
        }
    }
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub about: Option<String>,
    pub profile_pic: Option<String>,
}

/// The verified caller behind a bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
}

/// Maps user ids to display names.
///
/// Ids without a matching user are left out of the result; callers pick their
/// own fallback.
pub trait NameResolver {
    fn resolve_names(
        &self,
        ids: &HashSet<String>,
    ) -> impl Future<Output = ResultEngine<HashMap<String, String>>> + Send;
}
