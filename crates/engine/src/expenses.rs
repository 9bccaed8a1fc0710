//! Expense records and the even split between the owner and the listed
//! participants.
//!
//! The owner's part is never stored as a [`Share`]: every participant in
//! `shared_with` gets `amount / (n + 1)` and the owner implicitly keeps the
//! remaining `amount / (n + 1)`.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Display name used when a participant id does not resolve to a user.
pub const UNKNOWN_USER: &str = "Unknown User";

#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub payment_method: String,
    /// Owner, fixed at creation.
    pub user_id: i32,
    pub shared_with: Option<Vec<Share>>,
}

/// One participant's part of an expense.
#[derive(Clone, Debug, PartialEq)]
pub struct Share {
    pub user_id: String,
    pub share: f64,
    /// Resolved at read time, never persisted.
    pub name: Option<String>,
}

/// What a caller submits to create or replace an expense.
///
/// Participants are plain ids: any amount a client attached to them is
/// recomputed anyway.
#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub payment_method: String,
    pub participants: Vec<String>,
}

impl Expense {
    pub(crate) fn from_draft(owner: i32, draft: ExpenseDraft) -> Self {
        Self::replacing(Uuid::new_v4().to_string(), owner, draft)
    }

    /// Full replacement of the record `id`, shares recomputed.
    pub(crate) fn replacing(id: String, owner: i32, draft: ExpenseDraft) -> Self {
        let shared_with = split_shares(draft.amount, &draft.participants);
        Self {
            id,
            title: draft.title,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            payment_method: draft.payment_method,
            user_id: owner,
            shared_with,
        }
    }

    /// The owner's implicit part of the amount.
    pub fn owner_share(&self) -> f64 {
        match self.shared_with.as_deref() {
            Some(shares) if !shares.is_empty() => self.amount / (shares.len() + 1) as f64,
            _ => self.amount,
        }
    }

    pub fn is_owner(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }

    pub fn is_participant(&self, user_id: i32) -> bool {
        let user_id = user_id.to_string();
        self.shared_with
            .iter()
            .flatten()
            .any(|share| share.user_id == user_id)
    }

    /// Owner or participant.
    pub fn is_visible_to(&self, user_id: i32) -> bool {
        self.is_owner(user_id) || self.is_participant(user_id)
    }
}

/// Evenly split `amount` between the owner and `participants`.
///
/// Returns `None` when there is nobody to split with. Duplicated ids are kept
/// and each counts as a separate participant.
pub fn split_shares(amount: f64, participants: &[String]) -> Option<Vec<Share>> {
    if participants.is_empty() {
        return None;
    }
    let share = amount / (participants.len() + 1) as f64;
    Some(
        participants
            .iter()
            .map(|user_id| Share {
                user_id: user_id.clone(),
                share,
                name: None,
            })
            .collect(),
    )
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredShare {
    user_id: String,
    share: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub payment_method: String,
    pub user_id: i32,
    pub shared_with: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn shares_to_json(shares: &[Share]) -> Json {
    Json::Array(
        shares
            .iter()
            .map(|s| json!({ "userId": s.user_id, "share": s.share }))
            .collect(),
    )
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.clone()),
            title: ActiveValue::Set(expense.title.clone()),
            amount: ActiveValue::Set(expense.amount),
            date: ActiveValue::Set(expense.date.clone()),
            category: ActiveValue::Set(expense.category.clone()),
            payment_method: ActiveValue::Set(expense.payment_method.clone()),
            user_id: ActiveValue::Set(expense.user_id),
            shared_with: ActiveValue::Set(expense.shared_with.as_deref().map(shares_to_json)),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let shared_with = model
            .shared_with
            .map(|value| {
                serde_json::from_value::<Vec<StoredShare>>(value)
                    .map_err(|err| EngineError::Database(DbErr::Json(err.to_string())))
            })
            .transpose()?
            .map(|stored| {
                stored
                    .into_iter()
                    .map(|s| Share {
                        user_id: s.user_id,
                        share: s.share,
                        name: None,
                    })
                    .collect()
            });

        Ok(Self {
            id: model.id,
            title: model.title,
            amount: model.amount,
            date: model.date,
            category: model.category,
            payment_method: model.payment_method,
            user_id: model.user_id,
            shared_with,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_participants_no_shares() {
        assert_eq!(split_shares(90.0, &[]), None);
    }

    #[test]
    fn split_counts_the_owner() {
        let shares = split_shares(90.0, &ids(&["2"])).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].user_id, "2");
        assert_eq!(shares[0].share, 45.0);
    }

    #[test]
    fn split_uses_plain_float_division() {
        let shares = split_shares(100.0, &ids(&["2", "3"])).unwrap();
        for share in &shares {
            assert_eq!(share.share, 100.0 / 3.0);
        }
    }

    #[test]
    fn duplicated_participants_are_not_merged() {
        let shares = split_shares(90.0, &ids(&["2", "2"])).unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.user_id == "2" && s.share == 30.0));
    }

    #[test]
    fn owner_share_mirrors_participants() {
        let draft = ExpenseDraft {
            title: "Dinner".to_string(),
            amount: 90.0,
            participants: ids(&["2", "3"]),
            ..Default::default()
        };
        let expense = Expense::from_draft(1, draft);
        assert_eq!(expense.owner_share(), 30.0);

        let solo = Expense::from_draft(
            1,
            ExpenseDraft {
                amount: 12.5,
                ..Default::default()
            },
        );
        assert_eq!(solo.owner_share(), 12.5);
        assert!(solo.shared_with.is_none());
    }

    #[test]
    fn visibility_follows_owner_and_participants() {
        let expense = Expense::from_draft(
            1,
            ExpenseDraft {
                amount: 10.0,
                participants: ids(&["2"]),
                ..Default::default()
            },
        );
        assert!(expense.is_visible_to(1));
        assert!(expense.is_visible_to(2));
        assert!(!expense.is_visible_to(3));
        assert!(!expense.is_owner(2));
    }

    #[test]
    fn stored_shares_survive_the_json_column() {
        let expense = Expense::from_draft(
            1,
            ExpenseDraft {
                amount: 90.0,
                participants: ids(&["2"]),
                ..Default::default()
            },
        );
        let active = ActiveModel::from(&expense);
        let ActiveValue::Set(Some(json)) = active.shared_with else {
            panic!("shares not set");
        };
        assert_eq!(json, json!([{ "userId": "2", "share": 45.0 }]));

        let model = Model {
            id: expense.id.clone(),
            title: expense.title.clone(),
            amount: expense.amount,
            date: expense.date.clone(),
            category: expense.category.clone(),
            payment_method: expense.payment_method.clone(),
            user_id: 1,
            shared_with: Some(json),
        };
        assert_eq!(Expense::try_from(model).unwrap(), expense);
    }

    #[test]
    fn malformed_share_column_is_a_database_error() {
        let model = Model {
            id: "x".to_string(),
            title: String::new(),
            amount: 0.0,
            date: String::new(),
            category: String::new(),
            payment_method: String::new(),
            user_id: 1,
            shared_with: Some(json!({ "not": "a list" })),
        };
        assert!(matches!(
            Expense::try_from(model),
            Err(EngineError::Database(_))
        ));
    }
}
