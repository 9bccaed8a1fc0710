//! Expense ownership and sharing.
//!
//! Only the owner may replace or delete an expense. Anyone else gets the same
//! [`EngineError::KeyNotFound`] as for a missing id.

use sea_orm::{
    ActiveModelTrait, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use std::collections::HashSet;

use crate::{
    EngineError, Expense, ExpenseDraft, ResultEngine, UNKNOWN_USER, expenses,
    users::NameResolver,
};

use super::Engine;

fn expense_not_found() -> EngineError {
    EngineError::KeyNotFound("expense not found".to_string())
}

/// Fills in `name` on every share, falling back to [`UNKNOWN_USER`].
pub async fn enrich_shares<R: NameResolver>(
    resolver: &R,
    expenses: &mut [Expense],
) -> ResultEngine<()> {
    let ids: HashSet<String> = expenses
        .iter()
        .filter_map(|expense| expense.shared_with.as_ref())
        .flatten()
        .map(|share| share.user_id.clone())
        .collect();
    if ids.is_empty() {
        return Ok(());
    }

    let names = resolver.resolve_names(&ids).await?;
    for share in expenses
        .iter_mut()
        .filter_map(|expense| expense.shared_with.as_mut())
        .flatten()
    {
        let name = names
            .get(&share.user_id)
            .map_or(UNKNOWN_USER, String::as_str);
        share.name = Some(name.to_string());
    }
    Ok(())
}

impl Engine {
    /// Expenses the caller owns or takes part in, shares enriched with names.
    ///
    /// Sorted by id, so the order only changes when the data does.
    pub async fn list_expenses(&self, user_id: i32) -> ResultEngine<Vec<Expense>> {
        // Coarse text match on the JSON column, refined below.
        let participant = format!("%\"userId\":\"{user_id}\"%");
        let models = expenses::Entity::find()
            .filter(
                Condition::any()
                    .add(expenses::Column::UserId.eq(user_id))
                    .add(expenses::Column::SharedWith.like(participant.as_str())),
            )
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;

        let mut visible = models
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        visible.retain(|expense| expense.is_visible_to(user_id));

        enrich_shares(self, &mut visible).await?;
        Ok(visible)
    }

    /// Stores a new expense owned by `user_id`.
    pub async fn create_expense(
        &self,
        user_id: i32,
        draft: ExpenseDraft,
    ) -> ResultEngine<Expense> {
        let expense = Expense::from_draft(user_id, draft);
        let model = expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await?;
        Expense::try_from(model)
    }

    /// Replaces every field but the owner and recomputes the shares.
    pub async fn update_expense(
        &self,
        user_id: i32,
        expense_id: &str,
        draft: ExpenseDraft,
    ) -> ResultEngine<Expense> {
        let db_tx = self.database.begin().await?;
        let existing = require_owned_expense(&db_tx, expense_id, user_id).await?;

        let replacement = Expense::replacing(existing.id, existing.user_id, draft);
        let model = expenses::ActiveModel::from(&replacement)
            .update(&db_tx)
            .await?;
        db_tx.commit().await?;

        Expense::try_from(model)
    }

    pub async fn delete_expense(&self, user_id: i32, expense_id: &str) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        let existing = require_owned_expense(&db_tx, expense_id, user_id).await?;
        expenses::Entity::delete_by_id(existing.id)
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;
        Ok(())
    }
}

async fn require_owned_expense(
    db: &DatabaseTransaction,
    expense_id: &str,
    user_id: i32,
) -> ResultEngine<expenses::Model> {
    expenses::Entity::find_by_id(expense_id.to_string())
        .filter(expenses::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(expense_not_found)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::Share;

    struct Directory(HashMap<String, String>);

    impl NameResolver for Directory {
        async fn resolve_names(
            &self,
            ids: &HashSet<String>,
        ) -> ResultEngine<HashMap<String, String>> {
            Ok(self
                .0
                .iter()
                .filter(|(id, _)| ids.contains(*id))
                .map(|(id, name)| (id.clone(), name.clone()))
                .collect())
        }
    }

    fn expense(shared_with: Option<Vec<&str>>) -> Expense {
        Expense {
            id: "e".to_string(),
            title: "Dinner".to_string(),
            amount: 90.0,
            date: "2024-05-01".to_string(),
            category: "food".to_string(),
            payment_method: "card".to_string(),
            user_id: 1,
            shared_with: shared_with.map(|ids| {
                ids.into_iter()
                    .map(|id| Share {
                        user_id: id.to_string(),
                        share: 45.0,
                        name: None,
                    })
                    .collect()
            }),
        }
    }

    fn directory() -> Directory {
        Directory(HashMap::from([("2".to_string(), "Bob".to_string())]))
    }

    #[tokio::test]
    async fn names_are_resolved_with_fallback() {
        let mut expenses = vec![expense(Some(vec!["2", "99"]))];
        enrich_shares(&directory(), &mut expenses).await.unwrap();

        let shares = expenses[0].shared_with.as_ref().unwrap();
        assert_eq!(shares[0].name.as_deref(), Some("Bob"));
        assert_eq!(shares[1].name.as_deref(), Some(UNKNOWN_USER));
    }

    #[tokio::test]
    async fn expenses_without_shares_are_untouched() {
        let mut expenses = vec![expense(None), expense(Some(vec![]))];
        enrich_shares(&directory(), &mut expenses).await.unwrap();

        assert!(expenses[0].shared_with.is_none());
        assert_eq!(expenses[1].shared_with.as_deref(), Some(&[][..]));
    }
}
