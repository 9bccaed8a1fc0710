//! Expense endpoints. The owner always comes from the bearer token.

use api_types::expense::{ExpenseNew, ExpenseView, ShareView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use engine::{Expense, ExpenseDraft, Identity};

use crate::{ServerError, server::ServerState};

fn map_expense(expense: Expense) -> ExpenseView {
    let owner_share = expense.owner_share();
    ExpenseView {
        id: expense.id,
        title: expense.title,
        amount: expense.amount,
        date: expense.date,
        category: expense.category,
        payment_method: expense.payment_method,
        user_id: expense.user_id,
        owner_share,
        shared_with: expense.shared_with.map(|shares| {
            shares
                .into_iter()
                .map(|share| ShareView {
                    user_id: share.user_id,
                    share: share.share,
                    name: share.name,
                })
                .collect()
        }),
    }
}

/// Client-side `id`, `userId` and share amounts are dropped here.
fn draft(payload: ExpenseNew) -> ExpenseDraft {
    ExpenseDraft {
        title: payload.title,
        amount: payload.amount,
        date: payload.date,
        category: payload.category,
        payment_method: payload.payment_method,
        participants: payload
            .shared_with
            .unwrap_or_default()
            .into_iter()
            .map(|share| share.user_id)
            .collect(),
    }
}

pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let expenses = state
        .engine
        .list_expenses(identity.user_id)
        .await?
        .into_iter()
        .map(map_expense)
        .collect();
    Ok(Json(expenses))
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<ExpenseNew>, ServerError>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    if let Some(owner) = &payload.user_id {
        tracing::debug!(user_id = identity.user_id, claimed = %owner, "ignoring owner in expense body");
    }
    let expense = state
        .engine
        .create_expense(identity.user_id, draft(payload))
        .await?;
    tracing::info!(user_id = identity.user_id, expense_id = %expense.id, "expense created");

    Ok((StatusCode::CREATED, Json(map_expense(expense))))
}

pub async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<ExpenseNew>, ServerError>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state
        .engine
        .update_expense(identity.user_id, &expense_id, draft(payload))
        .await?;
    tracing::info!(user_id = identity.user_id, %expense_id, "expense updated");

    Ok(Json(map_expense(expense)))
}

pub async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(identity.user_id, &expense_id)
        .await?;
    tracing::info!(user_id = identity.user_id, %expense_id, "expense deleted");

    Ok(StatusCode::NO_CONTENT)
}
