use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use postdeck_db::models::NewAccount;
use postdeck_types::api::{Claims, CreateConnectedAccountRequest, SuccessResponse};
use postdeck_types::models::{ConnectedAccount, Platform};

use crate::error::ApiErr;
use crate::state::{AppState, db_task};

/// GET /api/connected-accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ConnectedAccount>>, ApiErr> {
    let uid = claims.sub;
    let accounts = db_task(&state, move |db| {
        db.list_accounts(&uid)?
            .into_iter()
            .map(ConnectedAccount::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await
    .map_err(ApiErr::from_db("list_accounts"))?;

    Ok(Json(accounts))
}

/// POST /api/connected-accounts — record an account the client linked
/// itself. Always inserts; repeated submissions produce repeated rows.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateConnectedAccountRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(req) = payload?;

    let platform: Platform = req
        .platform
        .parse()
        .map_err(|_| ApiErr::bad_request("Invalid request data"))?;

    let account = NewAccount {
        user_id: claims.sub,
        platform,
        account_name: req.account_name,
        account_id: req.account_id,
        access_token: req.access_token,
        refresh_token: req.refresh_token,
        token_expires_at: req.token_expires_at,
        is_connected: req.is_connected,
    };

    let created = db_task(&state, move |db| {
        let row = db.insert_account(&account)?;
        ConnectedAccount::try_from(row)
    })
    .await
    .map_err(ApiErr::from_db("insert_account"))?;

    info!("User {} added {} account {}", created.user_id, created.platform, created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/connected-accounts/{id} — disconnect. Accounts owned by
/// someone else look exactly like missing ones.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiErr> {
    let Path(account_id) = path?;
    let uid = claims.sub.clone();
    let aid = account_id.to_string();

    let deleted = db_task(&state, move |db| {
        match db.get_account(&aid)? {
            Some(account) if account.user_id == uid => db.delete_account(&aid),
            _ => Ok(false),
        }
    })
    .await
    .map_err(ApiErr::from_db("delete_account"))?;

    if !deleted {
        return Err(ApiErr::not_found("Account not found"));
    }

    info!("User {} disconnected account {}", claims.sub, account_id);
    Ok(Json(SuccessResponse::ok()))
}
