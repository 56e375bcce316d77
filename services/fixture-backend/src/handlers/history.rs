use axum::{extract::State, Json};
use shared::api::{HistoryQuery, HistoryResponse};

use crate::{
    errors::Result,
    extractors::{BearerAuth, ValidatedQuery},
    state::AppState,
};

pub async fn bet_history(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let history = state.house.lock().history(&query)?;

    tracing::debug!(
        page = query.page,
        page_size = query.page_size,
        returned = history.items.len(),
        total = history.total_count,
        "History served"
    );
    Ok(Json(history))
}
