//! Search screen and the guest-scoped scratch data behind it.

use axum::Form;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::pages::{QueryParams, enter_action, enter_member, nav_query};
use super::views;
use crate::guard::{self, SEARCH_PATH};
use crate::navigation::{Route, navigate};
use crate::state::AppState;

/// `GET /search`: `?q=` is recorded in the instance's search history.
pub async fn search_page(State(state): State<AppState>, jar: CookieJar, params: QueryParams) -> Response {
    let query = nav_query(params);
    let member = match enter_member(&state, jar, |s| navigate(s, &Route::Search, &query)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };

    let q = query.get("q").map(str::trim).filter(|q| !q.is_empty());
    if let Some(q) = q {
        member.ctx.record_search(q).await;
    }
    let scratch = member.ctx.scratch().await;
    (member.jar, Html(views::search(&member.identity, &scratch, q, None))).into_response()
}

#[derive(Deserialize)]
pub struct BookmarkForm {
    #[serde(default)]
    item: String,
}

/// `POST /search/bookmarks`
pub async fn add_bookmark(State(state): State<AppState>, jar: CookieJar, Form(form): Form<BookmarkForm>) -> Response {
    let member = match enter_action(&state, jar, |s| guard::protected(s, false)).await {
        Ok(member) => member,
        Err(resp) => return resp,
    };
    if member.ctx.add_bookmark(&form.item).await {
        tracing::debug!("bookmark added");
    }
    (member.jar, Redirect::to(SEARCH_PATH)).into_response()
}
