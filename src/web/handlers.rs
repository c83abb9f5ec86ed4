use std::{collections::HashMap, convert::Infallible, sync::Arc};

use percent_encoding::percent_decode_str;
use serde::Serialize;
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
};

use crate::core::store::{ActivityStore, StoreError};

/// A Json struct carrying a mutation's confirmation text
#[derive(Serialize, Debug)]
struct Confirmation {
    message: String,
}

/// A Json struct explaining a rejected request
#[derive(Serialize, Debug)]
struct Explanation {
    detail: String,
}

/// Path parameters reach the handler still percent-encoded
fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

pub fn explain(status: StatusCode, detail: &str) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&Explanation {
            detail: detail.to_owned(),
        }),
        status,
    )
}

fn confirm(message: String) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&Confirmation { message }), StatusCode::OK)
}

fn missing_email() -> WithStatus<Json> {
    explain(StatusCode::UNPROCESSABLE_ENTITY, "Field 'email' is required")
}

fn status_for(error: &StoreError) -> StatusCode {
    match error {
        StoreError::UnknownActivity | StoreError::UnknownParticipant => StatusCode::NOT_FOUND,
        StoreError::AlreadySignedUp | StoreError::ActivityFull => StatusCode::BAD_REQUEST,
    }
}

fn to_http_outcome(result: Result<String, StoreError>) -> Result<WithStatus<Json>, Infallible> {
    match result {
        Ok(message) => Ok(confirm(message)),
        Err(e) => {
            log::warn!("{}", e);
            Ok(explain(status_for(&e), &e.to_string()))
        }
    }
}

pub async fn list_activities(store: Arc<ActivityStore>) -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&store.snapshot().await))
}

pub async fn sign_up(
    activity: String,
    args: HashMap<String, String>,
    store: Arc<ActivityStore>,
) -> Result<WithStatus<Json>, Infallible> {
    let activity = decode_segment(&activity);
    let email = match args.get("email") {
        Some(email) => email,
        None => return Ok(missing_email()),
    };

    to_http_outcome(store.sign_up(&activity, email).await)
}

pub async fn unregister(
    activity: String,
    args: HashMap<String, String>,
    store: Arc<ActivityStore>,
) -> Result<WithStatus<Json>, Infallible> {
    let activity = decode_segment(&activity);
    let email = match args.get("email") {
        Some(email) => email,
        None => return Ok(missing_email()),
    };

    to_http_outcome(store.unregister(&activity, email).await)
}
