use std::{convert::Infallible, sync::Arc};

use filters::api_filters;
use warp::{http::StatusCode, reject::Rejection, Filter};

use crate::core::store::ActivityStore;

pub mod filters;
pub mod handlers;

async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(err) = err.find::<warp::reject::MethodNotAllowed>() {
        log::error!("Method Not Allowed: {}", err);
        (StatusCode::METHOD_NOT_ALLOWED, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::InvalidQuery>() {
        log::error!("Invalid Query: {}", err);
        (StatusCode::BAD_REQUEST, err.to_string())
    } else {
        log::error!("Unhandled Rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(handlers::explain(code, &detail))
}

pub fn routes(
    store: Arc<ActivityStore>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    api_filters(store).recover(handle_rejection)
}

pub async fn run_http_server(store: Arc<ActivityStore>, port: u16) -> anyhow::Result<()> {
    log::info!("Sign-up service listening on port {}", port);

    warp::serve(routes(store)).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
