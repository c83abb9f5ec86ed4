use std::{collections::HashMap, convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::core::store::ActivityStore;

use super::handlers::{list_activities, sign_up, unregister};

pub fn with_store(
    store: Arc<ActivityStore>,
) -> impl Filter<Extract = (Arc<ActivityStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

pub fn api_filters(
    store: Arc<ActivityStore>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let list_activities = warp::path!("activities")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(list_activities);

    let sign_up = warp::path!("activities" / String / "signup")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_store(store.clone()))
        .and_then(sign_up);

    let unregister = warp::path!("activities" / String / "unregister")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_store(store))
        .and_then(unregister);

    list_activities.or(sign_up).or(unregister)
}
