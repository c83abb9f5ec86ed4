use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use url::Url;

use crate::core::activity::ActivityBook;

/// Body of a successful mutation, `{"message": ...}`
#[derive(Deserialize, Debug)]
struct Confirmation {
    message: String,
}

/// Body of a rejected request, `{"detail": ...}`
#[derive(Deserialize, Debug, Default)]
struct Failure {
    #[serde(default)]
    detail: Option<String>,
}

/// Failures from the sign-up service, split the way the board reports them
#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("request rejected by the sign-up service ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },

    /// The service could not be reached at all
    #[error("could not reach the sign-up service: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The service answered, but not with the JSON the board expects
    #[error("unreadable reply from the sign-up service: {0}")]
    BadReply(#[source] serde_json::Error),
}

impl ApiError {
    /// Failure text supplied by the service, when it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// HTTP client for the activity sign-up service
#[derive(Clone)]
pub struct SignupService {
    http: reqwest::Client,
    base: Url,
}

impl SignupService {
    pub fn new(base: Url) -> anyhow::Result<Self> {
        if base.cannot_be_a_base() {
            anyhow::bail!("service URL '{}' cannot carry endpoint paths", base);
        }

        Ok(SignupService {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// Fetches the full activity book, in server order
    pub async fn fetch_activities(&self) -> Result<ActivityBook, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .expect("service URL verified in new()")
            .pop_if_empty()
            .push("activities");

        let response = self.http.get(url).send().await?;
        let book: ActivityBook = Self::read_json(response).await?;

        log::debug!("Fetched {} activities", book.len());
        Ok(book)
    }

    /// Registers an email for an activity, returning the service's message
    pub async fn sign_up(&self, activity: &str, email: &str) -> Result<String, ApiError> {
        let url = self.mutation_url(activity, "signup", email);

        let response = self.http.post(url).send().await?;
        let confirmation: Confirmation = Self::read_json(response).await?;
        Ok(confirmation.message)
    }

    /// Removes an email from an activity's roster
    pub async fn unregister(&self, activity: &str, email: &str) -> Result<(), ApiError> {
        let url = self.mutation_url(activity, "unregister", email);

        let response = self.http.post(url).send().await?;

        // the reply body only matters as far as being well-formed
        let _: serde_json::Value = Self::read_json(response).await?;
        Ok(())
    }

    /// Builds `/activities/{name}/{op}?email={email}` with both the path
    /// segment and the query value percent-encoded
    fn mutation_url(&self, activity: &str, op: &str, email: &str) -> Url {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .expect("service URL verified in new()")
            .pop_if_empty()
            .push("activities")
            .push(activity)
            .push(op);
        url.query_pairs_mut().append_pair("email", email);
        url
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<Failure>(&body)
                .ok()
                .and_then(|failure| failure.detail);
            return Err(ApiError::Rejected { status, detail });
        }

        serde_json::from_slice(&body).map_err(ApiError::BadReply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warp::Filter;

    use crate::{
        core::{
            activity::{Activity, ActivityBook},
            store::ActivityStore,
        },
        web,
    };

    use super::*;

    fn fixture_book() -> ActivityBook {
        let mut book = ActivityBook::new();
        book.insert(
            "Chess Club".to_owned(),
            Activity {
                description: "Learn strategies and compete in chess tournaments".to_owned(),
                schedule: "Fridays, 3:30 PM - 5:00 PM".to_owned(),
                max_participants: 10,
                participants: vec![
                    "michael@mergington.edu".to_owned(),
                    "daniel@mergington.edu".to_owned(),
                ],
            },
        );
        book.insert(
            "Art Studio".to_owned(),
            Activity {
                description: "Drawing and painting".to_owned(),
                schedule: "Wednesdays, 3:30 PM - 5:00 PM".to_owned(),
                max_participants: 1,
                participants: vec!["isabella@mergington.edu".to_owned()],
            },
        );
        book
    }

    async fn start_service(book: ActivityBook) -> SignupService {
        let store = Arc::new(ActivityStore::new(book));
        let (addr, server) = warp::serve(web::routes(store)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        SignupService::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_keeps_server_order() {
        let service = start_service(fixture_book()).await;

        let book = service.fetch_activities().await.unwrap();
        let names: Vec<&str> = book.iter().map(|(n, _)| n).collect();

        assert_eq!(names, vec!["Chess Club", "Art Studio"]);
        assert_eq!(book.get("Chess Club").unwrap().spots_left(), 8);
    }

    #[tokio::test]
    async fn test_sign_up_round_trip() {
        let service = start_service(fixture_book()).await;

        let message = service.sign_up("Chess Club", "ava@mergington.edu").await.unwrap();
        assert_eq!(message, "Signed up ava@mergington.edu for Chess Club");

        let book = service.fetch_activities().await.unwrap();
        assert!(book.get("Chess Club").unwrap().has_participant("ava@mergington.edu"));
    }

    #[tokio::test]
    async fn test_sign_up_rejections_carry_detail() {
        let service = start_service(fixture_book()).await;

        let err = service
            .sign_up("Chess Club", "michael@mergington.edu")
            .await
            .unwrap_err();
        assert_eq!(err.detail(), Some("Student already signed up for this activity"));

        let err = service.sign_up("Knitting", "ava@mergington.edu").await.unwrap_err();
        match err {
            ApiError::Rejected { status, detail } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(detail.as_deref(), Some("Activity not found"));
            }
            other => panic!("expected a rejection, got {:?}", other),
        }

        let err = service.sign_up("Art Studio", "ava@mergington.edu").await.unwrap_err();
        assert_eq!(err.detail(), Some("Activity is full"));
    }

    #[tokio::test]
    async fn test_unregister_round_trip() {
        let service = start_service(fixture_book()).await;

        service
            .unregister("Chess Club", "michael@mergington.edu")
            .await
            .unwrap();

        let book = service.fetch_activities().await.unwrap();
        assert!(!book.get("Chess Club").unwrap().has_participant("michael@mergington.edu"));

        let err = service
            .unregister("Chess Club", "michael@mergington.edu")
            .await
            .unwrap_err();
        assert_eq!(err.detail(), Some("Participant not found for this activity"));
    }

    #[tokio::test]
    async fn test_names_and_emails_survive_encoding() {
        let mut book = fixture_book();
        book.insert(
            "Dungeons & Dragons".to_owned(),
            Activity {
                description: "Tabletop campaigns".to_owned(),
                schedule: "Mondays, 4:00 PM - 6:00 PM".to_owned(),
                max_participants: 6,
                participants: vec![],
            },
        );
        let service = start_service(book).await;

        service
            .sign_up("Dungeons & Dragons", "kai+dnd@mergington.edu")
            .await
            .unwrap();

        let book = service.fetch_activities().await.unwrap();
        assert!(book
            .get("Dungeons & Dragons")
            .unwrap()
            .has_participant("kai+dnd@mergington.edu"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_transport_failure() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = SignupService::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap();

        let err = service.fetch_activities().await.unwrap_err();
        assert!(matches!(err, ApiError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_a_parse_failure() {
        let routes = warp::path!("activities").map(|| "not json at all");
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let service = SignupService::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap();

        let err = service.fetch_activities().await.unwrap_err();
        assert!(matches!(err, ApiError::BadReply(_)));
    }

    #[test]
    fn test_mutation_url_encodes_path_and_query() {
        let service = SignupService::new(Url::parse("http://localhost:8000").unwrap()).unwrap();

        let url = service.mutation_url("Chess Club", "signup", "a b@mergington.edu");
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/activities/Chess%20Club/signup?email=a+b%40mergington.edu"
        );

        let service = SignupService::new(Url::parse("http://host/api/").unwrap()).unwrap();
        let url = service.mutation_url("Gym Class", "unregister", "x@y.edu");
        assert_eq!(
            url.as_str(),
            "http://host/api/activities/Gym%20Class/unregister?email=x%40y.edu"
        );
    }
}
