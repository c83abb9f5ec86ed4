use thiserror::Error;
use tokio::sync::RwLock;

use super::activity::{Activity, ActivityBook};

/// Rejections produced by the sign-up rules; the display strings go out
/// verbatim as the `detail` field
#[derive(Error, PartialEq, Eq, Debug)]
pub enum StoreError {
    #[error("Activity not found")]
    UnknownActivity,

    #[error("Student already signed up for this activity")]
    AlreadySignedUp,

    #[error("Activity is full")]
    ActivityFull,

    #[error("Participant not found for this activity")]
    UnknownParticipant,
}

/// In-memory roster state for the practice sign-up service
pub struct ActivityStore {
    activities: RwLock<ActivityBook>,
}

fn seeded(
    description: &str,
    schedule: &str,
    max_participants: u32,
    participants: &[&str],
) -> Activity {
    Activity {
        description: description.to_owned(),
        schedule: schedule.to_owned(),
        max_participants,
        participants: participants.iter().map(|p| (*p).to_owned()).collect(),
    }
}

impl ActivityStore {
    pub fn new(book: ActivityBook) -> Self {
        ActivityStore {
            activities: RwLock::new(book),
        }
    }

    /// The roster the service starts with when no seed file is given
    pub fn sample() -> Self {
        let mut book = ActivityBook::new();

        book.insert(
            "Chess Club".to_owned(),
            seeded(
                "Learn strategies and compete in chess tournaments",
                "Fridays, 3:30 PM - 5:00 PM",
                12,
                &["michael@mergington.edu", "daniel@mergington.edu"],
            ),
        );
        book.insert(
            "Programming Class".to_owned(),
            seeded(
                "Learn programming fundamentals and build software projects",
                "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
                20,
                &["emma@mergington.edu", "sophia@mergington.edu"],
            ),
        );
        book.insert(
            "Gym Class".to_owned(),
            seeded(
                "Physical education and sports activities",
                "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
                30,
                &["john@mergington.edu", "olivia@mergington.edu"],
            ),
        );
        book.insert(
            "Soccer Club".to_owned(),
            seeded(
                "Outdoor soccer practice and inter-school matches",
                "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                22,
                &["alex@mergington.edu", "nina@mergington.edu"],
            ),
        );
        book.insert(
            "Basketball Team".to_owned(),
            seeded(
                "Competitive basketball team training and games",
                "Mondays, Wednesdays, 5:00 PM - 7:00 PM",
                15,
                &["kevin@mergington.edu", "rachel@mergington.edu"],
            ),
        );
        book.insert(
            "Art Studio".to_owned(),
            seeded(
                "Drawing, painting, and mixed-media workshops",
                "Wednesdays, 3:30 PM - 5:00 PM",
                18,
                &["isabella@mergington.edu", "liam@mergington.edu"],
            ),
        );
        book.insert(
            "Drama Club".to_owned(),
            seeded(
                "Acting, stagecraft, and theater productions",
                "Fridays, 4:00 PM - 6:00 PM",
                25,
                &["harper@mergington.edu", "mason@mergington.edu"],
            ),
        );
        book.insert(
            "Math Club".to_owned(),
            seeded(
                "Problem-solving sessions, math contests, and enrichment",
                "Thursdays, 3:30 PM - 4:30 PM",
                20,
                &["oliver@mergington.edu", "ava@mergington.edu"],
            ),
        );
        book.insert(
            "Science Olympiad".to_owned(),
            seeded(
                "Hands-on experiments and team competitions in science",
                "Saturdays, 9:00 AM - 12:00 PM",
                24,
                &["noah@mergington.edu", "mia@mergington.edu"],
            ),
        );

        Self::new(book)
    }

    pub async fn snapshot(&self) -> ActivityBook {
        self.activities.read().await.clone()
    }

    /// Registers an email, returning the confirmation message
    pub async fn sign_up(&self, activity: &str, email: &str) -> Result<String, StoreError> {
        let mut book = self.activities.write().await;
        let details = book.get_mut(activity).ok_or(StoreError::UnknownActivity)?;

        if details.has_participant(email) {
            return Err(StoreError::AlreadySignedUp);
        }
        if details.is_full() {
            return Err(StoreError::ActivityFull);
        }

        details.participants.push(email.to_owned());
        Ok(format!("Signed up {} for {}", email, activity))
    }

    /// Removes a registration, returning the confirmation message
    pub async fn unregister(&self, activity: &str, email: &str) -> Result<String, StoreError> {
        let mut book = self.activities.write().await;
        let details = book.get_mut(activity).ok_or(StoreError::UnknownActivity)?;

        if !details.remove_participant(email) {
            return Err(StoreError::UnknownParticipant);
        }

        Ok(format!("Unregistered {} from {}", email, activity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store() -> ActivityStore {
        let mut book = ActivityBook::new();
        book.insert(
            "Chess Club".to_owned(),
            seeded("chess", "Fridays", 2, &["michael@mergington.edu"]),
        );
        ActivityStore::new(book)
    }

    #[tokio::test]
    async fn test_sign_up_appends_and_confirms() {
        let store = small_store();

        let message = store.sign_up("Chess Club", "ava@mergington.edu").await.unwrap();
        assert_eq!(message, "Signed up ava@mergington.edu for Chess Club");

        let book = store.snapshot().await;
        assert_eq!(
            book.get("Chess Club").unwrap().participants,
            vec!["michael@mergington.edu".to_owned(), "ava@mergington.edu".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let store = small_store();

        assert_eq!(
            store.sign_up("Knitting", "ava@mergington.edu").await,
            Err(StoreError::UnknownActivity)
        );
        assert_eq!(
            store.sign_up("Chess Club", "michael@mergington.edu").await,
            Err(StoreError::AlreadySignedUp)
        );

        store.sign_up("Chess Club", "ava@mergington.edu").await.unwrap();
        assert_eq!(
            store.sign_up("Chess Club", "leo@mergington.edu").await,
            Err(StoreError::ActivityFull)
        );
    }

    #[tokio::test]
    async fn test_unregister_removes_and_rejects_missing() {
        let store = small_store();

        assert_eq!(
            store.unregister("Chess Club", "ava@mergington.edu").await,
            Err(StoreError::UnknownParticipant)
        );

        let message = store
            .unregister("Chess Club", "michael@mergington.edu")
            .await
            .unwrap();
        assert_eq!(message, "Unregistered michael@mergington.edu from Chess Club");

        let book = store.snapshot().await;
        assert!(book.get("Chess Club").unwrap().participants.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_the_store() {
        let store = small_store();

        let mut snapshot = store.snapshot().await;
        snapshot.get_mut("Chess Club").unwrap().participants.clear();

        let fresh = store.snapshot().await;
        assert_eq!(fresh.get("Chess Club").unwrap().participants.len(), 1);
    }

    #[tokio::test]
    async fn test_sample_matches_capacity_rules() {
        let store = ActivityStore::sample();
        let book = store.snapshot().await;

        assert_eq!(book.len(), 9);
        let (first, chess) = book.by_index(0).unwrap();
        assert_eq!(first, "Chess Club");
        assert_eq!(chess.spots_left(), 10);
    }
}
