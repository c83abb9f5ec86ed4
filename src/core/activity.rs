use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// A single activity as the sign-up service describes it
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub description: String,

    /// Human-readable meeting times, e.g. "Fridays, 3:30 PM - 5:00 PM"
    pub schedule: String,

    pub max_participants: u32,

    /// Registered emails, in sign-up order
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Activity {
    /// Remaining capacity, clamped at zero for display
    pub fn spots_left(&self) -> u32 {
        self.max_participants
            .saturating_sub(self.participants.len() as u32)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() as u32 >= self.max_participants
    }

    pub fn has_participant(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p == email)
    }

    /// Drops one registration, returning whether it was present
    pub fn remove_participant(&mut self, email: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != email);
        self.participants.len() != before
    }
}

/// All activities keyed by name, kept in the order the service sent them
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ActivityBook {
    entries: Vec<(String, Activity)>,
}

impl ActivityBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an activity, replacing any earlier one with the same name
    pub fn insert(&mut self, name: String, activity: Activity) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = activity,
            None => self.entries.push((name, activity)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Activity> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Position-based access for numbered frames (zero-based)
    pub fn by_index(&self, index: usize) -> Option<(&str, &Activity)> {
        self.entries.get(index).map(|(n, a)| (n.as_str(), a))
    }

    /// Finds the canonical name matching a case-insensitive guess
    pub fn resolve_name(&self, guess: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(|(n, _)| n.as_str())
            .find(|n| n.eq_ignore_ascii_case(guess))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Activity)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Every (activity, email) pair on the board, in display order
    pub fn roster_entries(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(n, a)| a.participants.iter().map(move |p| (n.as_str(), p.as_str())))
            .collect()
    }
}

impl Serialize for ActivityBook {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, activity) in &self.entries {
            map.serialize_entry(name, activity)?;
        }
        map.end()
    }
}

struct BookVisitor;

impl<'de> Visitor<'de> for BookVisitor {
    type Value = ActivityBook;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of activity names to activity details")
    }

    // MapAccess hands entries over in document order, which is the order
    // the board must display
    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut book = ActivityBook {
            entries: Vec::with_capacity(access.size_hint().unwrap_or(0)),
        };

        while let Some((name, activity)) = access.next_entry::<String, Activity>()? {
            book.insert(name, activity);
        }

        Ok(book)
    }
}

impl<'de> Deserialize<'de> for ActivityBook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BookVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(max_participants: u32, participants: &[&str]) -> Activity {
        Activity {
            description: "desc".to_owned(),
            schedule: "Fridays".to_owned(),
            max_participants,
            participants: participants.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[test]
    fn test_spots_left() {
        assert_eq!(activity(10, &["a@x.edu", "b@x.edu"]).spots_left(), 8);
        assert_eq!(activity(2, &["a@x.edu", "b@x.edu"]).spots_left(), 0);

        // an overfull roster still displays as zero, never negative
        assert_eq!(activity(1, &["a@x.edu", "b@x.edu"]).spots_left(), 0);
    }

    #[test]
    fn test_remove_participant() {
        let mut act = activity(10, &["a@x.edu", "b@x.edu"]);

        assert!(act.remove_participant("a@x.edu"));
        assert_eq!(act.participants, vec!["b@x.edu".to_owned()]);
        assert!(!act.remove_participant("a@x.edu"));
    }

    #[test]
    fn test_book_preserves_document_order() {
        let json = r#"{
            "Zeta Club": {"description": "z", "schedule": "s", "max_participants": 5, "participants": []},
            "Alpha Club": {"description": "a", "schedule": "s", "max_participants": 5, "participants": []}
        }"#;

        let book: ActivityBook = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = book.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Zeta Club", "Alpha Club"]);

        // and order survives a re-serialize
        let out = serde_json::to_string(&book).unwrap();
        assert!(out.find("Zeta Club").unwrap() < out.find("Alpha Club").unwrap());
    }

    #[test]
    fn test_missing_participants_reads_as_empty() {
        let json = r#"{"Chess Club": {"description": "d", "schedule": "s", "max_participants": 12}}"#;

        let book: ActivityBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.get("Chess Club").unwrap().participants.len(), 0);
        assert_eq!(book.get("Chess Club").unwrap().spots_left(), 12);
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut book = ActivityBook::new();
        book.insert("Chess Club".to_owned(), activity(12, &[]));
        book.insert("Chess Club".to_owned(), activity(8, &["a@x.edu"]));

        assert_eq!(book.len(), 1);
        assert_eq!(book.get("Chess Club").unwrap().max_participants, 8);
    }

    #[test]
    fn test_resolve_name_is_case_insensitive() {
        let mut book = ActivityBook::new();
        book.insert("Chess Club".to_owned(), activity(12, &[]));

        assert_eq!(book.resolve_name("chess club"), Some("Chess Club"));
        assert_eq!(book.resolve_name("CHESS CLUB"), Some("Chess Club"));
        assert_eq!(book.resolve_name("Checkers"), None);
    }

    #[test]
    fn test_roster_entries_follow_display_order() {
        let mut book = ActivityBook::new();
        book.insert("Chess Club".to_owned(), activity(12, &["a@x.edu", "b@x.edu"]));
        book.insert("Art Studio".to_owned(), activity(18, &["c@x.edu"]));

        assert_eq!(
            book.roster_entries(),
            vec![
                ("Chess Club", "a@x.edu"),
                ("Chess Club", "b@x.edu"),
                ("Art Studio", "c@x.edu"),
            ]
        );
    }
}
