use std::time::Duration;

use tokio::time::Instant;

use crate::{core::activity::ActivityBook, integrations::signup::ApiError};

use self::cmd::{ActivityRef, Command, EntryRef};

pub mod cmd;
pub mod render;

/// How long a sign-up outcome message stays on the frame
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Events driving the board loop
#[derive(Debug)]
pub enum BoardEvent {
    /// One line typed by the operator
    Input(String),

    /// Operator input ended (stdin closed)
    Closed,

    Fetched(Result<ActivityBook, ApiError>),
    SignedUp(Result<String, ApiError>),
    Unregistered {
        activity: String,
        email: String,
        outcome: Result<(), ApiError>,
    },
}

/// Requests the loop issues on the board's behalf
#[derive(PartialEq, Debug)]
pub enum Request {
    Fetch,
    SignUp { activity: String, email: String },
    Unregister { activity: String, email: String },
    Quit,
}

/// What the list area is currently showing
#[derive(PartialEq, Debug)]
enum Snapshot {
    Loading,
    Ready(ActivityBook),
    Failed,
}

/// The sign-up form: a sticky email plus the picked activity
#[derive(Default, PartialEq, Debug)]
struct Draft {
    email: Option<String>,
    activity: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum BannerKind {
    Success,
    Error,
}

/// A transient outcome message and its hide deadline
#[derive(Debug)]
struct Banner {
    kind: BannerKind,
    text: String,
    expires_at: Instant,
}

/// An unregister waiting for its [y/N] answer
#[derive(PartialEq, Debug)]
struct PendingUnregister {
    activity: String,
    email: String,
}

/// All state behind the rendered frame
pub struct Board {
    snapshot: Snapshot,
    draft: Draft,
    banner: Option<Banner>,
    pending: Option<PendingUnregister>,
    notices: Vec<String>,
}

impl Board {
    pub fn new(email: Option<String>) -> Self {
        Board {
            snapshot: Snapshot::Loading,
            draft: Draft {
                email,
                activity: None,
            },
            banner: None,
            pending: None,
            notices: Vec::new(),
        }
    }

    /// Applies one event, returning the requests the loop should issue
    pub fn handle_event(&mut self, event: BoardEvent) -> Vec<Request> {
        match event {
            BoardEvent::Input(line) => self.handle_line(&line),
            BoardEvent::Closed => vec![Request::Quit],
            BoardEvent::Fetched(outcome) => {
                self.apply_fetch(outcome);
                Vec::new()
            }
            BoardEvent::SignedUp(outcome) => self.apply_signup(outcome).into_iter().collect(),
            BoardEvent::Unregistered {
                activity,
                email,
                outcome,
            } => self
                .apply_unregister(&activity, &email, outcome)
                .into_iter()
                .collect(),
        }
    }

    fn handle_line(&mut self, line: &str) -> Vec<Request> {
        // an open confirmation prompt consumes the next line, whatever it is
        if let Some(pending) = self.pending.take() {
            return self.answer_confirmation(pending, line).into_iter().collect();
        }

        if line.trim().is_empty() {
            return Vec::new();
        }

        match cmd::parse_cmd(line) {
            Ok(command) => self.run_command(command).into_iter().collect(),
            Err(e) => {
                self.notices.push(format!("Failed to run command: {}", e));
                Vec::new()
            }
        }
    }

    fn run_command(&mut self, command: Command) -> Option<Request> {
        match command {
            Command::Refresh => Some(Request::Fetch),
            Command::SetEmail(email) => {
                self.draft.email = Some(email);
                None
            }
            Command::Pick(target) => {
                if let Some(name) = self.resolve_activity(&target) {
                    self.draft.activity = Some(name);
                }
                None
            }
            Command::Submit { activity, email } => self.submit(activity, email),
            Command::Unregister(target) => {
                if let Some((activity, email)) = self.resolve_entry(target) {
                    self.pending = Some(PendingUnregister { activity, email });
                }
                None
            }
            Command::Help => {
                self.notices.push(render::HELP.to_owned());
                None
            }
            Command::Quit => Some(Request::Quit),
        }
    }

    /// Submits the sign-up form, optionally filling it from the command's
    /// own arguments first
    fn submit(&mut self, activity: Option<ActivityRef>, email: Option<String>) -> Option<Request> {
        if let Some(target) = activity {
            match self.resolve_activity(&target) {
                Some(name) => self.draft.activity = Some(name),
                None => return None,
            }
        }

        if let Some(email) = email {
            self.draft.email = Some(email);
        }

        let activity = match &self.draft.activity {
            Some(name) => name.clone(),
            None => {
                self.notices
                    .push("Pick an activity first (e.g. 'pick 1').".to_owned());
                return None;
            }
        };

        let email = match &self.draft.email {
            Some(email) => email.clone(),
            None => {
                self.notices
                    .push("Set your email first (e.g. 'email you@mergington.edu').".to_owned());
                return None;
            }
        };

        Some(Request::SignUp { activity, email })
    }

    fn answer_confirmation(&mut self, pending: PendingUnregister, line: &str) -> Option<Request> {
        if matches!(line.trim().to_lowercase().as_str(), "y" | "yes") {
            Some(Request::Unregister {
                activity: pending.activity,
                email: pending.email,
            })
        } else {
            self.notices.push("Unregister cancelled.".to_owned());
            None
        }
    }

    /// Maps an activity argument to its canonical name on the board, the
    /// way the form's selector restricts choices to listed options
    fn resolve_activity(&mut self, target: &ActivityRef) -> Option<String> {
        let book = match &self.snapshot {
            Snapshot::Ready(book) => book,
            _ => {
                self.notices
                    .push("No activities are loaded yet, try 'refresh'.".to_owned());
                return None;
            }
        };

        match target {
            ActivityRef::Index(number) => {
                match number.checked_sub(1).and_then(|i| book.by_index(i)) {
                    Some((name, _)) => Some(name.to_owned()),
                    None => {
                        self.notices
                            .push(format!("No activity numbered {} on the board.", number));
                        None
                    }
                }
            }
            ActivityRef::Name(name) => match book.resolve_name(name) {
                Some(canonical) => Some(canonical.to_owned()),
                None => {
                    self.notices
                        .push(format!("No activity named '{}' on the board.", name));
                    None
                }
            },
        }
    }

    /// Maps an unregister target to an (activity, email) entry listed on
    /// the current frame
    fn resolve_entry(&mut self, target: EntryRef) -> Option<(String, String)> {
        let book = match &self.snapshot {
            Snapshot::Ready(book) => book,
            _ => {
                self.notices
                    .push("No activities are loaded yet, try 'refresh'.".to_owned());
                return None;
            }
        };

        match target {
            EntryRef::Pair { activity, email } => {
                let canonical = match book.resolve_name(&activity) {
                    Some(canonical) => canonical.to_owned(),
                    None => {
                        self.notices
                            .push(format!("No activity named '{}' on the board.", activity));
                        return None;
                    }
                };

                match book.get(&canonical) {
                    Some(details) if details.has_participant(&email) => Some((canonical, email)),
                    _ => {
                        self.notices.push(format!(
                            "No participant {} in '{}' on the board.",
                            email, canonical
                        ));
                        None
                    }
                }
            }
            EntryRef::Entry(number) => {
                let entries = book.roster_entries();
                match number.checked_sub(1).and_then(|i| entries.get(i)) {
                    Some((activity, email)) => Some(((*activity).to_owned(), (*email).to_owned())),
                    None => {
                        self.notices
                            .push(format!("No participant entry #{} on the board.", number));
                        None
                    }
                }
            }
        }
    }

    fn apply_fetch(&mut self, outcome: Result<ActivityBook, ApiError>) {
        match outcome {
            Ok(book) => {
                // the picked activity resets with the rebuilt option list;
                // the email field survives
                self.draft.activity = None;
                self.snapshot = Snapshot::Ready(book);
            }
            Err(e) => {
                log::error!("Error fetching activities: {}", e);
                self.snapshot = Snapshot::Failed;
            }
        }
    }

    fn apply_signup(&mut self, outcome: Result<String, ApiError>) -> Option<Request> {
        match outcome {
            Ok(message) => {
                self.show_banner(BannerKind::Success, message);
                self.draft = Draft::default();
                Some(Request::Fetch)
            }
            Err(e @ ApiError::Rejected { .. }) => {
                log::debug!("Sign-up rejected: {}", e);
                let text = e.detail().unwrap_or("An error occurred").to_owned();
                self.show_banner(BannerKind::Error, text);
                None
            }
            Err(e) => {
                log::error!("Error signing up: {}", e);
                self.show_banner(
                    BannerKind::Error,
                    "Failed to sign up. Please try again.".to_owned(),
                );
                None
            }
        }
    }

    fn apply_unregister(
        &mut self,
        activity: &str,
        email: &str,
        outcome: Result<(), ApiError>,
    ) -> Option<Request> {
        match outcome {
            Ok(()) => {
                // drop the entry right away; the follow-up refresh reconciles
                if let Snapshot::Ready(book) = &mut self.snapshot {
                    if let Some(details) = book.get_mut(activity) {
                        details.remove_participant(email);
                    }
                }
                Some(Request::Fetch)
            }
            Err(e @ ApiError::Rejected { .. }) => {
                log::debug!("Unregister rejected: {}", e);
                let text = e.detail().unwrap_or("Failed to unregister participant").to_owned();
                self.alert(&text);
                None
            }
            Err(e) => {
                log::error!("Error unregistering: {}", e);
                self.alert("Failed to unregister. Please try again.");
                None
            }
        }
    }

    fn alert(&mut self, text: &str) {
        self.notices.push(format!("!! {}", render::sanitize(text)));
    }

    fn show_banner(&mut self, kind: BannerKind, text: String) {
        self.banner = Some(Banner {
            kind,
            text,
            expires_at: Instant::now() + MESSAGE_TTL,
        });
    }

    /// When the frame next needs repainting on its own
    pub fn banner_deadline(&self) -> Option<Instant> {
        self.banner.as_ref().map(|banner| banner.expires_at)
    }

    /// Hides the outcome message once its 5 seconds are up
    pub fn expire_banner(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|banner| banner.expires_at <= now) {
            self.banner = None;
        }
    }

    /// Drains the one-shot lines the loop prints above the next frame
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Builds the full text frame
    pub fn render(&self) -> String {
        let mut frame = String::new();

        frame.push_str("Activities\n==========\n\n");
        match &self.snapshot {
            Snapshot::Loading => {
                frame.push_str(render::LOADING);
                frame.push('\n');
            }
            Snapshot::Failed => {
                frame.push_str(render::LOAD_FAILED);
                frame.push('\n');
            }
            Snapshot::Ready(book) => frame.push_str(&render::activity_list(book)),
        }

        frame.push('\n');

        if let Some(banner) = &self.banner {
            frame.push_str(&render::banner_line(banner.kind, &banner.text));
            frame.push('\n');
        }

        frame.push_str(&render::form_line(
            self.draft.email.as_deref(),
            self.draft.activity.as_deref(),
        ));
        frame.push('\n');

        if let Some(pending) = &self.pending {
            frame.push_str(&render::confirm_line(&pending.email, &pending.activity));
            frame.push('\n');
        }

        frame
    }
}
