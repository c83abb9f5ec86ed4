use crate::core::activity::{Activity, ActivityBook};

use super::BannerKind;

pub const LOADING: &str = "Loading activities...";
pub const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";
pub const NO_PARTICIPANTS: &str = "No participants yet";
pub const SELECT_PLACEHOLDER: &str = "-- Select an activity --";

pub const HELP: &str = "Commands:
  refresh                        reload the activity list
  email <address>                fill in the sign-up email
  pick <number|name>             choose the activity to sign up for
  signup [number|name] [email]   submit the sign-up form
  unregister <entry number>      remove a participant (asks to confirm)
  unregister <activity> <email>
  help                           show this text
  exit                           leave the board";

/// Replaces control and escape characters so service-supplied text cannot
/// mangle the terminal; everything else passes through literally
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}

/// One numbered activity card; the entry counter numbers participant
/// lines across the whole frame
fn activity_card(
    out: &mut String,
    number: usize,
    name: &str,
    activity: &Activity,
    entry_counter: &mut usize,
) {
    out.push_str(&format!("{}) {}\n", number, sanitize(name)));
    out.push_str(&format!("   {}\n", sanitize(&activity.description)));
    out.push_str(&format!("   Schedule: {}\n", sanitize(&activity.schedule)));
    out.push_str(&format!(
        "   Availability: {} spots left\n",
        activity.spots_left()
    ));
    out.push_str("   Participants:\n");

    if activity.participants.is_empty() {
        out.push_str(&format!("     {}\n", NO_PARTICIPANTS));
    } else {
        for email in &activity.participants {
            *entry_counter += 1;
            out.push_str(&format!("     #{} {}\n", entry_counter, sanitize(email)));
        }
    }
}

/// The activity list portion of a frame, in book order
pub fn activity_list(book: &ActivityBook) -> String {
    let mut out = String::new();
    let mut entry_counter = 0;

    for (number, (name, activity)) in book.iter().enumerate() {
        if number > 0 {
            out.push('\n');
        }
        activity_card(&mut out, number + 1, name, activity, &mut entry_counter);
    }

    out
}

pub fn banner_line(kind: BannerKind, text: &str) -> String {
    match kind {
        BannerKind::Success => format!("[ok] {}", sanitize(text)),
        BannerKind::Error => format!("[error] {}", sanitize(text)),
    }
}

/// The sign-up form status line
pub fn form_line(email: Option<&str>, activity: Option<&str>) -> String {
    format!(
        "Sign-up form: email: {} | activity: {}",
        email.map(sanitize).unwrap_or_else(|| "(not set)".to_owned()),
        activity
            .map(sanitize)
            .unwrap_or_else(|| SELECT_PLACEHOLDER.to_owned()),
    )
}

pub fn confirm_line(email: &str, activity: &str) -> String {
    format!(
        "Unregister {} from {}? [y/N]",
        sanitize(email),
        sanitize(activity)
    )
}
