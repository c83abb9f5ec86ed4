use thiserror::Error;

/// How a command names an activity: by frame number or by name
#[derive(PartialEq, Debug, Clone)]
pub enum ActivityRef {
    Index(usize),
    Name(String),
}

/// Which roster entry an unregister targets
#[derive(PartialEq, Debug)]
pub enum EntryRef {
    /// A numbered participant line on the current frame
    Entry(usize),
    Pair { activity: String, email: String },
}

/// A parsed operator command
#[derive(PartialEq, Debug)]
pub enum Command {
    Refresh,
    SetEmail(String),
    Pick(ActivityRef),
    Submit {
        activity: Option<ActivityRef>,
        email: Option<String>,
    },
    Unregister(EntryRef),
    Help,
    Quit,
}

#[derive(Error, PartialEq, Debug)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("{0}")]
    Usage(&'static str),
}

/// Activity names may contain spaces, so the remaining arguments are
/// joined back together before deciding between a number and a name
fn activity_ref(args: &[&str]) -> ActivityRef {
    let guess = args.join(" ");
    match guess.parse::<usize>() {
        Ok(index) => ActivityRef::Index(index),
        Err(_) => ActivityRef::Name(guess),
    }
}

fn parse_signup(args: &[&str]) -> Command {
    match args.split_last() {
        // a trailing email fills the form's email field as it submits
        Some((last, rest)) if last.contains('@') => Command::Submit {
            activity: (!rest.is_empty()).then(|| activity_ref(rest)),
            email: Some((*last).to_owned()),
        },
        Some(_) => Command::Submit {
            activity: Some(activity_ref(args)),
            email: None,
        },
        None => Command::Submit {
            activity: None,
            email: None,
        },
    }
}

fn parse_unregister(args: &[&str]) -> Result<Command, CommandError> {
    if args.len() == 1 {
        if let Ok(entry) = args[0].parse::<usize>() {
            return Ok(Command::Unregister(EntryRef::Entry(entry)));
        }
    }

    match args.split_last() {
        Some((last, rest)) if last.contains('@') && !rest.is_empty() => {
            Ok(Command::Unregister(EntryRef::Pair {
                activity: rest.join(" "),
                email: (*last).to_owned(),
            }))
        }
        _ => Err(CommandError::Usage(
            "usage: unregister <entry number>, or unregister <activity> <email>",
        )),
    }
}

/// Splits one input line into a command
pub fn parse_cmd(line: &str) -> Result<Command, CommandError> {
    let mut elements = line.split_whitespace();
    match elements.next() {
        Some(cmd) => {
            let args = elements.collect::<Vec<&str>>();
            match cmd.to_lowercase().as_str() {
                "refresh" if args.is_empty() => Ok(Command::Refresh),
                "refresh" => Err(CommandError::Usage("usage: refresh")),
                "email" if args.len() == 1 => Ok(Command::SetEmail(args[0].to_owned())),
                "email" => Err(CommandError::Usage("usage: email <address>")),
                "pick" if !args.is_empty() => Ok(Command::Pick(activity_ref(&args))),
                "pick" => Err(CommandError::Usage("usage: pick <number|name>")),
                "signup" => Ok(parse_signup(&args)),
                "unregister" if !args.is_empty() => parse_unregister(&args),
                "unregister" => Err(CommandError::Usage(
                    "usage: unregister <entry number>, or unregister <activity> <email>",
                )),
                "help" => Ok(Command::Help),
                "exit" | "quit" => Ok(Command::Quit),
                _ => Err(CommandError::Unknown(cmd.to_owned())),
            }
        }
        None => Err(CommandError::Unknown(line.trim().to_owned())),
    }
}
