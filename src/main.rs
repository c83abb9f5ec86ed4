use std::{
    fs::{self, read_to_string},
    path::PathBuf,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tokio_stream::wrappers::LinesStream;
use url::Url;

use crate::{
    board::{Board, BoardEvent, Request},
    core::{activity::ActivityBook, settings::Settings, store::ActivityStore},
    integrations::signup::SignupService,
};

mod board;
mod core;
mod integrations;
mod web;

#[derive(Parser, Debug)]
#[command(name = "ActivityBoard")]
#[command(version = "0.1")]
#[command(about = "A terminal board for the Mergington High School activity sign-up service.", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: RunType,
}

#[derive(Subcommand, Debug)]
enum RunType {
    /// Create and initialize a settings file.
    /// The output .json file can be edited to point the board at another
    /// service or to pin the sign-up email.
    Init {
        /// The output path of the settings file.
        settings_file: PathBuf,
    },

    /// Host a practice sign-up service for the board to talk to.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Location of a roster .json file to seed the service with.
        /// If not provided, the built-in sample roster is used.
        #[arg(short, long)]
        seed_file: Option<PathBuf>,
    },

    /// Run the interactive board against a sign-up service.
    Run {
        /// Location of the settings file.
        /// This file can be created with the `activityboard init` command.
        #[arg(short = 'f', long)]
        settings_file: Option<PathBuf>,

        /// Base URL of the sign-up service, overriding the settings file.
        #[arg(short = 'u', long)]
        service_url: Option<String>,

        /// Email to pre-fill the sign-up form with, overriding the settings file.
        #[arg(short, long)]
        email: Option<String>,
    },
}

/// Forwards stdin lines to the board loop, closing it when stdin ends
async fn forward_input(tx: UnboundedSender<BoardEvent>) {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => {
                if tx.send(BoardEvent::Input(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::error!("Failed to read from stdin: {}", e);
                break;
            }
        }
    }

    let _ = tx.send(BoardEvent::Closed);
}

/// Spawns the request a board transition asked for, reporting its outcome
/// back into the event channel. Returns false when the board wants to quit.
fn issue_request(
    service: &SignupService,
    tx: &UnboundedSender<BoardEvent>,
    request: Request,
) -> bool {
    match request {
        Request::Quit => return false,
        Request::Fetch => {
            let service = service.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(BoardEvent::Fetched(service.fetch_activities().await));
            });
        }
        Request::SignUp { activity, email } => {
            let service = service.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(BoardEvent::SignedUp(service.sign_up(&activity, &email).await));
            });
        }
        Request::Unregister { activity, email } => {
            let service = service.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = service.unregister(&activity, &email).await;
                let _ = tx.send(BoardEvent::Unregistered {
                    activity,
                    email,
                    outcome,
                });
            });
        }
    }

    true
}

fn print_frame(board: &Board) {
    println!("{}", board.render());
}

async fn run_board(
    service: SignupService,
    email: Option<String>,
    mut rx: UnboundedReceiver<BoardEvent>,
    tx: UnboundedSender<BoardEvent>,
) {
    let mut board = Board::new(email);

    print_frame(&board);
    issue_request(&service, &tx, Request::Fetch);

    loop {
        let deadline = board.banner_deadline();

        tokio::select! {
            maybe_event = rx.recv() => {
                let event = match maybe_event {
                    Some(event) => event,
                    None => return,
                };

                let requests = board.handle_event(event);
                for notice in board.take_notices() {
                    println!("{}", notice);
                }
                for request in requests {
                    if !issue_request(&service, &tx, request) {
                        return;
                    }
                }

                print_frame(&board);
            }
            _ = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                board.expire_banner(tokio::time::Instant::now());
                print_frame(&board);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        RunType::Init { settings_file } => {
            let settings_json = serde_json::to_string_pretty(&Settings::default())?;

            fs::write(&settings_file, settings_json)?;

            println!("Settings created, open the file in a text editor to adjust the service address or pin an email.");
            Ok(())
        }
        RunType::Serve { port, seed_file } => {
            let store = match seed_file {
                Some(seed_path) => {
                    let book = serde_json::from_str::<ActivityBook>(&read_to_string(&seed_path)?)?;
                    if book.is_empty() {
                        log::warn!("Seed file has no activities, serving an empty list");
                    }
                    Arc::new(ActivityStore::new(book))
                }
                None => Arc::new(ActivityStore::sample()),
            };

            web::run_http_server(store, port).await
        }
        RunType::Run {
            settings_file,
            service_url,
            email,
        } => {
            let settings = match &settings_file {
                Some(settings_path) => {
                    serde_json::from_str::<Settings>(&read_to_string(settings_path)?)?
                }
                None => Settings::default(),
            };

            let service_url = Url::parse(&service_url.unwrap_or(settings.service_url))?;
            let service = SignupService::new(service_url)?;

            println!("ActivityBoard initialized, type 'help' for commands.");

            let (tx, rx) = mpsc::unbounded_channel();

            tokio::spawn(forward_input(tx.clone()));

            run_board(service, email.or(settings.email), rx, tx).await;

            Ok(())
        }
    }
}
