use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

type AnyResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "spesa_admin")]
#[command(about = "Admin utilities for Spesa (users and schema)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./spesa.db?mode=rwc"
    )]
    database_url: String,

    /// Token signing key, the same the server runs with.
    #[arg(long, env = "SPESA__AUTH__SECRET", default_value = "")]
    auth_secret: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Apply or inspect schema migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user, the password is prompted.
    Create(UserCreateArgs),
    /// Print every user.
    List,
    /// Log in as a user and print a bearer token.
    Token(UserTokenArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    profile_pic: Option<String>,
}

#[derive(Args, Debug)]
struct UserTokenArgs {
    #[arg(long)]
    email: String,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    Up,
    Down,
    Fresh,
    Status,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> AnyResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(message: &str) -> AnyResult<()> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads a line without echoing it.
fn read_hidden(prompt: &str) -> AnyResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    execute!(out, cursor::MoveToColumn(0), Print(prompt))?;
    out.flush()?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        let control = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if control => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace => {
                secret.pop();
            }
            KeyCode::Char(ch) if !control => secret.push(ch),
            _ => {}
        }
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(secret)
}

fn new_password() -> AnyResult<String> {
    for _ in 0..3 {
        let password = read_hidden("Password: ")?;
        if password.is_empty() {
            notice("Password must not be empty.")?;
            continue;
        }
        if read_hidden("Confirm password: ")? == password {
            return Ok(password);
        }
        notice("Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> AnyResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    Ok(db)
}

async fn migrate(db: &DatabaseConnection, command: MigrateCommand) -> AnyResult<()> {
    match command {
        MigrateCommand::Up => migration::Migrator::up(db, None).await?,
        MigrateCommand::Down => migration::Migrator::down(db, None).await?,
        MigrateCommand::Fresh => migration::Migrator::fresh(db).await?,
        MigrateCommand::Status => migration::Migrator::status(db).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let cli = Cli::parse();
    let db = connect_db(&cli.database_url).await?;

    let command = match cli.command {
        Command::Migrate(command) => return migrate(&db, command).await,
        Command::User(User { command }) => command,
    };

    migration::Migrator::up(&db, None).await?;
    // Creating and listing users never signs anything.
    let secret = match (&command, cli.auth_secret.is_empty()) {
        (UserCommand::Token(_), true) => {
            eprintln!("--auth-secret (or SPESA__AUTH__SECRET) is required to issue tokens");
            std::process::exit(2);
        }
        (_, true) => "unused",
        (_, false) => cli.auth_secret.as_str(),
    };
    let engine = Engine::builder()
        .database(db)
        .token_secret(secret)
        .build()
        .await?;

    match command {
        UserCommand::Create(args) => {
            let password = new_password()?;
            match engine
                .create_user(&args.email, &password, &args.name, args.profile_pic.as_deref())
                .await
            {
                Ok(id) => println!("created user: {} ({id})", args.email),
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("user already exists: {}", args.email);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        UserCommand::List => {
            for user in engine.list_users().await? {
                println!("{}\t{}\t{}", user.id, user.email, user.name);
            }
        }
        UserCommand::Token(args) => {
            let password = read_hidden("Password: ")?;
            let token = engine.login(&args.email, &password).await?;
            println!("{token}");
        }
    }

    Ok(())
}
