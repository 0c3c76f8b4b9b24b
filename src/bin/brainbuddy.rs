// admin tasks: seed quests and profiles, hand out sessions, build a lesson from a video
use brainbuddy::config::{Config, GeminiConfig};
use brainbuddy::gateway::Gateway;
use brainbuddy::session::SessionTable;
use brainbuddy::store::{LearningStore, NewProfile, NewQuest, PgStore, UserId, UserType};
use brainbuddy::transcript::{extract_video_id, TranscriptFetcher};
use brainbuddy::video::{summarize_transcript, transcript_quiz};
use clap::{Arg, ArgMatches, Command};
use dotenv::dotenv;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::io::{self, Write};
use time::{Date, Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const SESSION_DAYS: i64 = 15;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brainbuddy=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("brainbuddy")
        .subcommand(Command::new("add-quest")
                        .aliases(["quest", "q"])
                        .about("Add a daily quest"))
        .subcommand(Command::new("add-profile")
                        .aliases(["profile", "p"])
                        .about("Add a user profile"))
        .subcommand(Command::new("issue-session")
                        .aliases(["session", "s"])
                        .about("Print a new session token for a user"))
        .subcommand(Command::new("video")
                        .aliases(["v"])
                        .about("Summarize a YouTube video and write a quiz for it")
                        .arg(Arg::new("url").required(true).help("YouTube video URL")))
        .get_matches();

    match matches.subcommand() {
        Some(("add-quest", _)) => add_quest(connect().await?).await?,
        Some(("add-profile", _)) => add_profile(connect().await?).await?,
        Some(("issue-session", _)) => issue_session(connect().await?).await?,
        Some(("video", args)) => video_lesson(args).await?,
        _ => {
            eprintln!("Invalid command, use run brainbuddy help");
        }
    }
    Ok(())
}

async fn connect() -> Result<sqlx::PgPool, Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    Ok(db)
}

async fn add_quest(
    db: sqlx::PgPool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut description = String::new();
    get_response("Enter quest description", &mut description)?;

    let mut reward = String::new();
    get_response("Enter reward points", &mut reward)?;
    let reward = reward.trim().parse::<i32>()?;

    let mut date = String::new();
    get_response("Enter date available (YYYY-MM-DD, blank for today)", &mut date)?;
    let date_available = match date.trim() {
        "" => OffsetDateTime::now_utc().date(),
        date => parse_date(date)?,
    };

    let quest = PgStore::new(db)
        .insert_quest(&NewQuest {
            description: description.trim().to_string(),
            reward,
            date_available,
        })
        .await?;

    println!("Quest created with id: {} for {}", quest.id, quest.date_available);
    Ok(())
}

fn parse_date(input: &str) -> Result<Date, Box<dyn std::error::Error>> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Ok(Date::parse(input, &format)?)
}

async fn add_profile(
    db: sqlx::PgPool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut id = String::new();
    get_response("Enter user id (from the identity provider)", &mut id)?;

    let mut email = String::new();
    get_response("Enter email", &mut email)?;

    let mut name = String::new();
    get_response("Enter full name (optional)", &mut name)?;

    let user_type = loop {
        let mut user_type = String::new();
        get_response("Enter type [student/teacher/parent/admin]", &mut user_type)?;
        match user_type.trim() {
            "" => break UserType::Student,
            other => match other.parse::<UserType>() {
                Ok(user_type) => break user_type,
                Err(e) => println!("{}", e),
            },
        }
    };

    let name = name.trim();
    let profile = PgStore::new(db)
        .insert_profile(&NewProfile {
            id: UserId::new(id.trim()),
            email: email.trim().to_string(),
            full_name: (!name.is_empty()).then(|| name.to_string()),
            user_type,
            age: None,
            grade_level: None,
        })
        .await?;

    println!("Profile created for {} ({})", profile.id, profile.user_type.as_str());
    Ok(())
}

async fn issue_session(
    db: sqlx::PgPool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut id = String::new();
    get_response("Enter user id", &mut id)?;

    let token = SessionTable::new(db)
        .issue(&UserId::new(id.trim()), Duration::days(SESSION_DAYS))
        .await?;

    println!("{}", token);
    Ok(())
}

async fn video_lesson(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let url = args
        .get_one::<String>("url")
        .ok_or("a video URL is required")?;
    let video_id = extract_video_id(url).ok_or("not a YouTube video URL")?;

    let gemini = GeminiConfig::from_env()?;
    if !gemini.is_configured() {
        return Err("GEMINI_API_KEY must be set".into());
    }
    let gateway = Gateway::from_config(&gemini);

    eprintln!("Fetching transcript for {}...", video_id);
    let transcript = TranscriptFetcher::new()?
        .fetch(&video_id)
        .await
        .map_err(|attempts| format!("no transcript available: {}", attempts.join("; ")))?;

    eprintln!("Summarizing {} characters...", transcript.text.len());
    let summary = summarize_transcript(&gateway, &transcript.text).await?;

    eprintln!("Writing quiz...");
    let quiz = transcript_quiz(&gateway, &transcript.text, &summary).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "summary": summary, "quiz": quiz }))?
    );
    Ok(())
}

fn get_response(question: &str, output: &mut String)
-> Result<(), Box<dyn std::error::Error>> {
    print!("{}: ", question);
    io::stdout().flush()?;

    io::stdin().read_line(output)?;

    Ok(())
}
