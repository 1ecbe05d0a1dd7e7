use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use tunebook_client::{AppSession, ClientConfig, Method};
use tunebook_types::api::TuneFilter;
use tunebook_types::{Page, Principal};

#[derive(Parser)]
#[command(author, version, about = "Read-only command line browser for a Tunebook service")]
struct Args {
    /// Call as this principal instead of anonymously
    #[arg(long = "as", global = true, value_name = "PRINCIPAL")]
    principal: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Profile, tune, and session counts
    Stats,
    /// Show a user's profile
    Profile { principal: String },
    /// List a user's friends
    Friends { principal: String },
    /// Search the tune catalog
    Tunes {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        rhythm: Option<String>,
        #[arg(long)]
        key: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// Print the notation of a catalog tune
    Tune { title: String },
    /// List the tunes in a user's book
    Book {
        principal: String,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// Search sessions by name or location
    Sessions {
        #[arg(default_value = "")]
        search: String,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// Search forums by name
    Forums {
        #[arg(default_value = "")]
        search: String,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// List the posts of a forum
    Posts {
        forum_id: u64,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// Search instrument listings
    Instruments {
        #[arg(default_value = "")]
        search: String,
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunebook=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = ClientConfig::from_env()?;
    info!(host = %config.host, canister = %config.canister_id, "using gateway");

    let mut session = AppSession::connect(config)?;
    if let Some(principal) = args.principal {
        let principal = Principal::new(principal);
        if session.login(principal.clone()).await?.is_none() {
            info!(%principal, "principal has no profile yet");
        }
    }

    run(&session, args.command.unwrap_or(Command::Stats)).await
}

async fn run(session: &AppSession, command: Command) -> Result<()> {
    let client = session.client();

    match command {
        Command::Stats => {
            let (profiles, tunes, sessions) = tokio::try_join!(
                client.get_profile_count(),
                client.get_tune_count(),
                client.get_session_count(),
            )?;
            println!("profiles  {profiles}");
            println!("tunes     {tunes}");
            println!("sessions  {sessions}");
        }
        Command::Profile { principal } => {
            let principal = Principal::new(principal);
            let Some(profile) = client.get_profile(&principal).await? else {
                bail!("no profile for {principal}");
            };
            println!("{} ({})", profile.username, profile.principal);
            println!("  location:    {}", profile.location);
            println!("  instruments: {}", profile.instruments);
            if let Some(bio) = &profile.bio {
                println!("  bio:         {bio}");
            }
            println!(
                "  friends:     {} ({} incoming, {} outgoing requests)",
                profile.friends.len(),
                profile.incoming_requests.len(),
                profile.outgoing_requests.len()
            );
            if let Some(me) = session.profile() {
                println!("  relation:    {:?}", me.relation_to(&profile.principal));
            }
        }
        Command::Friends { principal } => {
            for friend in client.get_friends(&Principal::new(principal)).await? {
                println!("{}  {}", friend.principal, friend.username);
            }
        }
        Command::Tunes {
            title,
            rhythm,
            key,
            page,
        } => {
            let filter = TuneFilter { title, rhythm, key };
            let tunes = client.filter_tunes(&filter, page).await?;
            for tune in &tunes.items {
                println!("{}", tune.title);
            }
            footer(&tunes, Method::FilterTunes, page);
        }
        Command::Tune { title } => {
            let notation = client
                .get_original_tune(&title)
                .await?
                .with_context(|| format!("no catalog tune titled '{title}'"))?;
            println!("{notation}");
        }
        Command::Book { principal, page } => {
            let tunes = client.get_user_tune_list(&Principal::new(principal), page).await?;
            for tune in &tunes.items {
                match &tune.username {
                    Some(by) => println!("{}  (by {by})", tune.title),
                    None => println!("{}", tune.title),
                }
            }
            footer(&tunes, Method::GetUserTuneList, page);
        }
        Command::Sessions { search, page } => {
            let sessions = client.get_sessions(&search, page).await?;
            for s in &sessions.items {
                let recurrence = if s.recurrence.is_empty() { "once" } else { s.recurrence.as_str() };
                println!("#{} {} @ {}, {} ({recurrence})", s.id, s.name, s.location, s.datetime);
            }
            footer(&sessions, Method::GetSessions, page);
        }
        Command::Forums { search, page } => {
            let forums = client.get_forums(&search, page).await?;
            for forum in &forums.items {
                let threads = forum.threads.as_ref().map_or(0, Vec::len);
                println!("#{} {} by {} ({threads} posts)", forum.id, forum.name, forum.username);
            }
            footer(&forums, Method::GetForums, page);
        }
        Command::Posts { forum_id, page } => {
            let posts = client.get_forum_posts_without_photos(forum_id, page).await?;
            for post in &posts.items {
                let edited = if post.is_edited() { " (edited)" } else { "" };
                println!("#{} {}{edited}, {} likes", post.id, post.username, post.likes);
                println!("    {}", post.comment);
            }
            footer(&posts, Method::GetForumPostsWithoutPhotos, page);
        }
        Command::Instruments { search, page } => {
            let listings = client.get_instruments(&search, page).await?;
            for item in &listings.items {
                let state = if item.is_sold() { "sold" } else { "for sale" };
                println!(
                    "#{} {} ({}) {} in {}, {state}",
                    item.id, item.name, item.product, item.price, item.location
                );
            }
            footer(&listings, Method::GetInstruments, page);
        }
    }

    Ok(())
}

fn footer<T>(page: &Page<T>, method: Method, index: i32) {
    println!("{}", footer_line(page, method.page_size(), index));
}

fn footer_line<T>(page: &Page<T>, page_size: Option<u32>, index: i32) -> String {
    if index < 0 {
        return format!("-- {} total", page.total);
    }
    let pages = page_size.map_or(1, |size| page.total_pages(size).max(1));
    let shown = i64::from(index) + 1;
    format!("-- page {shown} of {pages}, {} total", page.total)
}
