use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::Local;

use apod::{
    date_in_range, ApodClient, Database, FetchEvent, ImageRecord, InsertError, SettingsStore,
    FIRST_APOD_DATE,
};

/// NASA's public demo key; rate-limited but enough for casual browsing.
const DEFAULT_API_KEY: &str = "DEMO_KEY";

struct App {
    client: ApodClient,
    db: Database,
    settings: SettingsStore,
}

impl App {
    fn new() -> Result<Self> {
        let data_dir = env::var("APOD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("apod-data"));
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let api_key = env::var("APOD_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());

        Ok(Self {
            client: ApodClient::new(api_key)?,
            db: Database::new(data_dir.join("favorites.sqlite3"))?,
            settings: SettingsStore::new(data_dir.join("settings.json"))?,
        })
    }

    /// Fetch `date`, printing progress, and record it as the last search.
    async fn fetch_record(&self, date: &str) -> Result<ImageRecord> {
        if !date_in_range(date) {
            println!(
                "note: {date} is outside the archive range ({FIRST_APOD_DATE} to today); \
                 the service will likely reject it"
            );
        }

        let mut task = self.client.fetch(date);
        let mut record = None;

        while let Some(event) = task.next_event().await {
            match event {
                FetchEvent::Progress(value) => {
                    print!("\rfetching... {value}%");
                    io::stdout().flush()?;
                }
                FetchEvent::Done(result) => {
                    println!();
                    match result {
                        Ok(image) => record = Some(image),
                        Err(err) => bail!("{err}"),
                    }
                }
            }
        }

        let record = record.context("fetch ended without a result")?;

        let searched = if record.date.is_empty() { date } else { &record.date };
        self.settings.set_last_searched_date(searched)?;
        self.settings.set_last_viewed(&record.url, &record.title)?;

        Ok(record)
    }

    async fn show(&self, date: &str) -> Result<()> {
        let record = self.fetch_record(date).await?;
        let favorited = self.db.is_favorite(&record.date).await?;
        print_record(&record, favorited);
        Ok(())
    }

    async fn save(&self, date: &str) -> Result<()> {
        let mut record = self.fetch_record(date).await?;

        match self.db.insert_favorite(&record).await {
            Ok(id) => {
                record.id = Some(id);
                println!("Saved \"{}\" ({}) as favorite #{id}", record.title, record.date);
            }
            Err(InsertError::DuplicateDate(date)) => {
                println!("{date} is already in your favorites");
            }
            Err(InsertError::Storage(err)) => {
                return Err(err.context("failed to save favorite"));
            }
        }

        Ok(())
    }

    async fn remove(&self, date: &str) -> Result<()> {
        let removed = self.db.delete_favorite_by_date(date).await?;
        if removed == 0 {
            println!("No favorite stored for {date}");
        } else {
            println!("Removed favorite for {date}");
        }
        Ok(())
    }

    async fn list(&self) -> Result<()> {
        let favorites = self.db.get_all_favorites().await?;
        if favorites.is_empty() {
            println!("No favorites yet. Save one with `apod save <YYYY-MM-DD>`.");
            return Ok(());
        }

        let count = self.db.favorites_count().await?;
        println!("{count} favorite(s):");
        for image in &favorites {
            let marker = if image.is_video() { " [video]" } else { "" };
            println!("  {}{marker}", image.summary());
        }

        Ok(())
    }

    fn language(&self, code: Option<&String>) -> Result<()> {
        match code {
            Some(code) => {
                self.settings.set_language(code)?;
                println!("Language preference set to {code}");
            }
            None => {
                let language = self.settings.language();
                if language.is_empty() {
                    println!("No language preference set");
                } else {
                    println!("{language}");
                }
            }
        }
        Ok(())
    }
}

fn print_record(record: &ImageRecord, favorited: bool) {
    println!("{} ({})", record.title, record.date);
    if !record.copyright.is_empty() {
        println!("© {}", record.copyright);
    }
    if record.is_video() {
        println!("[video entry]");
    }
    if !record.url.is_empty() {
        println!("url:    {}", record.url);
    }
    if !record.hd_url.is_empty() {
        println!("hd url: {}", record.hd_url);
    }
    if !record.explanation.is_empty() {
        println!();
        println!("{}", record.explanation);
    }
    if favorited {
        println!();
        println!("(in favorites)");
    }
}

fn print_usage() {
    eprintln!("Usage: apod <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  today              fetch today's entry");
    eprintln!("  fetch [date]       fetch a date (YYYY-MM-DD); defaults to the last search");
    eprintln!("  save <date>        fetch a date and add it to favorites");
    eprintln!("  remove <date>      remove a date from favorites");
    eprintln!("  list               list favorites, newest first");
    eprintln!("  lang [code]        show or set the language preference");
    eprintln!();
    eprintln!("Environment: APOD_API_KEY (default DEMO_KEY), APOD_DATA_DIR (default ./apod-data)");
}

async fn run() -> Result<()> {
    let mut args = env::args().collect::<Vec<String>>();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].clone();
    let command_args = args.split_off(2);

    let app = App::new()?;

    if app.settings.is_first_launch() {
        println!("Welcome! Fetched entries can be kept locally; run `apod list` to see them.");
        app.settings.set_first_launch_complete()?;
    }

    match command.as_str() {
        "today" => {
            let today = Local::now().date_naive().to_string();
            app.show(&today).await
        }
        "fetch" => {
            let date = match command_args.first() {
                Some(date) => date.clone(),
                None => {
                    let last = app.settings.last_searched_date();
                    if last.is_empty() {
                        bail!("no date given and no previous search to repeat");
                    }
                    last
                }
            };
            app.show(&date).await
        }
        "save" => {
            let date = command_args
                .first()
                .context("save requires a date (YYYY-MM-DD)")?;
            app.save(date).await
        }
        "remove" => {
            let date = command_args
                .first()
                .context("remove requires a date (YYYY-MM-DD)")?;
            app.remove(date).await
        }
        "list" => app.list().await,
        "lang" => app.language(command_args.first()),
        _ => {
            print_usage();
            bail!("unknown command: {command}");
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(error) = run().await {
        eprintln!("error: {error:#}");
        process::exit(1);
    }
}
