use std::io::Write;

use quiz_core::model::{Page, QuestionIndex};
use services::{
    Clock, CountdownDisplay, GuardDecision, IntervalTicker, Navigator, PageLoad, PageView,
    QuizServices,
};

mod args;

use args::{Args, ArgsError, Command, Env, print_usage};

/// Prints redirects in place of a browser location change.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&mut self, target: Page) {
        println!("-> {target}");
    }
}

/// Rewrites the countdown in place on one terminal line.
struct TerminalCountdown {
    last: String,
}

impl CountdownDisplay for TerminalCountdown {
    fn render(&mut self, text: &str) {
        if self.last == text {
            return;
        }
        self.last = text.to_owned();
        print!("\rtime left {text}");
        if let Err(err) = std::io::stdout().flush() {
            tracing::debug!(error = %err, "failed to flush countdown line");
        }
    }
}

fn print_view(view: &PageView, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("page: {}", view.path);
    if let Some(profile) = &view.profile {
        println!(
            "  [{}] {} | {} | Ab: {}",
            profile.initial, profile.name, profile.class_label, profile.attendance_number
        );
    }
    if let Some(question) = &view.question {
        println!("  {}", question.label);
    }
    if let Some(countdown) = &view.countdown {
        println!("  time left {}", countdown.display);
    }
    if let Some(score) = view.score {
        println!("  total score: {score}");
    }
    Ok(())
}

/// Load `page`, following redirects the way a browser would.
async fn open_page(
    services: &QuizServices,
    navigator: &mut TerminalNavigator,
    path: &str,
    json: bool,
) -> Result<Option<PageView>, Box<dyn std::error::Error>> {
    let pages = services.pages();
    let mut load = pages.load_path(path).await?;
    // Each redirect target re-runs the guard; the chain settles within two hops.
    for _ in 0..4 {
        match load {
            PageLoad::Redirect(target) => {
                GuardDecision::Redirect(target).apply(navigator);
                load = pages.load(Some(target)).await?;
            }
            PageLoad::Render(view) => {
                print_view(&view, json)?;
                return Ok(Some(view));
            }
            PageLoad::Passthrough => {
                println!("{path} is not a quiz page");
                return Ok(None);
            }
        }
    }
    tracing::warn!(path, "redirect chain did not settle");
    Ok(None)
}

async fn watch(
    services: &QuizServices,
    path: &str,
    follow: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut navigator = TerminalNavigator;
    let mut next_path = path.to_string();

    loop {
        let Some(view) = open_page(services, &mut navigator, &next_path, json).await? else {
            return Ok(());
        };

        let mut display = TerminalCountdown {
            last: String::new(),
        };
        let mut ticker = IntervalTicker::per_frame();
        let target = services
            .countdown()
            .run(view.page, Some(&mut display), &mut ticker)
            .await?;
        println!();

        let Some(target) = target else {
            return Ok(());
        };
        navigator.navigate(target);
        if !follow {
            return Ok(());
        }
        next_path = target.path();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match Args::parse(argv, Env::from_process()) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        QuizServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.settings).await?;
    tracing::debug!(db = %parsed.db_url, command = ?parsed.command, "quiz services ready");

    match parsed.command {
        Command::Register {
            name,
            attendance_number,
            class_label,
        } => {
            let participant = services
                .session()
                .start_session(name, attendance_number, class_label)
                .await?;
            println!("registered {}", participant.name);
            TerminalNavigator.navigate(Page::question(QuestionIndex::FIRST));
        }
        Command::Visit { path } => {
            open_page(&services, &mut TerminalNavigator, &path, parsed.json).await?;
        }
        Command::Answer { points } => {
            let total = services.session().add_score(points).await?;
            println!("total score: {total}");
        }
        Command::Watch { path, follow } => {
            watch(&services, &path, follow, parsed.json).await?;
        }
        Command::Status => {
            let session = services.session();
            let participant = session.participant().await?;
            let snapshot = session.snapshot().await?;
            let registered = session.is_registered().await?;
            println!(
                "participant: {} ({} | Ab: {}){}",
                participant.name,
                participant.class_label,
                participant.attendance_number,
                if registered { "" } else { " [not registered]" }
            );
            println!("score: {}", snapshot.score);
            println!(
                "furthest question: {} / {}",
                snapshot.furthest,
                services.settings().question_count()
            );
            println!("last visited: {}", snapshot.last_visited);
            let tick = services.countdown().current().await?;
            println!("time left: {}", tick.display());
        }
        Command::Reset => {
            services.session().reset().await?;
            println!("quiz state cleared");
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
