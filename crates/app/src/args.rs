use std::fmt;

use quiz_core::model::{QuizSettings, SettingsError};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    Settings(SettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        name: String,
        attendance_number: String,
        class_label: String,
    },
    Visit {
        path: String,
    },
    Answer {
        points: i64,
    },
    Watch {
        path: String,
        follow: bool,
    },
    Status,
    Reset,
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub settings: QuizSettings,
    pub json: bool,
    pub command: Command,
}

/// Environment knobs; flags override them.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub question_count: Option<String>,
    pub duration_secs: Option<String>,
}

impl Env {
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL").ok(),
            question_count: std::env::var("QUIZ_QUESTION_COUNT").ok(),
            duration_secs: std::env::var("QUIZ_DURATION_SECS").ok(),
        }
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz register --name <name> --absen <number> --class <label>");
    eprintln!("  quiz visit <page>            # e.g. question3.html");
    eprintln!("  quiz answer <points>");
    eprintln!("  quiz watch <page> [--follow] # run the countdown on a question page");
    eprintln!("  quiz status");
    eprintln!("  quiz reset");
    eprintln!();
    eprintln!("Options (any subcommand):");
    eprintln!("  --db <sqlite_url>      default sqlite:quiz.sqlite3");
    eprintln!("  --questions <count>    default 10");
    eprintln!("  --duration <seconds>   default 120");
    eprintln!("  --json                 print page views as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTION_COUNT, QUIZ_DURATION_SECS, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: &str) -> Result<T, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        flag,
        raw: raw.to_string(),
    })
}

impl Args {
    /// Parse `argv` (without the program name). `Ok(None)` means help was requested.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown or malformed arguments.
    pub fn parse(argv: Vec<String>, env: Env) -> Result<Option<Self>, ArgsError> {
        let mut iter = argv.into_iter();
        let Some(sub) = iter.next() else {
            return Ok(None);
        };
        if matches!(sub.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }

        let mut db_url = env
            .db_url
            .unwrap_or_else(|| "sqlite:quiz.sqlite3".into());
        let mut question_count = match env.question_count.as_deref() {
            Some(raw) => parse_number("QUIZ_QUESTION_COUNT", raw)?,
            None => QuizSettings::DEFAULT_QUESTION_COUNT,
        };
        let mut duration_secs = match env.duration_secs.as_deref() {
            Some(raw) => parse_number("QUIZ_DURATION_SECS", raw)?,
            None => QuizSettings::DEFAULT_DURATION_SECS,
        };
        let mut json = false;
        let mut follow = false;
        let mut name = None;
        let mut attendance_number = None;
        let mut class_label = None;
        let mut positional = Vec::new();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--questions" => {
                    let value = require_value(&mut iter, "--questions")?;
                    question_count = parse_number("--questions", &value)?;
                }
                "--duration" => {
                    let value = require_value(&mut iter, "--duration")?;
                    duration_secs = parse_number("--duration", &value)?;
                }
                "--json" => json = true,
                "--follow" => follow = true,
                "--name" => name = Some(require_value(&mut iter, "--name")?),
                "--absen" => attendance_number = Some(require_value(&mut iter, "--absen")?),
                "--class" => class_label = Some(require_value(&mut iter, "--class")?),
                "--help" | "-h" => return Ok(None),
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let settings =
            QuizSettings::new(question_count, duration_secs).map_err(ArgsError::Settings)?;
        let mut positional = positional.into_iter();

        let command = match sub.as_str() {
            "register" => Command::Register {
                name: name.ok_or(ArgsError::MissingArgument { what: "--name" })?,
                attendance_number: attendance_number.unwrap_or_else(|| "-".into()),
                class_label: class_label.unwrap_or_else(|| "-".into()),
            },
            "visit" => Command::Visit {
                path: positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "page" })?,
            },
            "answer" => {
                let raw = positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "points" })?;
                Command::Answer {
                    points: parse_number("points", &raw)?,
                }
            }
            "watch" => Command::Watch {
                path: positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "page" })?,
                follow,
            },
            "status" => Command::Status,
            "reset" => Command::Reset,
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            db_url: normalize_sqlite_url(db_url),
            settings,
            json,
            command,
        }))
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn parse(items: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(argv(items), Env::default())
    }

    #[test]
    fn no_arguments_means_help() {
        assert_eq!(parse(&[]), Ok(None));
        assert_eq!(parse(&["--help"]), Ok(None));
    }

    #[test]
    fn parses_register_with_defaults() {
        let args = parse(&["register", "--name", "Ana", "--absen", "12", "--class", "X"])
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Register {
                name: "Ana".into(),
                attendance_number: "12".into(),
                class_label: "X".into(),
            }
        );
        assert_eq!(args.settings, QuizSettings::default());
        assert!(args.db_url.starts_with("sqlite://"));
        assert!(args.db_url.ends_with("quiz.sqlite3"));
    }

    #[test]
    fn register_requires_a_name() {
        assert_eq!(
            parse(&["register", "--class", "X"]),
            Err(ArgsError::MissingArgument { what: "--name" })
        );
    }

    #[test]
    fn parses_signed_points_and_watch_follow() {
        let answer = parse(&["answer", "-2"]);
        assert_eq!(answer.unwrap().unwrap().command, Command::Answer { points: -2 });

        let watch = parse(&["watch", "question3.html", "--follow"]).unwrap().unwrap();
        assert_eq!(
            watch.command,
            Command::Watch {
                path: "question3.html".into(),
                follow: true,
            }
        );
    }

    #[test]
    fn env_then_flags_override_settings() {
        let env = Env {
            db_url: Some("sqlite::memory:".into()),
            question_count: Some("5".into()),
            duration_secs: Some("30".into()),
        };
        let args = Args::parse(argv(&["status", "--duration", "60"]), env)
            .unwrap()
            .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.settings, QuizSettings::new(5, 60).unwrap());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse(&["launch"]),
            Err(ArgsError::UnknownCommand("launch".into()))
        );
        assert_eq!(
            parse(&["status", "--verbose"]),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
        assert_eq!(
            parse(&["status", "--questions", "0"]),
            Err(ArgsError::Settings(SettingsError::NoQuestions))
        );
        assert_eq!(
            parse(&["visit"]),
            Err(ArgsError::MissingArgument { what: "page" })
        );
        assert_eq!(
            parse(&["answer", "lots"]),
            Err(ArgsError::InvalidNumber {
                flag: "points",
                raw: "lots".into()
            })
        );
    }

    #[test]
    fn keeps_memory_and_absolute_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/q.db".into()),
            "sqlite:///tmp/q.db"
        );
        assert_eq!(normalize_sqlite_url("/tmp/q.db".into()), "sqlite:///tmp/q.db");
    }
}
