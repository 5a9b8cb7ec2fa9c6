use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use log::info;

use crate::businesses::Business;
use crate::config::Config;
use crate::database::Database;
use crate::day::Day;
use crate::error::OpenHoursError;
use crate::generations::{self, ScheduleGeneration};
use crate::open_query;
use crate::query_input::parse_query;
use crate::time_of_day::TimeOfDay;
use crate::upload;

#[derive(Parser)]
#[command(
    name = "openhours",
    version,
    about = "OpenHours: Business opening-hours store and query service"
)]
pub struct Cli {
    /// Database file (overrides the configured path)
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a `name,schedule` file, replacing each listed business's schedule
    Ingest {
        /// Path to the upload file
        file: PathBuf,
    },

    /// List the businesses open at a day and time, e.g. `open Mon 10am`
    Open {
        /// Day and time, e.g. "Fri 9:30 pm"
        #[arg(required_unless_present = "now", conflicts_with = "now")]
        when: Vec<String>,

        /// Use the current local day and time
        #[arg(long = "now", default_value_t = false)]
        now: bool,
    },

    /// Show every schedule generation of a business, newest first
    History {
        /// Exact business name
        name: String,
    },

    /// List all known businesses
    Businesses,

    /// Start the HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long = "host")]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long = "port", short = 'p')]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn handle_command_line(project_dirs: &ProjectDirs) -> Result<(), OpenHoursError> {
        let args = Cli::parse();
        let config = Config::get();

        let db_path = match args.db {
            Some(path) => path,
            None => {
                let data_dir = project_dirs.data_local_dir();
                fs::create_dir_all(data_dir)?;
                config.database.resolve_path(data_dir)
            }
        };
        let db = Database::open(&db_path, config.database.pool_size)?;

        match args.command {
            Command::Ingest { file } => Self::ingest(&db, file),
            Command::Open { when, now } => Self::open(&db, &when, now),
            Command::History { name } => Self::history(&db, &name),
            Command::Businesses => Self::businesses(&db),
            Command::Serve { host, port } => Self::start_server(
                db,
                host.unwrap_or(config.server.host),
                port.unwrap_or(config.server.port),
            ),
        }
    }

    fn ingest(db: &Database, file: PathBuf) -> Result<(), OpenHoursError> {
        let records = upload::read_records_from_path(&file)?;
        let created = generations::ingest_batch(db, &records)?;

        info!("Ingested {} schedule(s) from {}", created.len(), file.display());
        println!("Ingested {} schedule(s)", created.len());
        Ok(())
    }

    fn open(db: &Database, when: &[String], now: bool) -> Result<(), OpenHoursError> {
        let (day, time) = if now {
            let local = Local::now();
            (Day::from(local.weekday()), TimeOfDay::from(local.time()))
        } else {
            parse_query(&when.join(" "))?
        };

        let result = open_query::is_open(db, day, time)?;

        println!("Open at {} {}:", day, time);
        if result.open.is_empty() {
            println!("  (none)");
        }
        for name in &result.open {
            println!("  {}", name);
        }
        for warning in &result.warnings {
            eprintln!("Warning: '{}': {}", warning.business_name, warning.message);
        }
        Ok(())
    }

    fn history(db: &Database, name: &str) -> Result<(), OpenHoursError> {
        let conn = db.get_connection()?;
        let history = ScheduleGeneration::history(&conn, name)?
            .ok_or_else(|| OpenHoursError::Error(format!("Business '{}' not found", name)))?;

        for generation in history {
            let created = DateTime::from_timestamp(generation.created_at, 0)
                .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| generation.created_at.to_string());
            let marker = if generation.is_active { "*" } else { " " };
            println!(
                "{} {:>5}  {}  {}",
                marker, generation.generation_id, created, generation.raw_spec
            );
        }
        Ok(())
    }

    fn businesses(db: &Database) -> Result<(), OpenHoursError> {
        let conn = db.get_connection()?;
        for business in Business::list(&conn)? {
            println!(
                "{:>5}  {}  ({} generation(s){})",
                business.business_id,
                business.name,
                business.generation_count,
                if business.has_active_schedule { "" } else { ", no active schedule" }
            );
        }
        Ok(())
    }

    fn start_server(db: Database, host: String, port: u16) -> Result<(), OpenHoursError> {
        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| OpenHoursError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port, db);
            web_server.start().await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_open_words() {
        let cli = Cli::try_parse_from(["openhours", "open", "Fri", "9:30", "pm"]).unwrap();
        match cli.command {
            Command::Open { when, now } => {
                assert_eq!(when, vec!["Fri", "9:30", "pm"]);
                assert!(!now);
            }
            _ => panic!("expected open command"),
        }
        assert!(cli.db.is_none());
    }

    #[test]
    fn test_cli_parsing_open_now_conflicts_with_words() {
        assert!(Cli::try_parse_from(["openhours", "open", "--now"]).is_ok());
        assert!(Cli::try_parse_from(["openhours", "open"]).is_err());
        assert!(Cli::try_parse_from(["openhours", "open", "--now", "Mon", "10am"]).is_err());
    }

    #[test]
    fn test_cli_parsing_global_db_and_serve() {
        let cli = Cli::try_parse_from(["openhours", "serve", "--port", "9000", "--db", "/tmp/x.db"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(
            cli.command,
            Command::Serve { host: None, port: Some(9000) }
        ));
    }

    #[test]
    fn test_cli_parsing_invalid_arguments() {
        assert!(Cli::try_parse_from(["openhours"]).is_err(), "A command is required");
        assert!(Cli::try_parse_from(["openhours", "nonexistent-command"]).is_err());
        assert!(Cli::try_parse_from(["openhours", "history"]).is_err());
        assert!(Cli::try_parse_from(["openhours", "businesses", "--invalid-flag"]).is_err());
    }
}
