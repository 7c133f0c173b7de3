use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "scheduler", about = "Browse and book appointment slots")]
pub struct Cli {
    /// Overrides SCHEDULER_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open and booked slots for one day
    Slots {
        #[arg(long)]
        doctor: i64,
        /// A date or a timestamp, e.g. 2023-12-01 or 2023-12-01T18:45:00Z
        #[arg(long)]
        date: String,
    },
    Book {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: i64,
    },
    Cancel {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: i64,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Month grid with slot counts per day
    Month {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    Week {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    Year {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        year: i32,
    },
    /// Publish a new slot (doctors)
    CreateSlot {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, value_parser = parse_time_arg)]
        start: NaiveTime,
        /// Defaults to start plus SCHEDULER_DEFAULT_SLOT_MINUTES
        #[arg(long, value_parser = parse_time_arg)]
        end: Option<NaiveTime>,
        #[arg(long)]
        duration: Option<u32>,
    },
    DeleteSlot {
        #[arg(long)]
        doctor: i64,
        #[arg(long)]
        slot: i64,
    },
    Appointments,
    Notifications {
        #[arg(long)]
        mark_all_read: bool,
    },
    MarkRead {
        id: Uuid,
    },
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Photo {
        path: PathBuf,
    },
}

fn parse_time_arg(value: &str) -> Result<NaiveTime, String> {
    shared_utils::parse_time(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_book_command() {
        let cli = Cli::try_parse_from([
            "scheduler", "book", "--doctor", "2", "--date", "2023-12-01", "--slot", "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Book { doctor, date, slot } => {
                assert_eq!((doctor, date.as_str(), slot), (2, "2023-12-01", 5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_slot_accepts_compact_times() {
        let cli = Cli::try_parse_from([
            "scheduler", "create-slot", "--doctor", "2", "--date", "2023-12-01", "--start", "930",
        ])
        .unwrap();

        match cli.command {
            Commands::CreateSlot { start, end, .. } => {
                assert_eq!(start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
                assert!(end.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_time() {
        assert!(Cli::try_parse_from([
            "scheduler", "create-slot", "--doctor", "2", "--date", "2023-12-01", "--start", "25:00",
        ])
        .is_err());
    }
}
