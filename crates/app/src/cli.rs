use clap::{Parser, Subcommand, ValueEnum};
use tracker_core::model::UnitId;
use tracker_core::progress::Status;

/// Track study progress per unit and get nudged about the least covered one.
#[derive(Debug, Parser)]
#[command(name = "study-tracker", version, long_about = None)]
pub struct Cli {
    /// `SQLite` database URL or file path
    #[arg(
        global = true,
        long = "db",
        env = "TRACKER_DB_URL",
        default_value = "sqlite://tracker.sqlite3"
    )]
    pub db: String,

    /// Minutes a unit rests after a reminder
    #[arg(
        global = true,
        long,
        env = "TRACKER_REMINDER_GAP_MINUTES",
        default_value_t = 360
    )]
    pub gap_minutes: i64,

    /// Minutes between reminder checks in watch mode
    #[arg(
        global = true,
        long,
        env = "TRACKER_REMINDER_POLL_MINUTES",
        default_value_t = 15
    )]
    pub poll_minutes: i64,

    /// Seconds before the first reminder check in watch mode
    #[arg(
        global = true,
        long,
        env = "TRACKER_REMINDER_INITIAL_DELAY_SECS",
        default_value_t = 15
    )]
    pub initial_delay_secs: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List units with their topics and an average
    List {
        #[arg(long)]
        subject: Option<String>,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Case-insensitive match on unit, subject or topic names
        #[arg(long)]
        query: Option<String>,
    },

    /// List distinct subjects
    Subjects,

    /// Add a unit
    Add {
        subject: String,
        name: String,

        /// Topic names; blank entries are ignored
        #[arg(required = true, num_args = 1..)]
        topics: Vec<String>,
    },

    /// Edit a unit; topics keep their progress when the name is unchanged
    Edit {
        id: UnitId,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// Replace the topic list (repeat for each topic)
        #[arg(long = "topic")]
        topics: Vec<String>,
    },

    /// Flip a topic between done and not done
    Toggle {
        id: UnitId,

        /// Topic number as shown by `list` (starting at 1)
        topic: usize,
    },

    /// Delete a unit
    Delete { id: UnitId },

    /// Send a reminder for the least covered unit, if one is due
    Remind {
        /// Keep running and check on the polling interval until interrupted
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Ahead,
    OnTrack,
    Behind,
}

impl From<StatusArg> for Status {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Ahead => Status::Ahead,
            StatusArg::OnTrack => Status::OnTrack,
            StatusArg::Behind => Status::Behind,
        }
    }
}
