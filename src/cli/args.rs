use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "iman", version, author, about = "Local-first Iman score, goals and streaks in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in on this device (creates or restores the remote row when sync is on)
    Login {
        /// User id
        user: String,
    },
    /// Push a final time and sign out; local data is kept
    Logout,
    /// Delete every local and remote record of the signed-in user
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show the Iman score, section scores, streaks and sync state
    Status {
        /// Also show the score history for the last 7 days
        #[arg(long)]
        week: bool,
    },
    /// Mark a prayer as done, undone or missed
    Prayer {
        /// Prayer name (fajr, zuhr, asr, maghrib, isha)
        prayer: String,
        /// Mark as missed and owe a qada
        #[arg(long, conflicts_with = "undo")]
        missed: bool,
        /// Clear the prayer without owing a qada
        #[arg(long)]
        undo: bool,
    },
    /// Dhikr tracking
    Dhikr {
        #[command(subcommand)]
        action: DhikrCommands,
    },
    /// Log Quran reading
    Quran {
        /// Amount read
        amount: u32,
        /// Count verses instead of pages
        #[arg(long)]
        verses: bool,
    },
    /// Count today as a fasting day
    Fast,
    /// Log a workout for today
    Workout,
    /// Show or change goal targets
    Goals {
        #[command(subcommand)]
        action: GoalCommands,
    },
    /// Qada (makeup prayer) ledger
    Qada {
        #[command(subcommand)]
        action: QadaCommands,
    },
    /// Streak overview and resets
    Streak {
        #[command(subcommand)]
        action: StreakCommands,
    },
    /// Manual remote sync
    Sync {
        #[command(subcommand)]
        action: SyncCommands,
    },
    /// Keep running: recompute scores and sync on the configured intervals
    Watch {
        /// Stop after this many recomputes
        #[arg(long)]
        ticks: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DhikrCommands {
    /// Toggle morning adhkar
    Morning,
    /// Toggle evening adhkar
    Evening,
    /// Toggle a checkbox dhikr or add to a counter
    Mark {
        /// Dhikr name
        name: String,
        /// Add this count to a counter dhikr
        #[arg(long)]
        count: Option<u32>,
    },
    /// Add a custom dhikr goal
    Add {
        /// Dhikr name
        name: String,
        /// Type: checkbox or counter
        #[arg(long, default_value = "checkbox")]
        r#type: String,
        /// Target count (for counter type)
        #[arg(long, default_value = "1")]
        target: u32,
        /// Frequency: daily or weekly
        #[arg(long, default_value = "daily")]
        freq: String,
    },
    /// List dhikr goals with today's progress
    List,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommands {
    /// List goals, optionally for one category
    List {
        /// prayer, dhikr, quran or fasting
        category: Option<String>,
    },
    /// Change a goal target (0 disables it)
    Set {
        /// prayer, dhikr, quran or fasting
        category: String,
        /// Goal name
        name: String,
        /// New target
        target: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum QadaCommands {
    /// Show owed prayers
    List,
    /// Make up one prayer (the earliest owed one if none is given)
    Complete {
        /// Prayer name
        prayer: Option<String>,
    },
    /// Owe one or more prayers
    Add {
        /// Prayer name
        prayer: String,
        /// How many
        #[arg(long, default_value = "1")]
        count: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum StreakCommands {
    /// Show every streak
    Show,
    /// Reset one streak to zero
    Reset {
        /// general, prayer, workout or quran
        streak: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Upload local state
    Push,
    /// Replace local state with the remote row
    Pull,
    /// Show whether sync is configured
    Status,
}
