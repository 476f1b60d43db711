pub mod settings;

pub use settings::{AppConfig, CustomDhikr, GoalsConfig, ScheduleConfig, ScoringConfig, SyncConfig};
