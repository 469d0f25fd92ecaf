use crate::store::models::{OfflineQueueItem, TimerStatus};
use owo_colors::OwoColorize;

/// `H:MM:SS` from one hour up, `M:SS` below. Hours are not padded.
pub fn format_elapsed(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn status_label(status: TimerStatus) -> String {
    match status {
        TimerStatus::Running => status.as_str().green().bold().to_string(),
        TimerStatus::Paused => status.as_str().yellow().bold().to_string(),
        TimerStatus::Idle => status.as_str().dimmed().to_string(),
    }
}

pub fn online_label(online: bool) -> String {
    if online {
        "online".green().to_string()
    } else {
        "offline".red().to_string()
    }
}

/// One line per queued mutation
pub fn queue_line(position: usize, item: &OfflineQueueItem) -> String {
    let enqueued = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(item.enqueued_at_epoch_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| item.enqueued_at_epoch_millis.to_string());

    format!(
        "{:>3}. {} {} {} {}",
        position,
        item.id.dimmed(),
        item.mutation.as_str().cyan(),
        item.entity.as_str().bold(),
        enqueued.dimmed()
    )
}
