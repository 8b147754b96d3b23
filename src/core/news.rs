use crate::domain::model::NewsPost;
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Hour (UTC) at which the daily news window closes.
pub const CUTOFF_HOUR: u32 = 18;

/// Yesterday 18:00 UTC up to today 18:00 UTC, relative to `now`.
pub fn daily_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let cutoff = NaiveTime::from_hms_opt(CUTOFF_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let end = now.date_naive().and_time(cutoff).and_utc();
    (end - Duration::days(1), end)
}

pub fn in_window(post: &NewsPost, window: &(DateTime<Utc>, DateTime<Utc>)) -> bool {
    let (start, end) = window;
    let created = post.created_utc;
    start.timestamp() as f64 <= created && created < end.timestamp() as f64
}

pub fn format_post(post: &NewsPost) -> String {
    format!("**{}**\nhttps://reddit.com{}", post.title, post.permalink)
}

/// Messages for the posts inside the window, in feed order.
pub fn select_messages(posts: &[NewsPost], now: DateTime<Utc>) -> Vec<String> {
    let window = daily_window(now);
    posts
        .iter()
        .filter(|p| in_window(p, &window))
        .map(format_post)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(title: &str, created: DateTime<Utc>) -> NewsPost {
        NewsPost {
            title: title.to_string(),
            permalink: format!("/r/FantasyPL/comments/{}/", title.to_lowercase()),
            created_utc: created.timestamp() as f64,
        }
    }

    #[test]
    fn test_daily_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
        let (start, end) = daily_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 9, 18, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_window_bounds_are_half_open() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();
        let window = daily_window(now);

        assert!(in_window(&post("Start", window.0), &window));
        assert!(!in_window(&post("End", window.1), &window));
        assert!(!in_window(&post("Before", window.0 - Duration::seconds(1)), &window));
    }

    #[test]
    fn test_select_messages() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let posts = vec![
            post("Injury", Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()),
            post("Old", Utc.with_ymd_and_hms(2025, 3, 8, 8, 0, 0).unwrap()),
            post("Lineup", Utc.with_ymd_and_hms(2025, 3, 9, 19, 0, 0).unwrap()),
        ];

        let messages = select_messages(&posts, now);
        assert_eq!(
            messages,
            vec![
                "**Injury**\nhttps://reddit.com/r/FantasyPL/comments/injury/",
                "**Lineup**\nhttps://reddit.com/r/FantasyPL/comments/lineup/",
            ]
        );
    }
}
