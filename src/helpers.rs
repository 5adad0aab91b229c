use chrono::{DateTime, Utc};

pub fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

pub fn format_percent(v: f64) -> String {
    format!("{:.1}%", clamp_percent(v))
}

pub fn human_time(t: Option<DateTime<Utc>>) -> String {
    let t = match t {
        Some(t) => t,
        None => return "never".to_string(),
    };

    let d = Utc::now() - t;
    let secs = d.num_seconds();

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let m = d.num_minutes();
        if m == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", m)
        }
    } else if secs < 86400 {
        let h = d.num_hours();
        if h == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", h)
        }
    } else if secs < 30 * 86400 {
        let days = d.num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        t.format("%b %e, %Y").to_string()
    }
}

pub fn human_duration_secs(total_secs: u64) -> String {
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        format!("{}m{}s", total_secs / 60, total_secs % 60)
    } else if total_secs < 86400 {
        format!("{}h{}m", total_secs / 3600, (total_secs % 3600) / 60)
    } else {
        let days = total_secs / 86400;
        let hours = (total_secs % 86400) / 3600;
        format!("{}d{}h", days, hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn percent_is_clamped_and_formatted() {
        assert_eq!(format_percent(42.345), "42.3%");
        assert_eq!(format_percent(250.0), "100.0%");
        assert_eq!(format_percent(f64::NAN), "0.0%");
    }

    #[test]
    fn relative_times() {
        assert_eq!(human_time(None), "never");
        assert_eq!(human_time(Some(Utc::now())), "just now");
        assert_eq!(
            human_time(Some(Utc::now() - Duration::minutes(5))),
            "5 minutes ago"
        );
        assert_eq!(
            human_time(Some(Utc::now() - Duration::hours(1))),
            "1 hour ago"
        );
    }

    #[test]
    fn durations() {
        assert_eq!(human_duration_secs(30), "30s");
        assert_eq!(human_duration_secs(90), "1m30s");
        assert_eq!(human_duration_secs(7200), "2h0m");
        assert_eq!(human_duration_secs(90000), "1d1h");
    }
}
