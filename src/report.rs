use std::fmt::Write;

use crate::dashboard::Dashboard;
use crate::filter::{CategoryCount, SeriesPoint};

pub fn format_mean(value: Option<f64>) -> String {
    match value {
        Some(mean) => format!("{mean:.2}"),
        None => "n/a".to_string(),
    }
}

fn write_counts(output: &mut String, counts: &[CategoryCount], empty: &str) {
    if counts.is_empty() {
        let _ = writeln!(output, "{empty}");
        return;
    }

    for entry in counts {
        let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
    }
}

fn write_series(output: &mut String, points: &[SeriesPoint], limit: usize) {
    if points.is_empty() {
        let _ = writeln!(output, "No days in this window.");
        return;
    }

    for point in points.iter().take(limit) {
        let _ = writeln!(output, "- {}: {:.2}", point.date, point.value);
    }
    if points.len() > limit {
        let _ = writeln!(output, "- ... {} more days", points.len() - limit);
    }
}

pub fn build_report(dashboard: &Dashboard, series_limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Engagement Dashboard");
    let _ = writeln!(
        output,
        "Window {} to {} ({} days with data)",
        dashboard.start, dashboard.end, dashboard.record_count
    );
    let _ = writeln!(output);

    let engagement = &dashboard.engagement;
    let _ = writeln!(output, "## User Engagement");
    let _ = writeln!(
        output,
        "Session Duration: {}",
        format_mean(engagement.mean_session_duration)
    );
    let _ = writeln!(
        output,
        "User Retention: {}",
        format_mean(engagement.mean_user_retention)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "### {} Over Time", engagement.metric.title());
    write_series(&mut output, &engagement.series, series_limit);

    let content = &dashboard.content;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Content");
    let _ = writeln!(
        output,
        "User Satisfaction: {}",
        format_mean(content.mean_user_satisfaction)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "### Videos Processed Over Time");
    write_series(&mut output, &content.videos_processed, series_limit);
    let _ = writeln!(output);
    let _ = writeln!(output, "### Popular Themes");
    write_counts(&mut output, &content.popular_themes, "No themes recorded for this window.");

    let trends = &dashboard.trends;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Trends - {}", trends.location);
    let _ = writeln!(output, "### Trending Topics");
    write_counts(
        &mut output,
        &trends.trending_topics,
        "No days recorded for this location.",
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "### User Satisfaction Over Time");
    write_series(&mut output, &trends.satisfaction, series_limit);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Used Features");
    write_counts(&mut output, &dashboard.features, "No features recorded.");

    output
}

pub fn build_counts(field: &str, counts: &[CategoryCount]) -> String {
    let mut output = String::new();
    let total: usize = counts.iter().map(|entry| entry.count).sum();
    let _ = writeln!(output, "{field} across {total} days:");
    write_counts(&mut output, counts, "No records in this window.");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build_dashboard;
    use crate::models::tests::{day, sample_record};
    use crate::models::{Criteria, Location, Metric};
    use crate::source::Dataset;

    fn dataset() -> Dataset {
        Dataset::new((1..=6).map(|d| sample_record(d, 100 + d * 10)).collect()).unwrap()
    }

    #[test]
    fn mean_sentinel_renders_as_not_available() {
        assert_eq!(format_mean(None), "n/a");
        assert_eq!(format_mean(Some(156.6666)), "156.67");
    }

    #[test]
    fn report_covers_every_panel() {
        let criteria = Criteria::new(day(1), day(6), Location::Usa, Metric::ActiveUsers).unwrap();
        let report = build_report(&build_dashboard(&dataset(), &criteria), 4);

        assert!(report.contains("# Engagement Dashboard"));
        assert!(report.contains("Session Duration: 12.50"));
        assert!(report.contains("### Active Users Over Time"));
        assert!(report.contains("- 2022-01-01: 110.00"));
        assert!(report.contains("- ... 2 more days"));
        assert!(report.contains("- Theme A: 6"));
        assert!(report.contains("## Trends - USA"));
        assert!(report.contains("- Feature 1: 6"));
    }

    #[test]
    fn empty_window_report_says_so() {
        let late = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let criteria = Criteria::new(late, late, Location::Europe, Metric::ActiveUsers).unwrap();
        let report = build_report(&build_dashboard(&dataset(), &criteria), 4);

        assert!(report.contains("User Retention: n/a"));
        assert!(report.contains("No days in this window."));
        assert!(report.contains("No themes recorded for this window."));
        assert!(report.contains("No days recorded for this location."));
    }

    #[test]
    fn counts_listing_reports_total() {
        let counts = vec![
            CategoryCount { label: "USA", count: 2 },
            CategoryCount { label: "Asia", count: 1 },
        ];
        let listing = build_counts("user_location", &counts);
        assert!(listing.starts_with("user_location across 3 days:"));
        assert!(listing.contains("- Asia: 1"));
        assert_eq!(build_counts("user_location", &[]), "user_location across 0 days:\nNo records in this window.\n");
    }
}
