use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::filter::{self, CategoryCount, SeriesPoint};
use crate::models::{CategoryField, CategoryValue, Criteria, Location, Metric};
use crate::source::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementPanel {
    pub metric: Metric,
    pub series: Vec<SeriesPoint>,
    pub mean_session_duration: Option<f64>,
    pub mean_user_retention: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPanel {
    pub videos_processed: Vec<SeriesPoint>,
    pub mean_user_satisfaction: Option<f64>,
    pub popular_themes: Vec<CategoryCount>,
}

/// Location-scoped trends. These span the whole dataset, not the
/// selected date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendsPanel {
    pub location: Location,
    pub record_count: usize,
    pub trending_topics: Vec<CategoryCount>,
    pub satisfaction: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub record_count: usize,
    pub engagement: EngagementPanel,
    pub content: ContentPanel,
    pub trends: TrendsPanel,
    pub features: Vec<CategoryCount>,
}

impl Dashboard {
    pub fn has_data(&self) -> bool {
        self.record_count > 0
    }
}

pub fn build_dashboard(dataset: &Dataset, criteria: &Criteria) -> Dashboard {
    let all = dataset.records();
    let window = filter::filter_by_date_range(all, criteria.start(), criteria.end());
    let located = filter::filter_by_category(all, CategoryValue::Location(criteria.location()));

    debug!(
        start = %criteria.start(),
        end = %criteria.end(),
        location = %criteria.location(),
        metric = %criteria.metric(),
        in_range = window.len(),
        in_location = located.len(),
        "building dashboard"
    );

    Dashboard {
        start: criteria.start(),
        end: criteria.end(),
        record_count: window.len(),
        engagement: EngagementPanel {
            metric: criteria.metric(),
            series: filter::series(window, criteria.metric()),
            mean_session_duration: filter::compute_mean(window, Metric::SessionDurationMinutes),
            mean_user_retention: filter::compute_mean(window, Metric::UserRetentionPercent),
        },
        content: ContentPanel {
            videos_processed: filter::series(window, Metric::VideosProcessed),
            mean_user_satisfaction: filter::compute_mean(window, Metric::UserSatisfactionScore),
            popular_themes: filter::count_by_category(window, CategoryField::PopularTheme),
        },
        trends: TrendsPanel {
            location: criteria.location(),
            record_count: located.len(),
            trending_topics: filter::count_by_category(&located, CategoryField::TrendingTopic),
            satisfaction: filter::series(&located, Metric::UserSatisfactionScore),
        },
        features: filter::count_by_category(all, CategoryField::MostUsedFeature),
    }
}
