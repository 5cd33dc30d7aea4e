use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CriteriaError;

/// Declares a closed set of display labels with `Display`/`FromStr` and
/// serde support keyed on the label text.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($field:literal) { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = CriteriaError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| CriteriaError::UnknownCategory {
                        field: $field,
                        value: value.to_string(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = CriteriaError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

labelled_enum! {
    /// Content theme that drew the most engagement on a given day.
    Theme ("popular_theme") {
        A => "Theme A",
        B => "Theme B",
        C => "Theme C",
    }
}

labelled_enum! {
    Topic ("trending_topic") {
        X => "Topic X",
        Y => "Topic Y",
        Z => "Topic Z",
    }
}

labelled_enum! {
    Feature ("most_used_feature") {
        One => "Feature 1",
        Two => "Feature 2",
        Three => "Feature 3",
    }
}

labelled_enum! {
    /// Region the bulk of a day's users came from.
    Location ("user_location") {
        Usa => "USA",
        Europe => "Europe",
        Asia => "Asia",
    }
}

/// One day of engagement figures.
///
/// Column aliases let the dashboard read exports that use the older
/// capitalised headers as well as the snake_case field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(alias = "Active_Users")]
    pub active_users: u32,
    #[serde(alias = "Session_Duration")]
    pub session_duration_minutes: f64,
    #[serde(alias = "User_Retention")]
    pub user_retention_percent: f64,
    #[serde(alias = "Videos_Processed")]
    pub videos_processed: u32,
    #[serde(alias = "User_Satisfaction")]
    pub user_satisfaction_score: f64,
    #[serde(alias = "Popular_Themes")]
    pub popular_theme: Theme,
    #[serde(alias = "Trending_Topic")]
    pub trending_topic: Topic,
    #[serde(alias = "Most_Used_Feature")]
    pub most_used_feature: Feature,
    #[serde(alias = "User_Location")]
    pub user_location: Location,
}

/// Numeric columns a chart or summary can be driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ActiveUsers,
    SessionDurationMinutes,
    UserRetentionPercent,
    VideosProcessed,
    UserSatisfactionScore,
}

impl Metric {
    pub const ALL: &'static [Metric] = &[
        Metric::ActiveUsers,
        Metric::SessionDurationMinutes,
        Metric::UserRetentionPercent,
        Metric::VideosProcessed,
        Metric::UserSatisfactionScore,
    ];

    /// Field name as it appears on [`Record`] and in CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            Metric::ActiveUsers => "active_users",
            Metric::SessionDurationMinutes => "session_duration_minutes",
            Metric::UserRetentionPercent => "user_retention_percent",
            Metric::VideosProcessed => "videos_processed",
            Metric::UserSatisfactionScore => "user_satisfaction_score",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::ActiveUsers => "Active Users",
            Metric::SessionDurationMinutes => "Session Duration",
            Metric::UserRetentionPercent => "User Retention",
            Metric::VideosProcessed => "Videos Processed",
            Metric::UserSatisfactionScore => "User Satisfaction",
        }
    }

    fn legacy_name(self) -> &'static str {
        match self {
            Metric::ActiveUsers => "Active_Users",
            Metric::SessionDurationMinutes => "Session_Duration",
            Metric::UserRetentionPercent => "User_Retention",
            Metric::VideosProcessed => "Videos_Processed",
            Metric::UserSatisfactionScore => "User_Satisfaction",
        }
    }

    pub fn value(self, record: &Record) -> f64 {
        match self {
            Metric::ActiveUsers => f64::from(record.active_users),
            Metric::SessionDurationMinutes => record.session_duration_minutes,
            Metric::UserRetentionPercent => record.user_retention_percent,
            Metric::VideosProcessed => f64::from(record.videos_processed),
            Metric::UserSatisfactionScore => record.user_satisfaction_score,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = CriteriaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Metric::ALL
            .iter()
            .copied()
            .find(|metric| {
                metric.name().eq_ignore_ascii_case(wanted)
                    || metric.legacy_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CriteriaError::UnknownMetric(value.to_string()))
    }
}

/// Categorical columns that can be counted or filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryField {
    PopularTheme,
    TrendingTopic,
    MostUsedFeature,
    UserLocation,
}

impl CategoryField {
    pub const ALL: &'static [CategoryField] = &[
        CategoryField::PopularTheme,
        CategoryField::TrendingTopic,
        CategoryField::MostUsedFeature,
        CategoryField::UserLocation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CategoryField::PopularTheme => "popular_theme",
            CategoryField::TrendingTopic => "trending_topic",
            CategoryField::MostUsedFeature => "most_used_feature",
            CategoryField::UserLocation => "user_location",
        }
    }

    pub fn label_of(self, record: &Record) -> &'static str {
        match self {
            CategoryField::PopularTheme => record.popular_theme.label(),
            CategoryField::TrendingTopic => record.trending_topic.label(),
            CategoryField::MostUsedFeature => record.most_used_feature.label(),
            CategoryField::UserLocation => record.user_location.label(),
        }
    }
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoryField {
    type Err = CriteriaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        CategoryField::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CriteriaError::UnknownCategory {
                field: "category field",
                value: value.to_string(),
            })
    }
}

/// A categorical value tagged with the column it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryValue {
    Theme(Theme),
    Topic(Topic),
    Feature(Feature),
    Location(Location),
}

impl CategoryValue {
    pub fn matches(self, record: &Record) -> bool {
        match self {
            CategoryValue::Theme(theme) => record.popular_theme == theme,
            CategoryValue::Topic(topic) => record.trending_topic == topic,
            CategoryValue::Feature(feature) => record.most_used_feature == feature,
            CategoryValue::Location(location) => record.user_location == location,
        }
    }
}

/// The filter state behind one dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criteria {
    start: NaiveDate,
    end: NaiveDate,
    location: Location,
    metric: Metric,
}

impl Criteria {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        location: Location,
        metric: Metric,
    ) -> Result<Self, CriteriaError> {
        if start > end {
            return Err(CriteriaError::InvertedRange { start, end });
        }

        Ok(Self {
            start,
            end,
            location,
            metric,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    pub(crate) fn sample_record(d: u32, active_users: u32) -> Record {
        Record {
            date: day(d),
            active_users,
            session_duration_minutes: 12.5,
            user_retention_percent: 40.0,
            videos_processed: 80,
            user_satisfaction_score: 4.2,
            popular_theme: Theme::A,
            trending_topic: Topic::X,
            most_used_feature: Feature::One,
            user_location: Location::Usa,
        }
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("usa".parse::<Location>().unwrap(), Location::Usa);
        assert_eq!(" Theme B ".parse::<Theme>().unwrap(), Theme::B);
        assert_eq!("feature 3".parse::<Feature>().unwrap(), Feature::Three);
    }

    #[test]
    fn unknown_label_is_rejected_at_parse_time() {
        let err = "Twitter".parse::<Location>().unwrap_err();
        assert_eq!(
            err,
            CriteriaError::UnknownCategory {
                field: "user_location",
                value: "Twitter".to_string(),
            }
        );
    }

    #[test]
    fn metric_accepts_field_and_column_names() {
        assert_eq!("active_users".parse::<Metric>().unwrap(), Metric::ActiveUsers);
        assert_eq!(
            "Session_Duration".parse::<Metric>().unwrap(),
            Metric::SessionDurationMinutes
        );
        assert!(matches!(
            "bounce_rate".parse::<Metric>(),
            Err(CriteriaError::UnknownMetric(_))
        ));
    }

    #[test]
    fn metric_reads_matching_field() {
        let record = sample_record(1, 150);
        assert_eq!(Metric::ActiveUsers.value(&record), 150.0);
        assert_eq!(Metric::UserRetentionPercent.value(&record), 40.0);
        assert_eq!(Metric::VideosProcessed.value(&record), 80.0);
    }

    #[test]
    fn criteria_rejects_inverted_range() {
        let err = Criteria::new(day(5), day(2), Location::Asia, Metric::ActiveUsers).unwrap_err();
        assert_eq!(
            err,
            CriteriaError::InvertedRange {
                start: day(5),
                end: day(2),
            }
        );
        assert!(Criteria::new(day(2), day(2), Location::Asia, Metric::ActiveUsers).is_ok());
    }

    #[test]
    fn category_value_selects_its_own_column() {
        let record = sample_record(1, 100);
        assert!(CategoryValue::Location(Location::Usa).matches(&record));
        assert!(!CategoryValue::Theme(Theme::B).matches(&record));
        assert!(CategoryValue::Topic(Topic::X).matches(&record));
        assert_eq!(CategoryField::UserLocation.label_of(&record), "USA");
    }
}
