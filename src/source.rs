use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{CriteriaError, DatasetError};
use crate::models::{Metric, Record};

/// An immutable, date-ordered collection of daily records.
///
/// Construction sorts by date and rejects duplicate days and numeric
/// fields that are negative or not finite, so every view built from a
/// `Dataset` can rely on those invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(mut records: Vec<Record>) -> Result<Self, DatasetError> {
        records.sort_by_key(|record| record.date);

        for pair in records.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(DatasetError::DuplicateDate(pair[0].date));
            }
        }

        for record in &records {
            for metric in Metric::ALL.iter().copied() {
                let value = metric.value(record);
                if !value.is_finite() || value < 0.0 {
                    return Err(DatasetError::InvalidValue {
                        date: record.date,
                        field: metric.name(),
                        value,
                    });
                }
            }
        }

        debug!(records = records.len(), "dataset validated");
        Ok(Self { records })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in reader.deserialize::<Record>() {
            records.push(result?);
        }

        Self::new(records)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        let dataset = Self::from_reader(file)?;
        info!(path = %path.display(), records = dataset.len(), "loaded records from csv");
        Ok(dataset)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|record| record.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|record| record.date)
    }

    /// Resolves optional bounds into an inclusive window. Unset bounds take
    /// the dataset's span but never cross an explicit bound; an empty
    /// dataset with no bounds spans every representable date.
    pub fn window(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate), CriteriaError> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, self.last_date().map_or(start, |last| last.max(start))),
            (None, Some(end)) => (self.first_date().map_or(end, |first| first.min(end)), end),
            (None, None) => (
                self.first_date().unwrap_or(NaiveDate::MIN),
                self.last_date().unwrap_or(NaiveDate::MAX),
            ),
        };

        if start > end {
            return Err(CriteriaError::InvertedRange { start, end });
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{day, sample_record};
    use crate::models::{Feature, Location, Theme, Topic};

    const SNAKE_CASE: &str = "\
date,active_users,session_duration_minutes,user_retention_percent,videos_processed,user_satisfaction_score,popular_theme,trending_topic,most_used_feature,user_location
2022-01-02,150,12.5,33.1,90,4.4,Theme B,Topic Y,Feature 2,Europe
2022-01-01,100,20.0,41.0,75,3.9,Theme A,Topic X,Feature 1,USA
";

    const CAPITALISED_HEADERS: &str = "\
Date,Active_Users,Session_Duration,User_Retention,Videos_Processed,User_Satisfaction,Popular_Themes,Trending_Topic,Most_Used_Feature,User_Location
2022-01-01, 100, 20.0, 41.0, 75, 3.9, Theme A, Topic Z, Feature 3, Asia
";

    #[test]
    fn loads_and_sorts_csv_rows() {
        let dataset = Dataset::from_reader(SNAKE_CASE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.first_date(), Some(day(1)));
        assert_eq!(dataset.last_date(), Some(day(2)));
        assert_eq!(dataset.records()[1].popular_theme, Theme::B);
        assert_eq!(dataset.records()[1].user_location, Location::Europe);
    }

    #[test]
    fn accepts_capitalised_column_headers() {
        let dataset = Dataset::from_reader(CAPITALISED_HEADERS.as_bytes()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.active_users, 100);
        assert_eq!(record.trending_topic, Topic::Z);
        assert_eq!(record.most_used_feature, Feature::Three);
        assert_eq!(record.user_location, Location::Asia);
    }

    #[test]
    fn rejects_labels_outside_the_closed_set() {
        let csv = SNAKE_CASE.replace("Europe", "Twitter");
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes()),
            Err(DatasetError::Csv(_))
        ));
    }

    #[test]
    fn labels_load_regardless_of_case() {
        let csv = SNAKE_CASE.replace("Europe", "europe").replace("Theme A", "theme a");
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].popular_theme, Theme::A);
        assert_eq!(dataset.records()[1].user_location, Location::Europe);
    }

    #[test]
    fn rejects_duplicate_days() {
        let records = vec![sample_record(3, 100), sample_record(3, 120)];
        assert!(matches!(
            Dataset::new(records),
            Err(DatasetError::DuplicateDate(date)) if date == day(3)
        ));
    }

    #[test]
    fn rejects_negative_and_non_finite_values() {
        let mut negative = sample_record(1, 100);
        negative.user_retention_percent = -1.0;
        assert!(matches!(
            Dataset::new(vec![negative]),
            Err(DatasetError::InvalidValue { field: "user_retention_percent", .. })
        ));

        let mut nan = sample_record(1, 100);
        nan.user_satisfaction_score = f64::NAN;
        assert!(Dataset::new(vec![nan]).is_err());
    }

    #[test]
    fn empty_dataset_has_no_span() {
        let dataset = Dataset::new(Vec::new()).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.first_date(), None);
        assert_eq!(dataset.last_date(), None);
    }

    fn five_days() -> Dataset {
        Dataset::new((1..=5).map(|d| sample_record(d, 100)).collect()).unwrap()
    }

    #[test]
    fn window_defaults_to_full_span() {
        assert_eq!(five_days().window(None, None), Ok((day(1), day(5))));
    }

    #[test]
    fn window_fills_only_the_missing_bound() {
        let dataset = five_days();
        assert_eq!(dataset.window(Some(day(3)), None), Ok((day(3), day(5))));
        assert_eq!(dataset.window(None, Some(day(2))), Ok((day(1), day(2))));
    }

    #[test]
    fn window_on_empty_dataset() {
        let dataset = Dataset::default();
        assert_eq!(
            dataset.window(None, None),
            Ok((NaiveDate::MIN, NaiveDate::MAX))
        );
        assert_eq!(dataset.window(Some(day(4)), None), Ok((day(4), day(4))));
    }

    #[test]
    fn window_starting_after_last_record_is_empty_not_inverted() {
        let dataset = five_days();
        let (start, end) = dataset.window(Some(day(20)), None).unwrap();
        assert_eq!((start, end), (day(20), day(20)));
        assert!(crate::filter::filter_by_date_range(dataset.records(), start, end).is_empty());
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert_eq!(
            five_days().window(Some(day(20)), Some(day(5))),
            Err(CriteriaError::InvertedRange {
                start: day(20),
                end: day(5),
            })
        );
    }
}
