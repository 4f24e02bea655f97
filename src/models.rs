use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One question/answer pair collected from the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "QID")]
    pub qid: String,
    #[serde(rename = "질문")]
    pub question: String,
    #[serde(rename = "답변")]
    pub answer: String,
}

/// Which date the listing is filtered and sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Date the question was asked
    #[default]
    Question,
    /// Date the answer was posted
    Answer,
}

impl Criterion {
    pub fn code(self) -> &'static str {
        match self {
            Criterion::Question => "1",
            Criterion::Answer => "2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub criterion: Criterion,
    pub start_date: NaiveDate,
    pub start_hour: u32,
    pub end_date: NaiveDate,
    pub end_hour: u32,
}

impl Default for ListingQuery {
    /// Yesterday 00h through today 23h.
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            criterion: Criterion::default(),
            start_date: today - Duration::days(1),
            start_hour: 0,
            end_date: today,
            end_hour: 23,
        }
    }
}

impl ListingQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        let start = Self::instant(self.start_date, self.start_hour)
            .ok_or_else(|| AppError::InvalidQuery(format!("start hour {} is not in 0..=23", self.start_hour)))?;
        let end = Self::instant(self.end_date, self.end_hour)
            .ok_or_else(|| AppError::InvalidQuery(format!("end hour {} is not in 0..=23", self.end_hour)))?;

        if start > end {
            return Err(AppError::InvalidQuery(format!(
                "start {} is after end {}",
                start.format("%Y-%m-%d %Hh"),
                end.format("%Y-%m-%d %Hh")
            )));
        }
        Ok(())
    }

    /// Query string pairs in the order the console expects them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("rCriterion", self.criterion.code().to_string()),
            ("sStartDate", self.start_date.format("%Y-%m-%d").to_string()),
            ("sStartHour", format!("{:02}", self.start_hour)),
            ("sEndDate", self.end_date.format("%Y-%m-%d").to_string()),
            ("sEndHour", format!("{:02}", self.end_hour)),
        ]
    }

    fn instant(date: NaiveDate, hour: u32) -> Option<NaiveDateTime> {
        date.and_hms_opt(hour, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn params_are_zero_padded_and_ordered() {
        let query = ListingQuery {
            criterion: Criterion::Answer,
            start_date: date("2024-03-01"),
            start_hour: 7,
            end_date: date("2024-03-02"),
            end_hour: 23,
        };

        let params = query.params();
        assert_eq!(
            params,
            vec![
                ("rCriterion", "2".to_string()),
                ("sStartDate", "2024-03-01".to_string()),
                ("sStartHour", "07".to_string()),
                ("sEndDate", "2024-03-02".to_string()),
                ("sEndHour", "23".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_reversed_range() {
        let query = ListingQuery {
            criterion: Criterion::Question,
            start_date: date("2024-03-02"),
            start_hour: 0,
            end_date: date("2024-03-01"),
            end_hour: 23,
        };
        assert!(matches!(query.validate(), Err(AppError::InvalidQuery(_))));
    }

    #[test]
    fn rejects_out_of_range_hour() {
        let query = ListingQuery {
            start_hour: 24,
            ..ListingQuery::default()
        };
        assert!(matches!(query.validate(), Err(AppError::InvalidQuery(_))));
    }

    #[test]
    fn same_day_range_is_valid() {
        let query = ListingQuery {
            criterion: Criterion::Question,
            start_date: date("2024-03-01"),
            start_hour: 9,
            end_date: date("2024-03-01"),
            end_hour: 9,
        };
        assert!(query.validate().is_ok());
        assert!(ListingQuery::default().validate().is_ok());
    }
}
