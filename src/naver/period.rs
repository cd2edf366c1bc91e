//! Period filter options understood by Naver search result pages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NaverDateOption {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "custom")]
    Custom,
}

impl NaverDateOption {
    /// Maps a collection window in days to a period option. Sub-day windows
    /// use the one-hour option; longer windows round to the closest period.
    pub fn from_day_range(days: f64) -> Self {
        if days < 1.0 {
            Self::OneHour
        } else if days <= 2.0 {
            Self::OneDay
        } else if days <= 14.0 {
            Self::OneWeek
        } else if days <= 60.0 {
            Self::OneMonth
        } else if days <= 120.0 {
            Self::ThreeMonths
        } else if days <= 240.0 {
            Self::SixMonths
        } else if days <= 365.0 {
            Self::OneYear
        } else {
            Self::All
        }
    }

    /// The `date_option` query value result pages carry for this period.
    /// Custom ranges have no URL form.
    pub fn date_option_number(self) -> i8 {
        match self {
            Self::All => 0,
            Self::OneHour => 1,
            Self::OneDay => 2,
            Self::OneWeek => 3,
            Self::OneMonth => 4,
            Self::ThreeMonths => 5,
            Self::SixMonths => 6,
            Self::OneYear => 7,
            Self::Custom => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::Custom => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_ranges_map_to_expected_options() {
        assert_eq!(NaverDateOption::from_day_range(0.5), NaverDateOption::OneHour);
        assert_eq!(NaverDateOption::from_day_range(1.0), NaverDateOption::OneDay);
        assert_eq!(NaverDateOption::from_day_range(10.0), NaverDateOption::OneWeek);
        assert_eq!(NaverDateOption::from_day_range(45.0), NaverDateOption::OneMonth);
        assert_eq!(
            NaverDateOption::from_day_range(100.0),
            NaverDateOption::ThreeMonths
        );
        assert_eq!(NaverDateOption::from_day_range(400.0), NaverDateOption::All);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(NaverDateOption::from_day_range(0.99), NaverDateOption::OneHour);
        assert_eq!(NaverDateOption::from_day_range(2.0), NaverDateOption::OneDay);
        assert_eq!(NaverDateOption::from_day_range(7.0), NaverDateOption::OneWeek);
        assert_eq!(NaverDateOption::from_day_range(14.0), NaverDateOption::OneWeek);
        assert_eq!(NaverDateOption::from_day_range(60.0), NaverDateOption::OneMonth);
        assert_eq!(
            NaverDateOption::from_day_range(180.0),
            NaverDateOption::SixMonths
        );
        assert_eq!(NaverDateOption::from_day_range(365.0), NaverDateOption::OneYear);
        assert_eq!(NaverDateOption::from_day_range(365.1), NaverDateOption::All);
    }

    #[test]
    fn date_option_numbers_match_the_result_page() {
        assert_eq!(NaverDateOption::All.date_option_number(), 0);
        assert_eq!(NaverDateOption::OneHour.date_option_number(), 1);
        assert_eq!(NaverDateOption::OneDay.date_option_number(), 2);
        assert_eq!(NaverDateOption::OneWeek.date_option_number(), 3);
        assert_eq!(NaverDateOption::OneMonth.date_option_number(), 4);
        assert_eq!(NaverDateOption::ThreeMonths.date_option_number(), 5);
        assert_eq!(NaverDateOption::SixMonths.date_option_number(), 6);
        assert_eq!(NaverDateOption::OneYear.date_option_number(), 7);
        assert_eq!(NaverDateOption::Custom.date_option_number(), -1);
    }

    #[test]
    fn serializes_as_the_short_form() {
        assert_eq!(
            serde_json::to_string(&NaverDateOption::OneWeek).unwrap(),
            "\"1w\""
        );
        let parsed: NaverDateOption = serde_json::from_str("\"3m\"").unwrap();
        assert_eq!(parsed, NaverDateOption::ThreeMonths);
    }
}
