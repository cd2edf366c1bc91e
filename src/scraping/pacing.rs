//! Human-like pacing: randomized delays between keywords, between page
//! interactions, and between typed characters.

use crate::scraping::{DelayRange, ScrapeMode, ScrapingConfig};
use rand::Rng;
use std::time::Duration;

/// Samples a delay inside the range. A collapsed range yields its minimum.
pub fn sample_delay(range: DelayRange) -> Duration {
    if range.max <= range.min {
        return Duration::from_millis(range.min);
    }
    Duration::from_millis(rand::rng().random_range(range.min..=range.max))
}

/// Delay inserted between keywords. Fast mode skips pacing entirely.
pub fn keyword_delay(config: &ScrapingConfig) -> Duration {
    if config.mode == ScrapeMode::Fast {
        return Duration::ZERO;
    }
    sample_delay(config.delay_between_keywords)
}

/// Pause between page interactions. Fast mode uses a short reading pause;
/// the other modes reuse their keyword delay range.
pub fn human_pause(config: &ScrapingConfig) -> Duration {
    if config.mode == ScrapeMode::Fast {
        Duration::from_millis(rand::rng().random_range(100..=300))
    } else {
        sample_delay(config.delay_between_keywords)
    }
}

/// Per-character cadence for typing into the search box.
pub fn typing_delay() -> Duration {
    Duration::from_millis(rand::rng().random_range(120..=200))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_inside_the_range() {
        let range = DelayRange {
            min: 10_000,
            max: 30_000,
        };
        for _ in 0..100 {
            let delay = sample_delay(range).as_millis() as u64;
            assert!((10_000..=30_000).contains(&delay));
        }
    }

    #[test]
    fn collapsed_range_yields_its_minimum() {
        assert_eq!(
            sample_delay(DelayRange { min: 0, max: 0 }),
            Duration::ZERO
        );
        assert_eq!(
            sample_delay(DelayRange { min: 500, max: 500 }),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn fast_mode_skips_keyword_pacing() {
        let config = ScrapingConfig::for_mode(ScrapeMode::Fast);
        assert_eq!(keyword_delay(&config), Duration::ZERO);
    }

    #[test]
    fn safe_mode_delays_are_long() {
        let config = ScrapingConfig::for_mode(ScrapeMode::Safe);
        for _ in 0..20 {
            let delay = keyword_delay(&config).as_millis() as u64;
            assert!((120_000..=300_000).contains(&delay));
        }
    }

    #[test]
    fn fast_mode_still_pauses_between_interactions() {
        let config = ScrapingConfig::for_mode(ScrapeMode::Fast);
        for _ in 0..50 {
            let pause = human_pause(&config).as_millis() as u64;
            assert!((100..=300).contains(&pause));
        }
    }

    #[test]
    fn typing_cadence_is_between_120_and_200_ms() {
        for _ in 0..50 {
            let delay = typing_delay().as_millis() as u64;
            assert!((120..=200).contains(&delay));
        }
    }
}
