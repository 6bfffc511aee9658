use ember_core::{RiskAssessment, RiskStatus, WeatherSample};

/// Wildfire risk from one weather sample. Fixed linear weights:
///
/// ```text
/// score = temp*0.2 + wind*0.5 + (100 - humidity)*0.3
/// ```
///
/// Critical at score >= 80, Caution at >= 50, Normal below. Classification
/// happens on the raw score; the stored value is rounded to 2 decimals.
pub fn assess(sample: &WeatherSample) -> RiskAssessment {
    let score =
        sample.temp_c * 0.2 + sample.wind_mps * 0.5 + (100.0 - sample.humidity_pct) * 0.3;
    let status = if score >= 80.0 {
        RiskStatus::Critical
    } else if score >= 50.0 {
        RiskStatus::Caution
    } else {
        RiskStatus::Normal
    };
    RiskAssessment { score: (score * 100.0).round() / 100.0, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temp_c: f64, humidity_pct: f64, wind_mps: f64) -> WeatherSample {
        WeatherSample { temp_c, humidity_pct, wind_mps }
    }

    #[test]
    fn score_is_the_fixed_affine_combination() {
        // 30*0.2 + 10*0.5 + 60*0.3 = 29.0
        let a = assess(&sample(30.0, 40.0, 10.0));
        assert_eq!(a.score, 29.0);
        assert_eq!(a.status, RiskStatus::Normal);

        // 35*0.2 + 12*0.5 + 80*0.3 = 37.0
        let a = assess(&sample(35.0, 20.0, 12.0));
        assert_eq!(a.score, 37.0);
        assert_eq!(a.status, RiskStatus::Normal);
    }

    #[test]
    fn caution_starts_at_exactly_fifty() {
        // 0*0.2 + 100*0.5 + 0*0.3 = 50.0
        let a = assess(&sample(0.0, 100.0, 100.0));
        assert_eq!(a.score, 50.0);
        assert_eq!(a.status, RiskStatus::Caution);
    }

    #[test]
    fn just_below_fifty_is_normal() {
        // 0*0.2 + 99.998*0.5 + 0*0.3 = 49.999
        let a = assess(&sample(0.0, 100.0, 99.998));
        assert_eq!(a.status, RiskStatus::Normal);
    }

    #[test]
    fn critical_starts_at_exactly_eighty() {
        // 0*0.2 + 160*0.5 + 0*0.3 = 80.0
        let a = assess(&sample(0.0, 100.0, 160.0));
        assert_eq!(a.score, 80.0);
        assert_eq!(a.status, RiskStatus::Critical);
    }

    #[test]
    fn just_below_eighty_is_caution() {
        // 0*0.2 + 159.998*0.5 + 0*0.3 = 79.999; rounds to 80.0 for storage
        // but is still classified below the Critical boundary.
        let a = assess(&sample(0.0, 100.0, 159.998));
        assert_eq!(a.status, RiskStatus::Caution);
    }

    #[test]
    fn dry_hot_windy_is_critical() {
        // 40*0.2 + 150*0.5 + 95*0.3 = 111.5
        let a = assess(&sample(40.0, 5.0, 150.0));
        assert_eq!(a.score, 111.5);
        assert_eq!(a.status, RiskStatus::Critical);
    }
}
