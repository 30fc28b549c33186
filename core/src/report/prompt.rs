//! The analyst request sent to the summary writer.

use super::metrics::{round2, DailyMetrics};
use chrono::NaiveDate;

/// "Dec 5, 2024"
pub fn display_date(day: NaiveDate) -> String {
    day.format("%b %-d, %Y").to_string()
}

pub const SECTIONS: [&str; 3] = ["Country Trends", "Aggregator Trends", "Channel Trends"];

pub fn build_prompt(m: &DailyMetrics) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a senior fraud data analyst who turns metrics into short, plain insights.\n\n");
    prompt.push_str(&format!(
        "Using the messaging fraud metrics for {}, write 2 bullet points under each section:\n\n",
        display_date(m.day)
    ));
    for section in SECTIONS {
        prompt.push_str(&format!("- {section}\n"));
    }
    prompt.push_str(
        "\nEach bullet is one technical insight. Formatting:\n\
         - Section titles in <b>bold</b>.\n\
         - Separate bullets with <br>.\n\
         - Use <br><br> only between sections.\n\n",
    );
    prompt.push_str("Metrics:\n");
    prompt.push_str(&format!(
        "- Day-on-day fraud % change: {}%\n",
        round2(m.day_over_day.fraud)
    ));
    prompt.push_str(&format!(
        "- Day-on-day volume % change: {}%\n",
        round2(m.day_over_day.volume)
    ));
    prompt.push_str(&format!(
        "- Day-on-day cost % change: {}%\n",
        round2(m.day_over_day.cost)
    ));
    prompt.push_str(&format!(
        "- Week-on-week fraud % change: {}%\n",
        round2(m.week_over_week.fraud)
    ));
    prompt.push_str(&format!("- Country trend: {}\n", m.country_trend()));
    prompt.push_str(&format!("- Aggregator trend: {}\n", m.aggregator_trend()));
    prompt.push_str(&format!("- Channel volumes: {}\n", m.channel_summary()));
    prompt.push_str(&format!("- Top channel: {}\n", m.top_channel().unwrap_or("N/A")));
    if let Some((country, cost)) = m.cost_by_country.first() {
        prompt.push_str(&format!("- Highest cost country: {country} ({cost:.4} GBP)\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::metrics::DayIndex;

    #[test]
    fn date_has_no_zero_padding() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(display_date(day), "Jan 5, 2025");
    }

    #[test]
    fn prompt_lists_sections_and_metrics() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let m = DailyMetrics::compute(&DayIndex::default(), day);
        let prompt = build_prompt(&m);
        for section in SECTIONS {
            assert!(prompt.contains(section));
        }
        assert!(prompt.contains("Jan 5, 2025"));
        assert!(prompt.contains("Top channel: N/A"));
        assert!(prompt.contains("Day-on-day fraud % change: 0%"));
    }
}
