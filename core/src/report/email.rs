//! HTML e-mail assembly for one daily report.

use super::{
    metrics::{round2, DailyMetrics},
    prompt::display_date,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmailOptions {
    pub dashboard_url: Option<String>,
    pub feedback_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEmail {
    pub day: NaiveDate,
    pub subject: String,
    pub summary: String,
    pub html: String,
}

impl ReportEmail {
    pub fn subject_for(day: NaiveDate) -> String {
        format!("Fraud Analyst Daily Report — {}", display_date(day))
    }

    /// `summary` must already be normalized markup.
    pub fn build(metrics: &DailyMetrics, summary: &str, options: &EmailOptions) -> Self {
        let date = display_date(metrics.day);
        let mut html = String::new();
        html.push_str("<html>\n<body>\n");
        html.push_str(&format!("<p><b>{date} Fraud Summary:</b></p>\n"));
        html.push_str("<ul>\n");
        html.push_str(&format!(
            "<li><b>Fraud % change (vs yesterday):</b> {}%</li>\n",
            round2(metrics.day_over_day.fraud)
        ));
        html.push_str(&format!(
            "<li><b>Message volume change (vs yesterday):</b> {}%</li>\n",
            round2(metrics.day_over_day.volume)
        ));
        html.push_str(&format!(
            "<li><b>Cost change (vs yesterday):</b> {}%</li>\n",
            round2(metrics.day_over_day.cost)
        ));
        html.push_str(&format!(
            "<li><b>Fraud % change (week on week):</b> {}%</li>\n",
            round2(metrics.week_over_week.fraud)
        ));
        html.push_str("</ul>\n\n");
        html.push_str(&format!("<p>{summary}</p>\n\n"));

        if let Some(url) = &options.dashboard_url {
            html.push_str(&format!(
                "<p><b>Full dashboard:</b><br>\n<a href=\"{url}\">View dashboard</a></p>\n\n"
            ));
        }
        html.push_str(
            "<p style=\"font-size:12px; color:gray;\"><i>This summary was AI-generated. \
             Please verify insights before making operational decisions.</i></p>\n",
        );
        if let Some(url) = &options.feedback_url {
            html.push_str(&format!(
                "<p style=\"font-size:12px; color:gray;\"><i>Got feedback? \
                 <a href=\"{url}\" target=\"_blank\">Leave it here</a></i></p>\n"
            ));
        }
        html.push_str("</body>\n</html>\n");

        Self {
            day: metrics.day,
            subject: Self::subject_for(metrics.day),
            summary: summary.to_string(),
            html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::metrics::DayIndex;

    #[test]
    fn subject_uses_readable_date() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(ReportEmail::subject_for(day), "Fraud Analyst Daily Report — Dec 25, 2024");
    }

    #[test]
    fn optional_links_only_when_configured() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let m = DailyMetrics::compute(&DayIndex::default(), day);
        let bare = ReportEmail::build(&m, "<b>X</b>", &EmailOptions::default());
        assert!(!bare.html.contains("href"));
        assert!(bare.html.contains("<b>X</b>"));

        let opts = EmailOptions {
            dashboard_url: Some("https://dash.example/r".into()),
            feedback_url: None,
        };
        let linked = ReportEmail::build(&m, "s", &opts);
        assert!(linked.html.contains("https://dash.example/r"));
    }
}
