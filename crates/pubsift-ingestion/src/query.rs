//! PubMed search term and date window construction.

use chrono::{Days, NaiveDate};

use crate::models::SearchRequest;

const HUMANS_CLAUSE: &str = "humans[MeSH Terms]";
const OPEN_ACCESS_CLAUSE: &str = "free full text[sb]";
const DATE_FORMAT: &str = "%Y/%m/%d";

/// `<query>[ AND <type>][ AND humans][ AND free full text]`
pub fn build_search_term(request: &SearchRequest) -> String {
    let mut term = request.query.trim().to_string();

    if let Some(article_type) = request.article_type {
        term.push_str(" AND ");
        term.push_str(article_type.clause());
    }
    if request.humans_only {
        term.push_str(" AND ");
        term.push_str(HUMANS_CLAUSE);
    }
    if request.open_access {
        term.push_str(" AND ");
        term.push_str(OPEN_ACCESS_CLAUSE);
    }

    term
}

/// Publication date range passed to esearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateWindow {
    /// `[today - years * 365 days, today]`. Saturates at 1800-01-01.
    pub fn years_back(years: u32, today: NaiveDate) -> Self {
        let earliest = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or(NaiveDate::MIN);
        let min = today
            .checked_sub_days(Days::new(u64::from(years) * 365))
            .filter(|d| *d >= earliest)
            .unwrap_or(earliest);
        Self { min, max: today }
    }

    pub fn min_param(&self) -> String {
        self.min.format(DATE_FORMAT).to_string()
    }

    pub fn max_param(&self) -> String {
        self.max.format(DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleType;

    #[test]
    fn test_plain_query() {
        let mut request = SearchRequest::new("  GLP-1 obesity ");
        request.humans_only = false;
        assert_eq!(build_search_term(&request), "GLP-1 obesity");
    }

    #[test]
    fn test_all_filters_in_order() {
        let request = SearchRequest {
            article_type: Some(ArticleType::MetaAnalysis),
            humans_only: true,
            open_access: true,
            ..SearchRequest::new("GLP-1 obesity")
        };
        assert_eq!(
            build_search_term(&request),
            "GLP-1 obesity AND Meta-Analysis[Publication Type] AND humans[MeSH Terms] AND free full text[sb]"
        );
    }

    #[test]
    fn test_unrecognised_type_adds_no_clause() {
        let request = SearchRequest {
            article_type: ArticleType::from_label("Editorial"),
            humans_only: false,
            ..SearchRequest::new("asthma")
        };
        assert_eq!(build_search_term(&request), "asthma");
    }

    #[test]
    fn test_date_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = DateWindow::years_back(2, today);
        assert_eq!(window.max_param(), "2024/03/15");
        // 730 days, not calendar years
        assert_eq!(window.min_param(), "2022/03/16");

        let same_day = DateWindow::years_back(0, today);
        assert_eq!(same_day.min, same_day.max);
    }

    #[test]
    fn test_date_window_saturates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = DateWindow::years_back(u32::MAX, today);
        assert_eq!(window.min_param(), "1800/01/01");
    }
}
