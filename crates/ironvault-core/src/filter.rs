//! Composable search filtering over credential records
//!
//! A filter is a plain configuration struct; [`SearchFilter::matches`] is a
//! stateless predicate over a record snapshot. Every set criterion is
//! AND-ed; a filter with no criteria matches everything.

use crate::models::CredentialRecord;

/// Search criteria over credential records.
///
/// Text queries are substring matches by default (`exact_match` switches to
/// equality, `case_sensitive` disables folding). `date_from`/`date_to` are
/// inclusive epoch-second bounds; 0 leaves that side unbounded. The
/// allow/deny category lists apply independently of the text queries.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub service_query: String,
    pub login_query: String,
    pub url_query: String,
    pub category_query: String,
    pub notes_query: String,

    pub case_sensitive: bool,
    pub exact_match: bool,
    pub search_in_notes: bool,

    pub date_from: i64,
    pub date_to: i64,

    pub categories: Vec<String>,
    pub excluded_categories: Vec<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience filter matching a single service name
    pub fn service_filter(service_name: &str) -> Self {
        Self {
            service_query: service_name.to_string(),
            ..Self::default()
        }
    }

    /// Convenience filter matching a single category (allow-list)
    pub fn category_filter(category: &str) -> Self {
        Self {
            categories: vec![category.to_string()],
            ..Self::default()
        }
    }

    /// Convenience filter over an inclusive modification-date range
    pub fn date_range_filter(from: i64, to: i64) -> Self {
        Self {
            date_from: from,
            date_to: to,
            ..Self::default()
        }
    }

    /// Evaluate every set criterion against the record
    pub fn matches(&self, record: &CredentialRecord) -> bool {
        self.matches_service(record)
            && self.matches_login(record)
            && self.matches_url(record)
            && self.matches_category_query(record)
            && self.matches_notes(record)
            && self.matches_date_range(record)
            && self.matches_category_lists(record)
    }

    /// Whether any criterion is set at all
    pub fn is_active(&self) -> bool {
        self.has_text_filters() || self.has_date_filters() || self.has_category_filters()
    }

    pub fn has_text_filters(&self) -> bool {
        !self.service_query.is_empty()
            || !self.login_query.is_empty()
            || !self.url_query.is_empty()
            || !self.category_query.is_empty()
            || (self.search_in_notes && !self.notes_query.is_empty())
    }

    pub fn has_date_filters(&self) -> bool {
        self.date_from != 0 || self.date_to != 0
    }

    pub fn has_category_filters(&self) -> bool {
        !self.categories.is_empty() || !self.excluded_categories.is_empty()
    }

    // === Clearing ===

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clear_service_query(&mut self) {
        self.service_query.clear();
    }

    pub fn clear_login_query(&mut self) {
        self.login_query.clear();
    }

    pub fn clear_url_query(&mut self) {
        self.url_query.clear();
    }

    pub fn clear_category_query(&mut self) {
        self.category_query.clear();
    }

    pub fn clear_notes_query(&mut self) {
        self.notes_query.clear();
    }

    pub fn clear_date_range(&mut self) {
        self.date_from = 0;
        self.date_to = 0;
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
    }

    pub fn clear_excluded_categories(&mut self) {
        self.excluded_categories.clear();
    }

    // === Per-criterion checks (each passes when its criterion is unset) ===

    fn matches_service(&self, record: &CredentialRecord) -> bool {
        self.service_query.is_empty()
            || self.matches_text(record.service_name(), &self.service_query)
    }

    fn matches_login(&self, record: &CredentialRecord) -> bool {
        self.login_query.is_empty() || self.matches_text(record.login(), &self.login_query)
    }

    fn matches_url(&self, record: &CredentialRecord) -> bool {
        self.url_query.is_empty() || self.matches_text(record.url(), &self.url_query)
    }

    fn matches_category_query(&self, record: &CredentialRecord) -> bool {
        self.category_query.is_empty()
            || self.matches_text(record.category(), &self.category_query)
    }

    // Records carry no notes field; a non-empty notes query with the flag
    // enabled therefore matches nothing.
    fn matches_notes(&self, _record: &CredentialRecord) -> bool {
        !self.search_in_notes || self.notes_query.is_empty()
    }

    fn matches_date_range(&self, record: &CredentialRecord) -> bool {
        let ts = record.last_modified().timestamp();
        (self.date_from == 0 || ts >= self.date_from)
            && (self.date_to == 0 || ts <= self.date_to)
    }

    fn matches_category_lists(&self, record: &CredentialRecord) -> bool {
        let category = record.category();
        let allowed =
            self.categories.is_empty() || self.categories.iter().any(|c| c == category);
        let denied = self.excluded_categories.iter().any(|c| c == category);
        allowed && !denied
    }

    fn matches_text(&self, text: &str, query: &str) -> bool {
        if self.case_sensitive {
            if self.exact_match {
                text == query
            } else {
                text.contains(query)
            }
        } else {
            let text = text.to_lowercase();
            let query = query.to_lowercase();
            if self.exact_match {
                text == query
            } else {
                text.contains(&query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CredentialRecord;

    fn record(service: &str, login: &str, url: &str, category: &str) -> CredentialRecord {
        CredentialRecord::new(service, url, login, "blob", category).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = SearchFilter::new();
        assert!(!filter.is_active());
        assert!(filter.matches(&record("GitHub", "dev", "https://github.com", "Dev")));
    }

    #[test]
    fn test_substring_match_is_case_insensitive_by_default() {
        let filter = SearchFilter::service_filter("hub");
        assert!(filter.matches(&record("GitHub", "dev", "", "Dev")));
        assert!(!filter.matches(&record("GitLab", "dev", "", "Dev")));
    }

    #[test]
    fn test_case_sensitive_match() {
        let mut filter = SearchFilter::service_filter("github");
        filter.case_sensitive = true;
        assert!(!filter.matches(&record("GitHub", "dev", "", "Dev")));

        filter.service_query = "GitH".to_string();
        assert!(filter.matches(&record("GitHub", "dev", "", "Dev")));
    }

    #[test]
    fn test_exact_match() {
        let mut filter = SearchFilter::service_filter("GitHub");
        filter.exact_match = true;
        assert!(filter.matches(&record("GitHub", "dev", "", "Dev")));
        assert!(!filter.matches(&record("GitHub Enterprise", "dev", "", "Dev")));
    }

    #[test]
    fn test_criteria_are_anded() {
        let mut filter = SearchFilter::service_filter("git");
        filter.login_query = "dev".to_string();

        assert!(filter.matches(&record("GitHub", "developer", "", "Dev")));
        assert!(!filter.matches(&record("GitHub", "ops", "", "Dev")));
        assert!(!filter.matches(&record("Mail", "developer", "", "Dev")));
    }

    #[test]
    fn test_category_allow_and_deny_lists() {
        let mut filter = SearchFilter::category_filter("Email");
        assert!(filter.matches(&record("Mail", "a", "", "Email")));
        assert!(!filter.matches(&record("GitHub", "a", "", "Dev")));

        filter.clear_categories();
        filter.excluded_categories.push("Dev".to_string());
        assert!(filter.matches(&record("Mail", "a", "", "Email")));
        assert!(!filter.matches(&record("GitHub", "a", "", "Dev")));
    }

    #[test]
    fn test_date_range_is_inclusive_and_zero_unbounded() {
        let rec = record("Mail", "a", "", "Email");
        let ts = rec.last_modified().timestamp();

        assert!(SearchFilter::date_range_filter(ts, ts).matches(&rec));
        assert!(SearchFilter::date_range_filter(0, ts).matches(&rec));
        assert!(SearchFilter::date_range_filter(ts, 0).matches(&rec));
        assert!(!SearchFilter::date_range_filter(ts + 1, 0).matches(&rec));
        assert!(!SearchFilter::date_range_filter(0, ts - 1).matches(&rec));
    }

    #[test]
    fn test_notes_query_requires_flag() {
        let mut filter = SearchFilter::new();
        filter.notes_query = "todo".to_string();

        // Flag off: the notes query is ignored entirely
        assert!(filter.matches(&record("Mail", "a", "", "Email")));
        assert!(!filter.is_active());

        filter.search_in_notes = true;
        assert!(!filter.matches(&record("Mail", "a", "", "Email")));
        assert!(filter.is_active());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut filter = SearchFilter::service_filter("git");
        filter.date_from = 100;
        filter.excluded_categories.push("Dev".to_string());
        assert!(filter.is_active());

        filter.clear();
        assert!(!filter.is_active());
    }

    #[test]
    fn test_is_active_per_criterion() {
        let mut filter = SearchFilter::new();
        assert!(!filter.is_active());

        filter.date_to = 5;
        assert!(filter.has_date_filters());
        assert!(filter.is_active());

        filter.clear_date_range();
        filter.categories.push("Email".to_string());
        assert!(filter.has_category_filters());
        assert!(filter.is_active());
    }
}
