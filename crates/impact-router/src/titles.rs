use impact_access::PageId;
use std::collections::BTreeMap;

/// Title used when no label is known for a page
pub const GENERIC_TITLE: &str = "Impact Surveys";

/// Human-readable label of a page
#[must_use]
pub fn page_label(page: PageId) -> &'static str {
    match page {
        PageId::Landing => "Welcome",
        PageId::Login => "Sign in",
        PageId::OrgRegistration => "Register your organization",
        PageId::Dashboard => "Dashboard",
        PageId::Surveys => "Surveys",
        PageId::SurveyCreation => "New survey",
        PageId::EnhancedSurvey => "Your survey",
        PageId::SurveyView => "Survey",
        PageId::SurveyResults => "Survey results",
        PageId::SurveyShare => "Share survey",
        PageId::Profile => "Profile",
        PageId::Subscription => "Choose a package",
        PageId::PaymentMethod => "Payment method",
        PageId::PaymentDetails => "Payment details",
        PageId::SubscriptionConfirmation => "Subscription confirmed",
        PageId::Organizations => "Organizations",
        PageId::Users => "Users",
        PageId::Beneficiaries => "Beneficiaries",
        PageId::Reports => "Reports",
        PageId::SystemSettings => "System settings",
        PageId::AuditLog => "Audit log",
    }
}

/// Document titles keyed by page
///
/// Built-in labels can be overridden (localization); a blank label falls
/// back to the application title alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleTable {
    app_title: String,
    overrides: BTreeMap<PageId, String>,
}

impl TitleTable {
    /// Table with built-in labels under `app_title`
    #[must_use]
    pub fn new(app_title: impl Into<String>) -> Self {
        Self {
            app_title: app_title.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Override the label of one page
    #[must_use]
    pub fn with_label(mut self, page: PageId, label: impl Into<String>) -> Self {
        self.overrides.insert(page, label.into());
        self
    }

    /// Application title
    #[inline]
    #[must_use]
    pub fn app_title(&self) -> &str {
        &self.app_title
    }

    /// Document title of a page, `"{label} | {app}"`
    #[must_use]
    pub fn title_for(&self, page: PageId) -> String {
        let label = self
            .overrides
            .get(&page)
            .map_or_else(|| page_label(page), String::as_str);
        match (label.trim().is_empty(), self.app_title.is_empty()) {
            (true, true) => GENERIC_TITLE.to_string(),
            (true, false) => self.app_title.clone(),
            (false, true) => label.to_string(),
            (false, false) => format!("{label} | {}", self.app_title),
        }
    }
}

impl Default for TitleTable {
    fn default() -> Self {
        Self::new(GENERIC_TITLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_combines_label_and_app() {
        let titles = TitleTable::new("Impact");
        assert_eq!(titles.title_for(PageId::Dashboard), "Dashboard | Impact");
    }

    #[test]
    fn override_replaces_label() {
        let titles = TitleTable::new("Impact").with_label(PageId::Dashboard, "Tableau de bord");
        assert_eq!(titles.title_for(PageId::Dashboard), "Tableau de bord | Impact");
        assert_eq!(titles.title_for(PageId::Surveys), "Surveys | Impact");
    }

    #[test]
    fn blank_label_falls_back_to_generic() {
        let titles = TitleTable::new("").with_label(PageId::Reports, "  ");
        assert_eq!(titles.title_for(PageId::Reports), GENERIC_TITLE);
        assert_eq!(titles.title_for(PageId::Users), "Users");
    }

    #[test]
    fn every_page_has_a_label() {
        for page in PageId::ALL {
            assert!(!page_label(page).is_empty());
        }
    }
}
