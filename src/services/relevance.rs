use std::collections::HashSet;

use serde::Deserialize;

use crate::domain::country::Country;
use crate::domain::job::JobPosting;

/// Which policy decides relevance. `Country` keeps every role in the target
/// countries; `CountryAndTitle` additionally requires a title keyword hit
/// (the finance-roles variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    Country,
    CountryAndTitle,
}

/// Pure inclusion policy over extracted postings. Target sets come from
/// configuration, never hard-coded here.
pub struct RelevanceFilter {
    mode: FilterMode,
    countries: HashSet<Country>,
    title_keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(
        mode: FilterMode,
        countries: impl IntoIterator<Item = Country>,
        title_keywords: Vec<String>,
    ) -> Self {
        // Unknown can never be a target, whatever the configuration says.
        let countries = countries
            .into_iter()
            .filter(|country| *country != Country::Unknown)
            .collect();
        let title_keywords = title_keywords
            .into_iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();

        RelevanceFilter {
            mode,
            countries,
            title_keywords,
        }
    }

    pub fn is_relevant(&self, job: &JobPosting) -> bool {
        if !self.countries.contains(&job.country) {
            return false;
        }

        match self.mode {
            FilterMode::Country => true,
            FilterMode::CountryAndTitle => {
                let title_lower = job.title.to_lowercase();
                self.title_keywords
                    .iter()
                    .any(|keyword| title_lower.contains(keyword))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, country: Country) -> JobPosting {
        JobPosting::new(
            "x".to_string(),
            title.to_string(),
            "https://x.com/1".to_string(),
            title.to_string(),
            country,
            country.display_name().to_string(),
        )
    }

    fn all_targets() -> Vec<Country> {
        vec![
            Country::Uae,
            Country::SaudiArabia,
            Country::Qatar,
            Country::UnitedKingdom,
        ]
    }

    #[test]
    fn country_mode_accepts_any_title_in_target_countries() {
        let filter = RelevanceFilter::new(FilterMode::Country, all_targets(), vec![]);

        assert!(filter.is_relevant(&job("Barista", Country::Uae)));
        assert!(filter.is_relevant(&job("Head of Treasury", Country::Qatar)));
    }

    #[test]
    fn unknown_country_is_never_relevant() {
        let country_only = RelevanceFilter::new(FilterMode::Country, all_targets(), vec![]);
        let with_titles = RelevanceFilter::new(
            FilterMode::CountryAndTitle,
            all_targets(),
            vec!["treasury".to_string()],
        );

        assert!(!country_only.is_relevant(&job("Head of Treasury", Country::Unknown)));
        assert!(!with_titles.is_relevant(&job("Head of Treasury", Country::Unknown)));
    }

    #[test]
    fn unknown_in_configuration_is_ignored() {
        let filter = RelevanceFilter::new(FilterMode::Country, vec![Country::Unknown], vec![]);

        assert!(!filter.is_relevant(&job("Anything", Country::Unknown)));
    }

    #[test]
    fn title_mode_requires_a_keyword_hit() {
        let filter = RelevanceFilter::new(
            FilterMode::CountryAndTitle,
            all_targets(),
            vec!["finance director".to_string(), "cfo".to_string()],
        );

        assert!(filter.is_relevant(&job("Senior Finance Director", Country::Uae)));
        assert!(filter.is_relevant(&job("Group CFO", Country::SaudiArabia)));
        assert!(!filter.is_relevant(&job("Software Engineer", Country::Uae)));
    }

    #[test]
    fn title_mode_still_filters_by_country() {
        let filter = RelevanceFilter::new(
            FilterMode::CountryAndTitle,
            vec![Country::Qatar],
            vec!["cfo".to_string()],
        );

        assert!(!filter.is_relevant(&job("Group CFO", Country::Uae)));
        assert!(filter.is_relevant(&job("Group CFO", Country::Qatar)));
    }
}
