use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::reconcile::CollectedUrlSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Search (unless URLs are already known), seller pass and testing.
    Full,
    /// Search collection only; its URLs seed the next full batch.
    SearchOnly,
}

/// One rule list (OK or error conditions) with its enable switch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSelection {
    pub enabled: bool,
    pub rules: Vec<String>,
}

impl RuleSelection {
    pub fn enabled(rules: Vec<String>) -> Self {
        Self {
            enabled: true,
            rules,
        }
    }

    fn active_rules(&self) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        self.rules
            .iter()
            .map(|rule| rule.trim())
            .filter(|rule| !rule.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionForm {
    pub search: String,
    pub seller: String,
    /// Newline-separated product URLs typed by the user.
    pub manual_urls: String,
    pub scenario_id: Option<String>,
    pub ok_rules: RuleSelection,
    pub error_rules: RuleSelection,
    pub fresh_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rules {
    pub ok_conditions: Vec<String>,
    pub error_conditions: Vec<String>,
}

impl Rules {
    pub fn is_empty(&self) -> bool {
        self.ok_conditions.is_empty() && self.error_conditions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobMeta {
    pub scenario_id: Option<String>,
    pub search: String,
    pub seller: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    /// Full run over a known URL list; no search phase.
    Urls {
        urls: Vec<String>,
        rules: Rules,
        meta: JobMeta,
    },
    /// Full run that searches first.
    Search {
        search: String,
        seller: String,
        fresh_profile: bool,
        rules: Rules,
        meta: JobMeta,
    },
    SearchOnly {
        search: String,
        seller: String,
        fresh_profile: bool,
        meta: JobMeta,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    MissingSearch,
    NoRulesSelected,
    InvalidUrl(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::MissingSearch => write!(f, "search term is empty"),
            SubmitError::NoRulesSelected => write!(f, "no rules selected"),
            SubmitError::InvalidUrl(url) => write!(f, "invalid url {url}"),
        }
    }
}

/// Validates the form and picks the request kind. Nothing is sent on error.
pub fn build_request(
    form: &SubmissionForm,
    mode: PollMode,
    collected: &CollectedUrlSet,
) -> Result<JobRequest, SubmitError> {
    let search = form.search.trim().to_string();
    let seller = form.seller.trim().to_string();
    let meta = JobMeta {
        scenario_id: form.scenario_id.clone(),
        search: search.clone(),
        seller: seller.clone(),
    };

    if mode == PollMode::SearchOnly {
        if search.is_empty() {
            return Err(SubmitError::MissingSearch);
        }
        return Ok(JobRequest::SearchOnly {
            search,
            seller,
            fresh_profile: form.fresh_profile,
            meta,
        });
    }

    let urls = if collected.is_empty() {
        parse_urls(&form.manual_urls)?
    } else {
        collected.urls().to_vec()
    };
    if urls.is_empty() && search.is_empty() {
        return Err(SubmitError::MissingSearch);
    }

    let rules = Rules {
        ok_conditions: form.ok_rules.active_rules(),
        error_conditions: form.error_rules.active_rules(),
    };
    if (form.ok_rules.enabled || form.error_rules.enabled) && rules.is_empty() {
        return Err(SubmitError::NoRulesSelected);
    }

    if urls.is_empty() {
        Ok(JobRequest::Search {
            search,
            seller,
            fresh_profile: form.fresh_profile,
            rules,
            meta,
        })
    } else {
        Ok(JobRequest::Urls { urls, rules, meta })
    }
}

/// Trims lines, skips blanks and exact duplicates, rejects non-URLs.
pub fn parse_urls(raw: &str) -> Result<Vec<String>, SubmitError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if Url::parse(line).is_err() {
            return Err(SubmitError::InvalidUrl(line.to_string()));
        }
        if seen.insert(line) {
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_urls_trims_dedupes_and_validates() {
        let raw = " https://a.example/p/1 \n\nhttps://a.example/p/1\nhttps://b.example/\n";
        let urls = parse_urls(raw).unwrap();
        assert_eq!(urls, vec!["https://a.example/p/1", "https://b.example/"]);

        assert_eq!(
            parse_urls("https://a.example\nnot a url"),
            Err(SubmitError::InvalidUrl("not a url".to_string()))
        );
    }

    #[test]
    fn disabled_rule_lists_contribute_nothing() {
        let form = SubmissionForm {
            search: "kettle".into(),
            ok_rules: RuleSelection {
                enabled: false,
                rules: vec!["in stock".into()],
            },
            ..SubmissionForm::default()
        };
        let request = build_request(&form, PollMode::Full, &CollectedUrlSet::new()).unwrap();
        match request {
            JobRequest::Search { rules, .. } => assert!(rules.is_empty()),
            other => panic!("unexpected request {other:?}"),
        }
    }
}
