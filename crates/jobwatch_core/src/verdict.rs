use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verdict {
    Ok,
    Nok,
    Unknown,
    Error,
}

impl Verdict {
    /// Canonical order used for filters and export queries.
    pub const ALL: [Verdict; 4] = [Verdict::Ok, Verdict::Nok, Verdict::Unknown, Verdict::Error];

    /// Exact, case-sensitive match against the wire tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "ok" => Some(Verdict::Ok),
            "nok" => Some(Verdict::Nok),
            "unknown" => Some(Verdict::Unknown),
            "error" => Some(Verdict::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::Nok => "nok",
            Verdict::Unknown => "unknown",
            Verdict::Error => "error",
        }
    }

    /// Short badge shown next to a result row.
    pub fn badge(self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Nok => "NOK",
            Verdict::Unknown => "UNK",
            Verdict::Error => "ERR",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tested URL as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub url: String,
    pub verdict: Option<String>,
    pub verdict_reason: Option<String>,
}

impl ResultRecord {
    pub fn new(url: impl Into<String>, verdict: Option<&str>) -> Self {
        Self {
            url: url.into(),
            verdict: verdict.map(ToOwned::to_owned),
            verdict_reason: None,
        }
    }
}

/// Missing or unrecognised tags classify as [`Verdict::Unknown`].
pub fn classify(record: &ResultRecord) -> Verdict {
    record
        .verdict
        .as_deref()
        .and_then(Verdict::parse)
        .unwrap_or(Verdict::Unknown)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerdictTally {
    pub ok: usize,
    pub nok: usize,
    pub unknown: usize,
    pub error: usize,
}

impl VerdictTally {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.record(classify(record));
        }
        tally
    }

    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Ok => self.ok += 1,
            Verdict::Nok => self.nok += 1,
            Verdict::Unknown => self.unknown += 1,
            Verdict::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.nok + self.unknown + self.error
    }

    /// Everything that is neither OK nor NOK.
    pub fn other(&self) -> usize {
        self.unknown + self.error
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Total/OK/NOK/Other: {}/{}/{}/{}",
            self.total(),
            self.ok,
            self.nok,
            self.other()
        )
    }
}

/// Client-side verdict checkboxes. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictFilter {
    ok: bool,
    nok: bool,
    unknown: bool,
    error: bool,
}

impl Default for VerdictFilter {
    fn default() -> Self {
        Self {
            ok: true,
            nok: true,
            unknown: true,
            error: true,
        }
    }
}

impl VerdictFilter {
    pub fn none() -> Self {
        Self {
            ok: false,
            nok: false,
            unknown: false,
            error: false,
        }
    }

    pub fn allows(&self, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Ok => self.ok,
            Verdict::Nok => self.nok,
            Verdict::Unknown => self.unknown,
            Verdict::Error => self.error,
        }
    }

    pub fn set(&mut self, verdict: Verdict, enabled: bool) {
        match verdict {
            Verdict::Ok => self.ok = enabled,
            Verdict::Nok => self.nok = enabled,
            Verdict::Unknown => self.unknown = enabled,
            Verdict::Error => self.error = enabled,
        }
    }

    pub fn enabled(&self) -> Vec<Verdict> {
        Verdict::ALL
            .into_iter()
            .filter(|verdict| self.allows(*verdict))
            .collect()
    }

    /// Comma-joined export filter. `None` when every verdict is enabled or
    /// when none is (callers treat the latter as "no export").
    pub fn export_query(&self) -> Option<String> {
        let enabled = self.enabled();
        if enabled.is_empty() || enabled.len() == Verdict::ALL.len() {
            return None;
        }
        Some(
            enabled
                .iter()
                .map(|verdict| verdict.as_str())
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_absent_and_bogus_tags_as_unknown() {
        let records = vec![
            ResultRecord::new("a", Some("ok")),
            ResultRecord::new("b", None),
            ResultRecord::new("c", Some("bogus")),
        ];
        let tally = VerdictTally::from_records(&records);
        assert_eq!(
            tally,
            VerdictTally {
                ok: 1,
                nok: 0,
                unknown: 2,
                error: 0
            }
        );
        assert_eq!(tally.total(), records.len());
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert_eq!(classify(&ResultRecord::new("a", Some("OK"))), Verdict::Unknown);
        assert_eq!(classify(&ResultRecord::new("a", Some("nok"))), Verdict::Nok);
        assert_eq!(classify(&ResultRecord::new("a", Some("error"))), Verdict::Error);
    }

    #[test]
    fn tally_always_sums_to_record_count() {
        let tags = [Some("ok"), Some("nok"), Some("error"), Some("unknown"), None, Some("")];
        for len in 0..24 {
            let records: Vec<_> = (0..len)
                .map(|i| ResultRecord::new(format!("u{i}"), tags[(i * 7 + len) % tags.len()]))
                .collect();
            assert_eq!(VerdictTally::from_records(&records).total(), records.len());
        }
    }

    #[test]
    fn export_query_omitted_when_all_enabled() {
        let mut filter = VerdictFilter::default();
        assert_eq!(filter.export_query(), None);

        filter.set(Verdict::Unknown, false);
        assert_eq!(filter.export_query().as_deref(), Some("ok,nok,error"));

        let none = VerdictFilter::none();
        assert!(none.is_empty());
        assert_eq!(none.export_query(), None);
    }

    #[test]
    fn summary_line_folds_unknown_and_error_into_other() {
        let tally = VerdictTally {
            ok: 3,
            nok: 1,
            unknown: 2,
            error: 1,
        };
        assert_eq!(tally.summary_line(), "Total/OK/NOK/Other: 7/3/1/3");
    }
}
