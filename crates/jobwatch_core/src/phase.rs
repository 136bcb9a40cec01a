use crate::job::JobStatus;

/// Raw `phase` tag from the status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseTag {
    Search,
    Seller,
    Testing,
    #[default]
    Unset,
}

impl PhaseTag {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("search") => PhaseTag::Search,
            Some("seller") => PhaseTag::Seller,
            Some("testing") => PhaseTag::Testing,
            _ => PhaseTag::Unset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SearchCollecting,
    SellerPass,
    Testing,
    SearchComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSnapshot {
    pub phase: Phase,
    /// Set while tests are actively running.
    pub highlighted: bool,
    /// Items counted in the reported phase; only carried for explicit
    /// search/seller tags.
    pub count: Option<u64>,
}

impl PhaseSnapshot {
    pub fn label(&self) -> String {
        let suffix = self
            .count
            .map(|count| format!(" ({count})"))
            .unwrap_or_default();
        match self.phase {
            Phase::SearchCollecting => format!("Collecting search cards{suffix}"),
            Phase::SellerPass => format!("Seller pass{suffix}"),
            Phase::Testing => "Testing in progress".to_string(),
            Phase::SearchComplete => "Search collection complete".to_string(),
        }
    }
}

/// Derives the displayed phase from one snapshot.
///
/// The server may skip intermediate phases, so nothing from earlier polls is
/// consulted: the checks run in priority order on the latest fields only.
pub fn derive_phase(
    tag: PhaseTag,
    phase_count: Option<u64>,
    search_done: bool,
    status: &JobStatus,
) -> PhaseSnapshot {
    let (phase, highlighted, count) = match tag {
        PhaseTag::Testing => (Phase::Testing, true, None),
        PhaseTag::Seller => (Phase::SellerPass, false, phase_count),
        PhaseTag::Search => (Phase::SearchCollecting, false, phase_count),
        PhaseTag::Unset if search_done && *status == JobStatus::Running => {
            (Phase::Testing, true, None)
        }
        PhaseTag::Unset if search_done => (Phase::SearchComplete, false, None),
        PhaseTag::Unset => (Phase::SearchCollecting, false, None),
    };
    PhaseSnapshot {
        phase,
        highlighted,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_tags_take_priority_over_search_done() {
        let snap = derive_phase(PhaseTag::Seller, Some(4), true, &JobStatus::Running);
        assert_eq!(snap.phase, Phase::SellerPass);
        assert!(!snap.highlighted);
        assert_eq!(snap.label(), "Seller pass (4)");

        let snap = derive_phase(PhaseTag::Testing, Some(4), false, &JobStatus::Queued);
        assert_eq!(snap.phase, Phase::Testing);
        assert!(snap.highlighted);
        assert_eq!(snap.count, None);
    }

    #[test]
    fn missing_testing_tag_is_inferred_from_search_done() {
        let snap = derive_phase(PhaseTag::Unset, None, true, &JobStatus::Running);
        assert_eq!(snap.phase, Phase::Testing);
        assert!(snap.highlighted);

        let snap = derive_phase(PhaseTag::Unset, None, true, &JobStatus::Done);
        assert_eq!(snap.phase, Phase::SearchComplete);
        assert!(!snap.highlighted);
    }

    #[test]
    fn default_is_search_collecting() {
        let snap = derive_phase(
            PhaseTag::parse(Some("warmup")),
            Some(2),
            false,
            &JobStatus::Running,
        );
        assert_eq!(snap.phase, Phase::SearchCollecting);
        assert_eq!(snap.label(), "Collecting search cards");
    }

    #[test]
    fn derivation_ignores_history() {
        let statuses = [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Done,
            JobStatus::Stopped,
        ];
        let tags = [
            PhaseTag::Search,
            PhaseTag::Seller,
            PhaseTag::Testing,
            PhaseTag::Unset,
        ];
        for status in &statuses {
            for tag in tags {
                for search_done in [false, true] {
                    let first = derive_phase(tag, Some(1), search_done, status);
                    // Interleave an unrelated derivation, then repeat.
                    let _ = derive_phase(PhaseTag::Testing, None, true, &JobStatus::Running);
                    assert_eq!(first, derive_phase(tag, Some(1), search_done, status));
                }
            }
        }
    }
}
