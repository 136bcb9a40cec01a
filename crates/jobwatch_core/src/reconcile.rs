use std::collections::HashSet;

use crate::job::JobSnapshot;
use crate::verdict::{classify, Verdict, VerdictFilter, VerdictTally};

/// First-seen-ordered union of every URL observed once search collection has
/// finished. Reused as the input list of a follow-up full batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectedUrlSet {
    urls: Vec<String>,
    seen: HashSet<String>,
    frozen: bool,
}

impl CollectedUrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends unseen URLs (exact string match) and returns how many were new.
    /// A frozen set is left untouched.
    pub fn absorb<'a, I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.frozen {
            return 0;
        }
        let before = self.urls.len();
        for url in urls {
            if self.seen.insert(url.to_string()) {
                self.urls.push(url.to_string());
            }
        }
        self.urls.len() - before
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.seen.clear();
        self.frozen = false;
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub url: String,
    pub verdict: Verdict,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciled {
    pub pending: Vec<String>,
    /// Results that pass the verdict filter, in server order.
    pub visible: Vec<ResultRow>,
    /// Counted over every result, independent of the filter.
    pub tally: VerdictTally,
}

/// Replaces pending and result lists wholesale from the latest snapshot.
pub fn reconcile(snapshot: &JobSnapshot, filter: &VerdictFilter) -> Reconciled {
    let visible = snapshot
        .results
        .iter()
        .filter_map(|record| {
            let verdict = classify(record);
            filter.allows(verdict).then(|| ResultRow {
                url: record.url.clone(),
                verdict,
                reason: record.verdict_reason.clone(),
            })
        })
        .collect();

    Reconciled {
        pending: snapshot.pending_urls.clone(),
        visible,
        tally: VerdictTally::from_records(&snapshot.results),
    }
}

/// Unions pending then result URLs into `collected` once search is done.
pub fn collect_urls(snapshot: &JobSnapshot, collected: &mut CollectedUrlSet) -> usize {
    if !snapshot.search_done {
        return 0;
    }
    let pending = snapshot.pending_urls.iter().map(String::as_str);
    let resulted = snapshot.results.iter().map(|record| record.url.as_str());
    collected.absorb(pending.chain(resulted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::ResultRecord;

    fn snapshot(
        pending: &[&str],
        results: &[(&str, Option<&str>)],
        search_done: bool,
    ) -> JobSnapshot {
        JobSnapshot {
            pending_urls: pending.iter().map(|u| u.to_string()).collect(),
            results: results
                .iter()
                .map(|(url, verdict)| ResultRecord::new(*url, *verdict))
                .collect(),
            search_done,
            ..JobSnapshot::default()
        }
    }

    #[test]
    fn filter_hides_rows_but_not_counts() {
        let snap = snapshot(
            &["p1"],
            &[("a", Some("ok")), ("b", Some("nok")), ("c", None)],
            false,
        );
        let mut filter = VerdictFilter::default();
        filter.set(Verdict::Ok, false);

        let out = reconcile(&snap, &filter);
        assert_eq!(out.pending, vec!["p1".to_string()]);
        assert_eq!(
            out.visible.iter().map(|r| r.url.as_str()).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert_eq!(out.tally.total(), 3);
        assert_eq!(out.tally.ok, 1);
    }

    #[test]
    fn all_filters_disabled_shows_nothing() {
        let snap = snapshot(&[], &[("a", Some("ok")), ("b", Some("error"))], false);
        let out = reconcile(&snap, &VerdictFilter::none());
        assert!(out.visible.is_empty());
        assert_eq!(out.tally.total(), 2);
    }

    #[test]
    fn collection_waits_for_search_done() {
        let mut set = CollectedUrlSet::new();
        assert_eq!(collect_urls(&snapshot(&["a"], &[], false), &mut set), 0);
        assert!(set.is_empty());

        assert_eq!(collect_urls(&snapshot(&["a", "b"], &[("c", None)], true), &mut set), 3);
        assert_eq!(set.urls(), ["a", "b", "c"]);
    }

    #[test]
    fn collection_dedupes_across_polls_in_first_seen_order() {
        let mut set = CollectedUrlSet::new();
        collect_urls(&snapshot(&["b", "a", "b"], &[("c", None)], true), &mut set);
        collect_urls(&snapshot(&["d"], &[("a", Some("ok")), ("b", None)], true), &mut set);
        collect_urls(&snapshot(&[], &[("A", None), ("d", None)], true), &mut set);
        assert_eq!(set.urls(), ["b", "a", "c", "d", "A"]);

        let unique: HashSet<_> = set.urls().iter().collect();
        assert_eq!(unique.len(), set.len());
    }

    #[test]
    fn frozen_set_ignores_new_urls_until_cleared() {
        let mut set = CollectedUrlSet::new();
        set.absorb(["a"]);
        set.freeze();
        assert_eq!(set.absorb(["b"]), 0);
        assert_eq!(set.urls(), ["a"]);

        set.clear();
        assert!(!set.is_frozen());
        assert_eq!(set.absorb(["b"]), 1);
    }
}
