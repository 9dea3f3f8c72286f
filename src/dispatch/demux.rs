//! Routes the entries of a batched response back to the pages that asked.

use crate::cache::{normalize, PageId};
use crate::remote::MultiMatch;

/// Pairs every page of `batch` with its response entry.
///
/// Entries are matched by reference. The positional entry is preferred so a
/// batch carrying several pages of the same key (after a whole-key retry)
/// still lines up; otherwise the first unused entry with the same reference
/// is taken. Pages without a matching entry get `None`.
pub fn assign(batch: &[PageId], matches: Vec<MultiMatch>) -> Vec<Option<MultiMatch>> {
    let references: Vec<Option<String>> = matches
        .iter()
        .map(|m| m.reference.as_deref().map(normalize))
        .collect();
    let mut slots: Vec<Option<MultiMatch>> = matches.into_iter().map(Some).collect();

    let mut assigned = Vec::with_capacity(batch.len());
    for (index, (key, _)) in batch.iter().enumerate() {
        let usable = |i: usize, slots: &[Option<MultiMatch>]| {
            slots[i].is_some() && references[i].as_deref() == Some(key.as_str())
        };

        let chosen = if index < slots.len() && usable(index, &slots) {
            Some(index)
        } else {
            (0..slots.len()).find(|&i| usable(i, &slots))
        };

        assigned.push(chosen.and_then(|i| slots[i].take()));
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reference: &str, hits: u64) -> MultiMatch {
        MultiMatch {
            reference: Some(reference.to_string()),
            hits,
            parts: Some(Vec::new()),
            ..Default::default()
        }
    }

    fn page(key: &str, start: u32) -> PageId {
        (key.to_string(), start)
    }

    #[test]
    fn test_assign_in_order() {
        let batch = vec![page("a", 0), page("b", 0)];
        let assigned = assign(&batch, vec![entry("a", 1), entry("b", 2)]);
        assert_eq!(assigned[0].as_ref().unwrap().hits, 1);
        assert_eq!(assigned[1].as_ref().unwrap().hits, 2);
    }

    #[test]
    fn test_assign_out_of_order() {
        let batch = vec![page("a", 0), page("b", 0)];
        let assigned = assign(&batch, vec![entry("b", 2), entry("a", 1)]);
        assert_eq!(assigned[0].as_ref().unwrap().hits, 1);
        assert_eq!(assigned[1].as_ref().unwrap().hits, 2);
    }

    #[test]
    fn test_assign_missing_reference() {
        let batch = vec![page("a", 0), page("b", 0)];
        let assigned = assign(&batch, vec![entry("a", 1)]);
        assert!(assigned[0].is_some());
        assert!(assigned[1].is_none());
    }

    #[test]
    fn test_assign_same_key_twice_uses_each_entry_once() {
        let batch = vec![page("a", 0), page("a", 1)];
        let assigned = assign(&batch, vec![entry("a", 10), entry("a", 20)]);
        assert_eq!(assigned[0].as_ref().unwrap().hits, 10);
        assert_eq!(assigned[1].as_ref().unwrap().hits, 20);
    }

    #[test]
    fn test_assign_normalizes_echoed_reference() {
        let batch = vec![page("lm317", 0)];
        let assigned = assign(&batch, vec![entry("LM-317", 3)]);
        assert_eq!(assigned[0].as_ref().unwrap().hits, 3);
    }
}
