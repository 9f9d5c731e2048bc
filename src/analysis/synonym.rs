//! Synonym groups used to expand query terms.

use ahash::AHashMap;

/// Groups of interchangeable terms.
///
/// A term may belong to several groups; its synonyms are the union of the
/// other members of all of them.
#[derive(Debug, Clone, Default)]
pub struct SynonymMap {
    groups: Vec<Vec<String>>,
    by_term: AHashMap<String, Vec<usize>>,
}

impl SynonymMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group of synonyms and return its id. Terms are lowercased.
    pub fn add_group<I, S>(&mut self, terms: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group_id = self.groups.len();
        let mut group: Vec<String> = terms.into_iter().map(|t| t.as_ref().to_lowercase()).collect();
        group.sort();
        group.dedup();

        for term in &group {
            self.by_term.entry(term.clone()).or_default().push(group_id);
        }
        self.groups.push(group);
        group_id
    }

    /// Synonyms of `term`, excluding the term itself, in sorted order.
    pub fn synonyms(&self, term: &str) -> Vec<&str> {
        let Some(group_ids) = self.by_term.get(term) else {
            return Vec::new();
        };

        let mut synonyms: Vec<&str> = group_ids
            .iter()
            .flat_map(|&id| self.groups[id].iter())
            .map(String::as_str)
            .filter(|&t| t != term)
            .collect();
        synonyms.sort_unstable();
        synonyms.dedup();
        synonyms
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group was added.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_groups() {
        let mut map = SynonymMap::new();
        assert_eq!(map.add_group(["car", "Auto"]), 0);
        assert_eq!(map.add_group(["car", "vehicle"]), 1);

        assert_eq!(map.synonyms("car"), vec!["auto", "vehicle"]);
        assert_eq!(map.synonyms("auto"), vec!["car"]);
        assert!(map.synonyms("bike").is_empty());
        assert_eq!(map.len(), 2);
    }
}
