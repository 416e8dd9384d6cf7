//! Shipped conformance cases, one module per protocol.

pub mod system_power;

use crate::ConformanceTest;

/// All test categories.
pub const CATEGORIES: &[&str] = &["base", "reset", "system_power"];

/// Look up a case by fully-qualified name (e.g. "base.protocol_version").
pub fn find(name: &str) -> Option<&'static ConformanceTest> {
    inventory::iter::<ConformanceTest>
        .into_iter()
        .find(|t| t.name == name)
}

/// Every registered case, sorted by name.
pub fn list_all() -> Vec<&'static ConformanceTest> {
    let mut all: Vec<_> = inventory::iter::<ConformanceTest>.into_iter().collect();
    all.sort_by_key(|t| t.name);
    all
}

/// Cases of one category, sorted by name.
pub fn list_category(category: &str) -> Vec<&'static ConformanceTest> {
    list_all()
        .into_iter()
        .filter(|t| t.name.split('.').next() == Some(category))
        .collect()
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn test_every_case_is_categorized() {
        let all = list_all();
        assert!(!all.is_empty());
        for case in &all {
            let (category, rest) = case.name.split_once('.').unwrap();
            assert!(CATEGORIES.contains(&category), "{}", case.name);
            assert!(!rest.is_empty());
            assert!(!case.description.is_empty(), "{} has no description", case.name);
        }
        let total: usize = CATEGORIES.iter().map(|c| list_category(c).len()).sum();
        assert_eq!(total, all.len());
    }

    #[test]
    fn test_find() {
        assert!(find("base.protocol_version").is_some());
        assert!(find("base.no_such_case").is_none());
        assert!(list_category("nope").is_empty());
    }
}
