//! Compilation-unit assembly from the exercise fragments.
use std::collections::BTreeMap;

use solex_core::SourceBundle;

use crate::bootstrap::{ASSERT_FILE, ASSERT_SOURCE, ASSERT_UNIT};

pub const VALIDATION_UNIT: &str = "validation";
pub const SOLUTION_UNIT: &str = "solution";

/// Build the units for one verification.
///
/// The validation unit concatenates `context`, `solution`, and `validation`
/// under an injected assertion-library import, so test contracts can both
/// reference the solution's declarations and call `Assert`. A non-empty
/// solution also compiles as its own unit, giving the report per-fragment
/// artifacts. The library source itself always rides along — compile-only
/// mode has no deployed copy to fall back on.
pub fn build_units(bundle: &SourceBundle) -> BTreeMap<String, String> {
    let mut units = BTreeMap::new();
    units.insert(ASSERT_UNIT.to_string(), ASSERT_SOURCE.to_string());
    units.insert(VALIDATION_UNIT.to_string(), validation_unit(bundle));
    if !bundle.solution.is_empty() {
        units.insert(
            SOLUTION_UNIT.to_string(),
            compose(&[bundle.context.as_str(), bundle.solution.as_str()], false),
        );
    }
    units
}

fn validation_unit(bundle: &SourceBundle) -> String {
    compose(
        &[
            bundle.context.as_str(),
            bundle.solution.as_str(),
            bundle.validation.as_str(),
        ],
        true,
    )
}

fn compose(parts: &[&str], import_assert: bool) -> String {
    let mut source = String::new();
    if import_assert {
        source.push_str(&format!("import \"{ASSERT_FILE}\";\n"));
    }
    for part in parts {
        if !part.is_empty() {
            source.push_str(part);
            source.push('\n');
        }
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> SourceBundle {
        SourceBundle::from_blocks([
            ("context", "pragma solidity ^0.8.0;"),
            ("solution", "contract Coin { uint public supply = 1000; }"),
            ("validation", "contract TestCoin { }"),
        ])
    }

    #[test]
    fn test_units_always_carry_the_library() {
        let units = build_units(&SourceBundle::default());
        assert_eq!(units[ASSERT_UNIT], ASSERT_SOURCE);
        assert!(units.contains_key(VALIDATION_UNIT));
        assert!(!units.contains_key(SOLUTION_UNIT));
    }

    #[test]
    fn test_validation_unit_concatenates_in_order() {
        let units = build_units(&bundle());
        let validation = &units[VALIDATION_UNIT];
        assert!(validation.starts_with("import \"Assert.sol\";\n"));
        let context_at = validation.find("pragma solidity").unwrap();
        let solution_at = validation.find("contract Coin").unwrap();
        let validation_at = validation.find("contract TestCoin").unwrap();
        assert!(context_at < solution_at && solution_at < validation_at);
    }

    #[test]
    fn test_solution_unit_has_no_import() {
        let units = build_units(&bundle());
        let solution = &units[SOLUTION_UNIT];
        assert!(!solution.contains("import"));
        assert!(solution.contains("contract Coin"));
        assert!(solution.contains("pragma solidity"));
        assert!(!solution.contains("contract TestCoin"));
    }

    #[test]
    fn test_empty_fragments_leave_no_blank_sections() {
        let units = build_units(&SourceBundle::from_blocks([("validation", "contract T {}")]));
        assert_eq!(units[VALIDATION_UNIT], "import \"Assert.sol\";\ncontract T {}\n");
    }
}
