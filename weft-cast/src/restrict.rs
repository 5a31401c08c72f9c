use std::collections::HashMap;

use regex::Regex;
use weft_core::{Error, Path, Restriction, Value};

use crate::coerce::string_form;

/// Checks coerced values against restrictions, compiling each pattern once.
#[derive(Debug, Default)]
pub(crate) struct RestrictionChecker {
    compiled: HashMap<String, Regex>,
}

impl RestrictionChecker {
    pub(crate) fn check(
        &mut self,
        restriction: &Restriction,
        value: &Value,
        path: &Path,
    ) -> Result<(), Error> {
        let satisfied = match restriction {
            Restriction::Regex { pattern } => {
                let regex = self.compile(pattern)?;
                string_form(value).is_some_and(|s| regex.is_match(&s))
            }
            // values that cannot be ordered against the bounds fail the range
            Restriction::Range(range) => range.contains(value).unwrap_or(false),
        };
        trace!(%restriction, %value, satisfied, "checked restriction");
        if satisfied {
            Ok(())
        } else {
            Err(Error::RestrictionViolation {
                value: value.to_string(),
                restriction: restriction.to_string(),
                path: path.clone(),
            })
        }
    }

    fn compile(&mut self, pattern: &str) -> Result<&Regex, Error> {
        if !self.compiled.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::Internal(format!("invalid restriction pattern {pattern:?}: {e}"))
            })?;
            self.compiled.insert(pattern.to_string(), regex);
        }
        self.compiled
            .get(pattern)
            .ok_or_else(|| Error::Internal(format!("pattern {pattern:?} vanished from cache")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_restriction() {
        weft_testhelpers::setup();

        let mut checker = RestrictionChecker::default();
        let restriction = Restriction::regex("^a+$");
        checker
            .check(&restriction, &Value::from("aaa"), &Path::new())
            .unwrap();
        let err = checker
            .check(&restriction, &Value::from("bbb"), &Path::new().field("name"))
            .unwrap_err();
        insta::assert_snapshot!(err, @r#"value "bbb" at name violates restriction "^a+$""#);
        assert_eq!(checker.compiled.len(), 1);
    }

    #[test]
    fn test_range_restriction() {
        weft_testhelpers::setup();

        let mut checker = RestrictionChecker::default();
        let restriction = Restriction::closed_range(0, 10);
        checker
            .check(&restriction, &Value::Int32(10), &Path::new())
            .unwrap();
        let err = checker
            .check(&restriction, &Value::Int32(11), &Path::new())
            .unwrap_err();
        insta::assert_snapshot!(err, @"value 11 at <root> violates restriction [0,10]");
    }

    #[test]
    fn test_invalid_pattern_is_internal() {
        weft_testhelpers::setup();

        let mut checker = RestrictionChecker::default();
        let err = checker
            .check(&Restriction::regex("(unclosed"), &Value::from("x"), &Path::new())
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
