//! Parsing of identity assertions delivered by the federated-identity
//! service provider.
//!
//! The service provider authenticates the request before it reaches us and
//! forwards the remote user identifier and the released attributes as request
//! headers. Nothing here talks to the identity provider.

use std::collections::HashMap;

use regex::Regex;

use crate::data::student::StudentId;

lazy_static! {
    /// `terms-of-study` values look like `<course of study> $ <semester>`,
    /// e.g. `B.Sc. Physik $ 4`.
    static ref SEMESTER_OF_STUDY: Regex = Regex::new(r"\$ (\d+)").unwrap();
}

pub const TERMS_OF_STUDY: &str = "terms-of-study";

/// A verified identity: the remote user identifier plus released attributes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IdentityAssertion {
    pub remote_user: String,
    pub attributes: HashMap<String, String>,
}

impl IdentityAssertion {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Semester of study released with the assertion; 0 when unknown.
    pub fn semester_of_study(&self) -> u32 {
        parse_semester_of_study(self.attribute(TERMS_OF_STUDY))
    }
}

/// Extracts the semester of study from a `terms-of-study` attribute.
///
/// Grammar: the first occurrence of `$`, a single space and one or more
/// digits. Missing attributes, missing markers and numbers that don't fit
/// into a `u32` all yield 0.
pub fn parse_semester_of_study(terms_of_study: Option<&str>) -> u32 {
    terms_of_study
        .and_then(|it| SEMESTER_OF_STUDY.captures(it))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Turns remote user identifiers into local student ids.
#[derive(Debug, Clone)]
pub struct IdentifierCleaner {
    pattern: Option<Regex>,
}

impl IdentifierCleaner {
    /// With a provider `marker`, the relevant part of an identifier is
    /// everything after the marker up to the last `=`. Without one the whole
    /// identifier is used.
    pub fn new(marker: Option<&str>) -> IdentifierCleaner {
        let pattern = marker.map(|m| {
            Regex::new(&format!("{}(.*)=", regex::escape(m)))
                .expect("escaped marker must form a valid expression")
        });

        IdentifierCleaner { pattern }
    }

    /// Returns `None` if the identifier doesn't carry the marker or has no
    /// alphanumeric characters left after cleaning.
    pub fn clean(&self, remote_user: &str) -> Option<StudentId> {
        let relevant = match &self.pattern {
            Some(pattern) => pattern
                .captures_iter(remote_user)
                .last()
                .and_then(|c| c.get(1))?
                .as_str(),
            None => remote_user,
        };

        let cleaned: String = relevant.chars().filter(|c| c.is_alphanumeric()).collect();
        if cleaned.is_empty() {
            return None;
        }

        Some(StudentId::from(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semester_follows_dollar_sign() {
        assert_eq!(parse_semester_of_study(Some("B.Sc. $ 4")), 4);
        assert_eq!(parse_semester_of_study(Some("M.Sc. Physik $ 12")), 12);
        assert_eq!(parse_semester_of_study(Some("a $ 3;b $ 5")), 3);
    }

    #[test]
    fn semester_defaults_to_zero() {
        assert_eq!(parse_semester_of_study(None), 0);
        assert_eq!(parse_semester_of_study(Some("")), 0);
        assert_eq!(parse_semester_of_study(Some("B.Sc.")), 0);
        assert_eq!(parse_semester_of_study(Some("B.Sc. $ x")), 0);
        assert_eq!(parse_semester_of_study(Some("B.Sc. $ 99999999999")), 0);
    }

    #[test]
    fn assertion_reads_terms_of_study() {
        let mut assertion = IdentityAssertion {
            remote_user: "someone".to_string(),
            attributes: HashMap::new(),
        };
        assert_eq!(assertion.semester_of_study(), 0);

        assertion
            .attributes
            .insert(TERMS_OF_STUDY.to_string(), "B.Sc. $ 4".to_string());
        assert_eq!(assertion.semester_of_study(), 4);
    }

    #[test]
    fn cleaner_extracts_marked_part() {
        let cleaner = IdentifierCleaner::new(Some("de/shibboleth!"));
        let id = cleaner
            .clean("https://idp.uni-example.de/shibboleth!https://sp.example.org!Ab+c/1=")
            .expect("identifier has marker");
        assert_eq!(id.as_str(), "httpsspexampleorgAbc1");
    }

    #[test]
    fn cleaner_rejects_unmarked_or_empty() {
        let cleaner = IdentifierCleaner::new(Some("de/shibboleth!"));
        assert_eq!(cleaner.clean("student42"), None);
        assert_eq!(cleaner.clean("x.de/shibboleth!+/="), None);
    }

    #[test]
    fn cleaner_without_marker_keeps_alphanumerics() {
        let cleaner = IdentifierCleaner::new(None);
        assert_eq!(
            cleaner.clean("jane.doe@uni").map(|it| it.to_string()),
            Some("janedoeuni".to_string())
        );
    }
}
