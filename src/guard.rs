//! Detection and masking of personal data in user input.
//!
//! [`Guard::detect`] fails closed: if validation errors for any reason, the
//! text is treated as sensitive.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from the PII guard.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Sensitive data detected: {}", .entities.join(", "))]
    SensitiveData { entities: Vec<String> },

    #[error("Unknown PII entity type: {0}")]
    UnknownEntity(String),

    #[error("Invalid detector pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Screens text for personal data.
pub trait Guard: Send + Sync {
    /// `Ok` when no configured entity is present.
    fn validate(&self, text: &str) -> GuardResult<()>;

    /// Replace every detected span with its `<ENTITY_TYPE>` placeholder.
    fn mask(&self, text: &str) -> GuardResult<String>;

    /// Whether the text must be treated as sensitive.
    fn detect(&self, text: &str) -> bool {
        match self.validate(text) {
            Ok(()) => false,
            Err(GuardError::SensitiveData { entities }) => {
                tracing::debug!(target: "guard", "detected {}", entities.join(", "));
                true
            }
            Err(e) => {
                tracing::warn!(target: "guard", "validation failed, treating as sensitive: {e}");
                true
            }
        }
    }
}

/// Kinds of personal data the guard recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiEntity {
    EmailAddress,
    PhoneNumber,
}

impl PiiEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::PhoneNumber => "PHONE_NUMBER",
        }
    }

    /// Placeholder substituted for a masked span.
    pub fn placeholder(&self) -> String {
        format!("<{}>", self.as_str())
    }
}

impl fmt::Display for PiiEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PiiEntity {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL_ADDRESS" => Ok(Self::EmailAddress),
            "PHONE_NUMBER" => Ok(Self::PhoneNumber),
            other => Err(GuardError::UnknownEntity(other.to_string())),
        }
    }
}

/// A detected span, as byte offsets into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiiSpan {
    pub entity: PiiEntity,
    pub start: usize,
    pub end: usize,
}

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}";
const PHONE_PATTERN: &str = r"\+?\(?\d[\d\s().-]{5,}\d";
const ISO_DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

struct Detector {
    entity: PiiEntity,
    pattern: Regex,
}

/// Regex-backed guard for e-mail addresses and phone numbers.
pub struct PiiGuard {
    detectors: Vec<Detector>,
    iso_date: Regex,
}

impl PiiGuard {
    /// Build a guard for the named entity types.
    pub fn new<S: AsRef<str>>(entities: &[S]) -> GuardResult<Self> {
        let mut detectors = Vec::with_capacity(entities.len());
        for name in entities {
            let entity: PiiEntity = name.as_ref().parse()?;
            if detectors.iter().any(|d: &Detector| d.entity == entity) {
                continue;
            }
            let pattern = match entity {
                PiiEntity::EmailAddress => Regex::new(EMAIL_PATTERN)?,
                PiiEntity::PhoneNumber => Regex::new(PHONE_PATTERN)?,
            };
            detectors.push(Detector { entity, pattern });
        }

        tracing::debug!(
            target: "guard",
            "guarding {}",
            detectors
                .iter()
                .map(|d| d.entity.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            detectors,
            iso_date: Regex::new(ISO_DATE_PATTERN)?,
        })
    }

    /// Guard for every supported entity type.
    pub fn with_defaults() -> GuardResult<Self> {
        Self::new(&["EMAIL_ADDRESS", "PHONE_NUMBER"])
    }

    /// All detected spans, ordered by start, non-overlapping.
    pub fn find(&self, text: &str) -> Vec<PiiSpan> {
        let mut spans: Vec<PiiSpan> = self
            .detectors
            .iter()
            .flat_map(|detector| {
                detector
                    .pattern
                    .find_iter(text)
                    .filter(|m| self.accepts(detector.entity, m.as_str()))
                    .map(|m| PiiSpan {
                        entity: detector.entity,
                        start: m.start(),
                        end: m.end(),
                    })
            })
            .collect();

        spans.sort_by_key(|span| (span.start, std::cmp::Reverse(span.end)));

        let mut merged: Vec<PiiSpan> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last() {
                Some(last) if span.start < last.end => {}
                _ => merged.push(span),
            }
        }
        merged
    }

    fn accepts(&self, entity: PiiEntity, candidate: &str) -> bool {
        match entity {
            PiiEntity::EmailAddress => true,
            PiiEntity::PhoneNumber => {
                let digits = candidate.chars().filter(char::is_ascii_digit).count();
                (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
                    && !self.iso_date.is_match(candidate.trim())
            }
        }
    }
}

impl Guard for PiiGuard {
    fn validate(&self, text: &str) -> GuardResult<()> {
        let spans = self.find(text);
        if spans.is_empty() {
            return Ok(());
        }

        let mut entities: Vec<String> = Vec::new();
        for span in spans {
            let name = span.entity.as_str().to_string();
            if !entities.contains(&name) {
                entities.push(name);
            }
        }
        Err(GuardError::SensitiveData { entities })
    }

    fn mask(&self, text: &str) -> GuardResult<String> {
        let mut masked = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in self.find(text) {
            masked.push_str(&text[cursor..span.start]);
            masked.push_str(&span.entity.placeholder());
            cursor = span.end;
        }
        masked.push_str(&text[cursor..]);
        Ok(masked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PiiGuard {
        PiiGuard::with_defaults().unwrap()
    }

    #[test]
    fn test_detects_email() {
        let guard = guard();
        assert!(guard.detect("My email is test@example.com"));
        assert_eq!(
            guard.mask("My email is test@example.com").unwrap(),
            "My email is <EMAIL_ADDRESS>"
        );
    }

    #[test]
    fn test_detects_phone_numbers() {
        let guard = guard();
        for text in [
            "Call me at +1 (555) 123-4567",
            "my number is 555-123-4567",
            "reach me on 9876543210 tomorrow",
            "+44 20 7946 0958",
        ] {
            assert!(guard.detect(text), "expected phone in {text:?}");
        }
        assert_eq!(
            guard.mask("Call 555-123-4567 now").unwrap(),
            "Call <PHONE_NUMBER> now"
        );
    }

    #[test]
    fn test_clean_text_passes() {
        let guard = guard();
        for text in [
            "What is EduTrack used for?",
            "We have 1200 students across 3 campuses",
            "The release was on 2024-05-01",
            "Version 2.5.1 added dashboards",
        ] {
            assert!(guard.validate(text).is_ok(), "false positive in {text:?}");
            assert_eq!(guard.mask(text).unwrap(), text);
        }
    }

    #[test]
    fn test_masks_multiple_entities() {
        let guard = guard();
        let masked = guard
            .mask("mail a.b@uni.edu.au or phone 020 7946 0958, thanks")
            .unwrap();
        assert_eq!(masked, "mail <EMAIL_ADDRESS> or phone <PHONE_NUMBER>, thanks");
    }

    #[test]
    fn test_validate_reports_entity_names() {
        let err = guard()
            .validate("x@y.io and 555-123-4567 and z@w.io")
            .unwrap_err();
        match err {
            GuardError::SensitiveData { entities } => {
                assert_eq!(entities, vec!["EMAIL_ADDRESS", "PHONE_NUMBER"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_only_configured_entities_are_detected() {
        let guard = PiiGuard::new(&["EMAIL_ADDRESS"]).unwrap();
        assert!(!guard.detect("555-123-4567"));
        assert!(guard.detect("me@example.org"));
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        assert!(matches!(
            PiiGuard::new(&["CREDIT_CARD"]),
            Err(GuardError::UnknownEntity(name)) if name == "CREDIT_CARD"
        ));
    }

    struct BrokenGuard;

    impl Guard for BrokenGuard {
        fn validate(&self, _text: &str) -> GuardResult<()> {
            Err(GuardError::UnknownEntity("broken".to_string()))
        }

        fn mask(&self, text: &str) -> GuardResult<String> {
            Ok(text.to_string())
        }
    }

    #[test]
    fn test_detect_fails_closed() {
        assert!(BrokenGuard.detect("harmless text"));
    }
}
