//! Display-name helpers used wherever a record crosses the lead/customer boundary.
//!
//! All functions here are pure: no I/O, no clock, deterministic for a given input.

/// Joins the non-empty, trimmed name parts with a single space.
///
/// Returns an empty string when both parts are absent or blank.
pub fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(2);
    for part in [first, last] {
        if let Some(value) = part {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }
    parts.join(" ")
}

/// Splits a legacy display name on the first run of whitespace.
///
/// `"John Doe Jr."` becomes `("John", Some("Doe Jr."))`; a single token keeps
/// the whole string as the first name.
pub fn split_full_name(name: &str) -> (String, Option<String>) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), Some(rest.trim().to_string())),
        None => (trimmed.to_string(), None),
    }
}

/// A record carrying first/last name parts and a derived display name.
pub trait ContactName {
    fn first_name(&self) -> Option<&str>;
    fn last_name(&self) -> Option<&str>;
    fn display_name(&self) -> Option<&str>;
    fn set_display_name(&mut self, name: String);
}

/// Recomputes the display name from the parts when at least one part is present.
///
/// Records without any name part are left untouched.
pub fn ensure_name_field<R: ContactName>(record: &mut R) {
    let has_part = record
        .first_name()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
        || record
            .last_name()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
    if has_part {
        let name = full_name(record.first_name(), record.last_name());
        record.set_display_name(name);
    }
}

/// True when the stored display name matches the name parts.
///
/// Vacuously true when either part is missing.
pub fn is_name_consistent<R: ContactName>(record: &R) -> bool {
    let (first, last) = match (record.first_name(), record.last_name()) {
        (Some(f), Some(l)) => (f, l),
        _ => return true,
    };
    record.display_name().unwrap_or_default() == full_name(Some(first), Some(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Record {
        first: Option<String>,
        last: Option<String>,
        name: Option<String>,
    }

    impl ContactName for Record {
        fn first_name(&self) -> Option<&str> {
            self.first.as_deref()
        }
        fn last_name(&self) -> Option<&str> {
            self.last.as_deref()
        }
        fn display_name(&self) -> Option<&str> {
            self.name.as_deref()
        }
        fn set_display_name(&mut self, name: String) {
            self.name = Some(name);
        }
    }

    #[test]
    fn joins_trimmed_parts_with_single_space() {
        assert_eq!(full_name(Some("  Juan "), Some(" Pérez ")), "Juan Pérez");
        assert_eq!(full_name(Some("Cher"), None), "Cher");
        assert_eq!(full_name(None, Some("Pérez")), "Pérez");
        assert_eq!(full_name(Some("   "), Some("")), "");
    }

    #[test]
    fn both_absent_yields_empty_string() {
        assert_eq!(full_name(None, None), "");
    }

    #[test]
    fn split_then_join_round_trips() {
        for name in ["John Doe", "Ada Lovelace King", "Prince"] {
            let (first, last) = split_full_name(name);
            assert_eq!(full_name(Some(first.as_str()), last.as_deref()), name);
        }
    }

    #[test]
    fn ensure_name_field_overwrites_stale_names() {
        let mut record = Record {
            first: Some("Juan".into()),
            last: Some("Pérez".into()),
            name: Some("outdated".into()),
        };
        ensure_name_field(&mut record);
        assert_eq!(record.name.as_deref(), Some("Juan Pérez"));
    }

    #[test]
    fn ensure_name_field_leaves_nameless_records_alone() {
        let mut record = Record::default();
        ensure_name_field(&mut record);
        assert!(record.name.is_none());
    }

    #[test]
    fn consistency_matches_derived_name_exactly() {
        let mut record = Record {
            first: Some("Juan".into()),
            last: Some("Pérez".into()),
            name: Some("Juan Pérez".into()),
        };
        assert!(is_name_consistent(&record));
        record.name = Some("Juan Perez".into());
        assert!(!is_name_consistent(&record));
    }

    #[test]
    fn consistency_is_vacuous_without_both_parts() {
        let record = Record {
            first: Some("Juan".into()),
            last: None,
            name: Some("anything".into()),
        };
        assert!(is_name_consistent(&record));
    }
}
