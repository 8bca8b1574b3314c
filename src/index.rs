//! Prefix index builder.
//!
//! The backing store only answers exact-match and membership queries, so
//! "starts with" search is served by denormalizing every prefix of every
//! token onto the lead at write time. A search for term `t` then reduces to
//! a single membership probe for `normalize(t)` against the stored set.
//!
//! Everything here is pure: same input, same output set, no I/O. Staleness
//! is a correctness bug, so the only caller is the write path in
//! `db::leads`, which recomputes the set inside the same transaction as the
//! field change.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Longest prefix stored per token, in characters. Matches the cap the
/// original index was built with; longer user input is truncated to this
/// before the membership probe so it still hits.
pub const PREFIX_CAP: usize = 15;

/// Normalize a free-text field (name, company): NFKD fold, lowercase, keep
/// ASCII letters, digits and whitespace only. "José-María" → "josemaria"
/// minus the hyphen, i.e. "jose maria" stays two tokens only if the input
/// had whitespace.
pub fn normalize_text(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Normalize a phone field: digits only. "+1 (555) 010-2345" → "15550102345".
pub fn normalize_phone(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize an email field: lowercase only, `@` and `.` preserved.
/// Surrounding whitespace falls out at tokenization.
pub fn normalize_email(input: &str) -> String {
    input.to_lowercase()
}

/// Push every prefix of `token` (lengths 1..=cap) into `out`.
///
/// Prefixes ending in whitespace are skipped: the query side joins tokens
/// with single spaces and never produces a probe with a trailing space, so
/// those entries would be dead index rows.
fn expand_prefixes(token: &str, out: &mut HashSet<String>) {
    let mut prefix = String::new();
    for (i, c) in token.chars().enumerate() {
        if i >= PREFIX_CAP {
            break;
        }
        prefix.push(c);
        if !c.is_whitespace() {
            out.insert(prefix.clone());
        }
    }
}

/// Build the prefix set for one already-normalized value.
///
/// Splits on whitespace, expands each word, and also expands the
/// whitespace-joined full value so multi-word searches ("john doe") can hit
/// with a single membership probe. Empty input yields an empty set.
pub fn build_prefixes(normalized: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    for token in &tokens {
        expand_prefixes(token, &mut out);
    }
    if tokens.len() > 1 {
        expand_prefixes(&tokens.join(" "), &mut out);
    }
    out
}

/// The searchable text fields of a lead, as borrowed raw values. Missing
/// fields are `None` and contribute nothing — never an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadTextFields<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
}

/// Build the full denormalized prefix set for a lead: each name part, the
/// joined full name, company, email and phone, all normalized per-field and
/// deduplicated into one set.
pub fn lead_prefixes(fields: &LeadTextFields<'_>) -> HashSet<String> {
    let first = fields.first_name.unwrap_or("");
    let last = fields.last_name.unwrap_or("");

    let mut out = build_prefixes(&normalize_text(&format!("{} {}", first, last)));
    if let Some(company) = fields.company {
        out.extend(build_prefixes(&normalize_text(company)));
    }
    if let Some(email) = fields.email {
        out.extend(build_prefixes(&normalize_email(email)));
    }
    if let Some(phone) = fields.phone {
        out.extend(build_prefixes(&normalize_phone(phone)));
    }
    out
}

/// Normalize a user-typed search term into membership probes.
///
/// Field-sensitive, mirroring how the index was built: terms containing `@`
/// normalize as email, all-digit-ish terms as phone, everything else as free
/// text. Each probe is truncated to [`PREFIX_CAP`] characters because the
/// index never stores anything longer.
///
/// The store supports exactly one membership clause per query, so the first
/// probe drives the SQL query and any remaining probes are checked
/// client-side against each candidate's stored set. A single-word term
/// yields one probe; a multi-word term yields the first word (broad SQL
/// probe) followed by the whitespace-joined full term, which matches the
/// joined full-value prefixes the builder stores.
pub fn normalize_query(term: &str) -> Vec<String> {
    let normalized = if term.contains('@') {
        normalize_email(term)
    } else if !term.trim().is_empty()
        && term.chars().all(|c| !c.is_alphabetic())
        && term.chars().any(|c| c.is_ascii_digit())
    {
        normalize_phone(term)
    } else {
        normalize_text(term)
    };

    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let cap = |t: &str| t.chars().take(PREFIX_CAP).collect::<String>();

    match tokens.as_slice() {
        [] => Vec::new(),
        [only] => vec![cap(only)],
        [first, ..] => vec![cap(first), cap(&tokens.join(" "))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_missing_inputs_yield_empty_set() {
        assert!(build_prefixes("").is_empty());
        assert!(build_prefixes("   ").is_empty());
        assert!(lead_prefixes(&LeadTextFields::default()).is_empty());
    }

    #[test]
    fn test_john_doe_prefixes() {
        let set = build_prefixes(&normalize_text("John Doe"));
        for p in ["j", "jo", "joh", "john", "d", "do", "doe", "john d", "john doe"] {
            assert!(set.contains(p), "missing prefix {:?}", p);
        }
        // Prefixes only — never infixes or suffixes.
        assert!(!set.contains("ohn"));
        assert!(!set.contains("oe"));
        // No probe ever carries a trailing space, so none is indexed.
        assert!(!set.contains("john "));
    }

    #[test]
    fn test_contains_full_value_under_cap() {
        let set = build_prefixes(&normalize_text("Smith"));
        assert!(set.contains("smith"));
    }

    #[test]
    fn test_cap_truncates_long_tokens() {
        let long = "abcdefghijklmnopqrstuvwxyz"; // 26 chars
        let set = build_prefixes(long);
        assert!(set.contains("abcdefghijklmno")); // 15 chars
        assert!(!set.contains("abcdefghijklmnop")); // 16 chars
        assert_eq!(set.len(), PREFIX_CAP);
    }

    #[test]
    fn test_idempotent_rebuild() {
        let fields = LeadTextFields {
            first_name: Some("Maria"),
            last_name: Some("Garcia"),
            email: Some("Maria.Garcia@Example.com"),
            phone: Some("+1 (555) 010-2345"),
            company: Some("Acme Corp"),
        };
        assert_eq!(lead_prefixes(&fields), lead_prefixes(&fields));
    }

    #[test]
    fn test_phone_normalization_digits_only() {
        assert_eq!(normalize_phone("+1 (555) 010-2345"), "15550102345");
        let set = lead_prefixes(&LeadTextFields {
            phone: Some("+1 (555) 010-2345"),
            ..Default::default()
        });
        assert!(set.contains("1555"));
        assert!(!set.contains("+1"));
    }

    #[test]
    fn test_email_preserves_at_and_dot() {
        let set = lead_prefixes(&LeadTextFields {
            email: Some("John.Doe@Acme.com"),
            ..Default::default()
        });
        assert!(set.contains("john.doe@"));
        assert!(set.contains("john.doe@acme.c")); // capped at 15
        assert!(!set.contains("john.doe@acme.co")); // 16 > cap
    }

    #[test]
    fn test_accents_fold_to_ascii() {
        assert_eq!(normalize_text("José"), "jose");
        let set = build_prefixes(&normalize_text("José"));
        assert!(set.contains("jose"));
    }

    #[test]
    fn test_punctuation_stripped_from_text() {
        assert_eq!(normalize_text("O'Brien & Sons, Ltd."), "obrien  sons ltd");
        let set = build_prefixes(&normalize_text("O'Brien & Sons"));
        assert!(set.contains("obrien"));
        assert!(set.contains("sons"));
    }

    #[test]
    fn test_overlapping_fields_deduplicate() {
        let set = lead_prefixes(&LeadTextFields {
            first_name: Some("Acme"),
            company: Some("Acme"),
            ..Default::default()
        });
        assert_eq!(set.len(), 4); // a, ac, acm, acme — once each
    }

    #[test]
    fn test_normalize_query_single_token() {
        assert_eq!(normalize_query("Joh"), vec!["joh"]);
        assert_eq!(normalize_query(""), Vec::<String>::new());
    }

    #[test]
    fn test_normalize_query_multi_token() {
        let probes = normalize_query("John Do");
        assert_eq!(probes, vec!["john", "john do"]);
    }

    #[test]
    fn test_normalize_query_field_detection() {
        assert_eq!(normalize_query("(555) 010"), vec!["555010"]);
        assert_eq!(normalize_query("John.Doe@Acme.com"), vec!["john.doe@acme.c"]);
    }
}
