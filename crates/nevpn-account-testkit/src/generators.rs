//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// Generate a lowercase email address.
pub fn email() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9._]{0,15}", "[a-z][a-z0-9]{0,11}", "[a-z]{2,4}")
        .prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
}

/// Generate an email with random letter case and surrounding whitespace.
///
/// Normalizes to the lowercase `email` it was derived from, returned second.
pub fn mixed_case_email() -> impl Strategy<Value = (String, String)> {
    (email(), any::<u64>(), " {0,2}", " {0,2}").prop_map(|(base, mask, lead, trail)| {
        let mixed: String = base
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if mask & (1 << (i % 64)) != 0 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();
        (format!("{}{}{}", lead, mixed, trail), base)
    })
}

/// Generate a password. Any string is a valid password.
pub fn password() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,32}".prop_map(String::from),
        any::<String>(),
    ]
}

/// Generate an article or contact identifier.
pub fn identifier() -> impl Strategy<Value = String> {
    "(art|contact)-[0-9]{1,4}".prop_map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nevpn_account_core::{digest, Email, UniqueList};

    proptest! {
        #[test]
        fn mixed_case_email_normalizes_to_base((raw, base) in mixed_case_email()) {
            let parsed = Email::parse(&raw).unwrap();
            prop_assert_eq!(parsed.as_str(), base.as_str());
        }

        #[test]
        fn digest_is_deterministic(p in password()) {
            prop_assert_eq!(digest(&p), digest(&p));
        }

        #[test]
        fn distinct_passwords_have_distinct_digests(a in password(), b in password()) {
            prop_assume!(a != b);
            prop_assert_ne!(digest(&a), digest(&b));
        }

        #[test]
        fn unique_list_keeps_first_occurrence_order(ids in prop::collection::vec(identifier(), 0..30)) {
            let list: UniqueList = ids.iter().cloned().collect();
            let mut expected: Vec<String> = Vec::new();
            for id in &ids {
                if !expected.contains(id) {
                    expected.push(id.clone());
                }
            }
            prop_assert_eq!(list.to_vec(), expected);
        }
    }
}
