//! # Field-Name Matching
//!
//! Decides whether a JSON key refers to a schema field when the key is not spelled exactly
//! like the field. This is a recovery mechanism used by the weak decoder only: the codec
//! never renames fields when encoding.
//!
//! Two names match when they are equal ignoring case, or when they are equal ignoring case
//! after both are split into words and every word that is a well-known initialism
//! (`ID`, `URL`, `HTTP`, ...) is rewritten in its canonical casing. That lets `user_id`
//! match `UserID` and `http_status` match `HTTPStatus` without a mapping table.

/// Upper-case acronyms that are never split into separate words.
///
/// Kept sorted so lookups can binary search.
const INITIALISMS: [&str; 38] = [
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS", "TTL",
    "UDP", "UI", "UID", "URI", "URL", "UTF8", "UUID", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// Returns `true` if `word` (already upper-cased) is a known initialism.
pub fn is_initialism(word: &str) -> bool {
    INITIALISMS.binary_search(&word).is_ok()
}

/// Returns `true` if the JSON key `key` should populate the field called `field`.
pub fn matches(key: &str, field: &str) -> bool {
    eq_fold(key, field) || eq_fold(&canonicalize(key), &canonicalize(field))
}

/// Rewrites `name` word by word.
///
/// Words end at underscores (a run of underscores collapses, keeping exactly one when it
/// sits between two digits) and at every lower-case to non-lower-case transition. Initialisms
/// are upper-cased, or lower-cased when they lead a lower-case name; other all-lower-case
/// words after the first get an upper-case first letter.
pub fn canonicalize(name: &str) -> String {
    let mut runes: Vec<char> = name.chars().collect();
    let (mut start, mut i) = (0, 0);

    while i < runes.len() {
        let end_of_word = if i + 1 == runes.len() {
            true
        } else if runes[i + 1] == '_' {
            let mut run = 1;
            while i + run + 1 < runes.len() && runes[i + run + 1] == '_' {
                run += 1;
            }
            if i + run + 1 < runes.len()
                && runes[i].is_numeric()
                && runes[i + run + 1].is_numeric()
            {
                run -= 1;
            }
            runes.drain(i + 1..i + 1 + run);
            true
        } else {
            runes[i].is_lowercase() && !runes[i + 1].is_lowercase()
        };

        i += 1;
        if !end_of_word {
            continue;
        }

        let word: String = runes[start..i].iter().collect();
        let upper = word.to_uppercase();

        if is_initialism(&upper) && upper.chars().count() == i - start {
            let replacement = if start == 0 && runes[start].is_lowercase() {
                upper.to_lowercase()
            } else {
                upper
            };
            runes.splice(start..i, replacement.chars());
        } else if start > 0 && word.to_lowercase() == word {
            runes[start] = runes[start].to_uppercase().next().unwrap_or(runes[start]);
        }

        start = i;
    }

    runes.into_iter().collect()
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialism_table_is_sorted() {
        assert!(INITIALISMS.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn exact_and_case_insensitive_names_match() {
        assert!(matches("status", "status"));
        assert!(matches("Status", "status"));
        assert!(matches("id", "ID"));
    }

    #[test]
    fn initialisms_bridge_snake_and_camel_case() {
        assert!(matches("user_id", "UserID"));
        assert!(matches("http_status", "HTTPStatus"));
        assert!(matches("api_url", "ApiURL"));
        assert!(matches("outerString", "outer_string"));
    }

    #[test]
    fn different_words_do_not_match() {
        assert!(!matches("foo_bar", "FooBarBaz"));
        assert!(!matches("user_name", "UserID"));
    }

    #[test]
    fn underscore_between_digits_is_significant() {
        assert!(matches("a1__2", "A1_2"));
        assert!(!matches("a1_2", "a12"));
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonicalize("user_id"), "userID");
        assert_eq!(canonicalize("id_value"), "idValue");
        assert_eq!(canonicalize("http_status"), "httpStatus");
        assert_eq!(canonicalize("foo__bar"), "fooBar");
        assert_eq!(canonicalize("a1__2"), "a1_2");
        assert_eq!(canonicalize(""), "");
    }
}
