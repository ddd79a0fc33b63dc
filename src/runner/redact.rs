//! Secret elision for logs and reports
//!
//! Passwords, signatures and keys are replaced outright. Tokens are
//! truncated to a short prefix so consecutive log lines can still be
//! correlated.

use serde_json::Value;

/// Replacement text for elided values
pub const ELIDED: &str = "***";

/// Characters of a token kept when truncating
const TOKEN_PREFIX: usize = 8;

/// Field names whose values are always elided (compared lowercase, without `_`/`-`)
const SECRET_FIELDS: &[&str] = &[
    "password",
    "newpassword",
    "confirmpassword",
    "secret",
    "secretkey",
    "key1",
    "key2",
    "accesskey",
    "signature",
    "mac",
    "apikey",
];

/// Field names whose values are truncated
const TOKEN_FIELDS: &[&str] = &["token", "accesstoken", "refreshtoken", "authorization"];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Shorten a token to a recognisable prefix
pub fn truncate_token(token: &str) -> String {
    if token.chars().count() <= TOKEN_PREFIX {
        return ELIDED.to_string();
    }
    let prefix: String = token.chars().take(TOKEN_PREFIX).collect();
    format!("{}...", prefix)
}

/// Copy of `value` with secret fields elided, recursively
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_named(k, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        other => other.clone(),
    }
}

/// Redact a value stored under `name`, e.g. an extracted context value
pub fn redact_named(name: &str, value: &Value) -> Value {
    let name = normalize(name);
    if SECRET_FIELDS.contains(&name.as_str()) {
        return Value::String(ELIDED.to_string());
    }
    if TOKEN_FIELDS.contains(&name.as_str()) {
        if let Value::String(token) = value {
            return Value::String(truncate_token(token));
        }
    }
    redact_json(value)
}

/// Render a header value for logging
pub fn redact_header(name: &str, value: &str) -> String {
    let name = normalize(name);
    if name == "authorization" {
        return match value.split_once(' ') {
            Some((scheme, token)) => format!("{} {}", scheme, truncate_token(token)),
            None => truncate_token(value),
        };
    }
    if SECRET_FIELDS.contains(&name.as_str()) {
        return ELIDED.to_string();
    }
    value.to_string()
}

/// Copy of free text with secrets elided
///
/// Recognises `name=value`, `name: value` and `"name":"value"` for secret and
/// token field names, plus `Bearer <token>`.
pub fn redact_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(is_word_char) {
        let (before, from_word) = rest.split_at(start);
        out.push_str(before);
        let word_len = from_word.find(|c: char| !is_word_char(c)).unwrap_or(from_word.len());
        let (word, after) = from_word.split_at(word_len);
        out.push_str(word);
        rest = after;

        let name = normalize(word);
        let secret = SECRET_FIELDS.contains(&name.as_str());
        if !secret && name != "bearer" && !TOKEN_FIELDS.contains(&name.as_str()) {
            continue;
        }
        let Some(offset) = value_offset(rest, &name) else {
            continue;
        };
        out.push_str(&rest[..offset]);
        let value_part = &rest[offset..];
        let value_len = value_part.find(is_value_end).unwrap_or(value_part.len());
        let value = &value_part[..value_len];

        // `Authorization: Bearer x` is handled when the loop reaches `Bearer`
        if value.is_empty() || value.eq_ignore_ascii_case("bearer") {
            rest = value_part;
            continue;
        }
        if secret {
            out.push_str(ELIDED);
        } else {
            out.push_str(&truncate_token(value));
        }
        rest = &value_part[value_len..];
    }

    out.push_str(rest);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_value_end(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | ',' | '&' | ';' | '}' | ']' | ')')
}

/// Offset of the value following a secret name, if `rest` assigns one
fn value_offset(rest: &str, name: &str) -> Option<usize> {
    if name == "bearer" {
        let skipped = rest.len() - rest.trim_start().len();
        return (skipped > 0).then_some(skipped);
    }
    let quote_or_space = |c: char| c == '"' || c == '\'' || c == ' ';
    let after_name = rest.trim_start_matches(quote_or_space);
    let after_sep = after_name.strip_prefix(|c: char| c == '=' || c == ':')?;
    let value = after_sep.trim_start_matches(quote_or_space);
    Some(rest.len() - value.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_elided() {
        let body = json!({"email": "a@b.test", "password": "hunter2"});
        let redacted = redact_json(&body);
        assert_eq!(redacted["email"], "a@b.test");
        assert_eq!(redacted["password"], ELIDED);
    }

    #[test]
    fn test_nested_tokens_truncated() {
        let body = json!({"data": {"token": "eyJhbGciOiJIUzI1NiJ9.payload.sig", "user": {"id": 1}}});
        let redacted = redact_json(&body);
        assert_eq!(redacted["data"]["token"], "eyJhbGci...");
        assert_eq!(redacted["data"]["user"]["id"], 1);
    }

    #[test]
    fn test_field_name_variants() {
        let body = json!({"access_token": "abcdefghijkl", "Secret-Key": "s", "items": [{"signature": "x"}]});
        let redacted = redact_json(&body);
        assert_eq!(redacted["access_token"], "abcdefgh...");
        assert_eq!(redacted["Secret-Key"], ELIDED);
        assert_eq!(redacted["items"][0]["signature"], ELIDED);
    }

    #[test]
    fn test_named_scalar() {
        assert_eq!(redact_named("token", &json!("eyJhbGciOiJIUzI1NiJ9")), json!("eyJhbGci..."));
        assert_eq!(redact_named("bookingId", &json!("bk-1")), json!("bk-1"));
    }

    #[test]
    fn test_short_token_fully_elided() {
        assert_eq!(truncate_token("T1"), ELIDED);
    }

    #[test]
    fn test_authorization_header() {
        assert_eq!(redact_header("Authorization", "Bearer abcdefghijklmnop"), "Bearer abcdefgh...");
        assert_eq!(redact_header("Content-Type", "application/json"), "application/json");
    }

    #[test]
    fn test_text_assignments_elided() {
        assert_eq!(
            redact_text("bad request: password=hunter2&email=a@b.test"),
            "bad request: password=***&email=a@b.test"
        );
        assert_eq!(
            redact_text(r#"echo {"password":"hunter2","tourId":"t-1"}"#),
            r#"echo {"password":"***","tourId":"t-1"}"#
        );
    }

    #[test]
    fn test_text_bearer_truncated() {
        assert_eq!(
            redact_text("rejected Authorization: Bearer abcdefghijklmnop"),
            "rejected Authorization: Bearer abcdefgh..."
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "HTTP 404: Tour not found";
        assert_eq!(redact_text(text), text);
    }
}
