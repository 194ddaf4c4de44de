//! Response Formatter (§4.6): builds the wire JSON for success and
//! failure replies, with a JSON-safety escape pass over every string
//! field (§8's testable property).

use serde_json::{json, Value};

use crate::error::PayError;

/// The `pay` command's success reply.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SuccessReply {
    pub payment_preimage: String,
    pub getroute_tries: u32,
    pub sendpay_tries: u32,
}

impl SuccessReply {
    pub fn to_json(&self) -> Value {
        json!({
            "payment_preimage": json_safe_string(&self.payment_preimage),
            "getroute_tries": self.getroute_tries,
            "sendpay_tries": self.sendpay_tries,
        })
    }
}

/// Builds the failure reply's wire envelope: `{code, message, data}`,
/// with every string under `data` passed through [`json_safe_string`].
pub fn failure_to_json(err: &PayError) -> Value {
    json!({
        "code": err.code(),
        "message": json_safe_string(&err.to_string()),
        "data": sanitize_strings(err.data()),
    })
}

/// Recursively runs [`json_safe_string`] over every string leaf of a
/// `serde_json::Value`, leaving numbers/bools/null/structure untouched.
fn sanitize_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(json_safe_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Escapes a string for safe embedding in JSON output: keeps only
/// printable ASCII/UTF-8 text, replaces control bytes with `?`, and
/// backslash-escapes any bare `"` or `\` rather than passing them
/// through unescaped (§8).
pub fn json_safe_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push('?'),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttemptCounters;

    #[test]
    fn success_reply_round_trips_preimage() {
        let reply = SuccessReply {
            payment_preimage: "11".repeat(32),
            getroute_tries: 1,
            sendpay_tries: 1,
        };
        let json = reply.to_json();
        assert_eq!(json["payment_preimage"], "11".repeat(32));
        assert_eq!(json["getroute_tries"], 1);
    }

    #[test]
    fn json_safe_string_escapes_quotes_and_backslashes() {
        assert_eq!(json_safe_string(r#"say "hi"\n"#), r#"say \"hi\"\\n"#);
    }

    #[test]
    fn json_safe_string_replaces_control_bytes() {
        let input = "before\x01\x07after";
        assert_eq!(json_safe_string(input), "before??after");
    }

    #[test]
    fn failure_payload_sanitizes_nested_strings() {
        let err = PayError::RouteNotFound {
            tries: AttemptCounters {
                getroute_tries: 3,
                sendpay_tries: 0,
            },
        };
        let json = failure_to_json(&err);
        assert_eq!(json["code"], "ROUTE_NOT_FOUND");
        assert_eq!(json["data"]["getroute_tries"], 3);
    }

    proptest::proptest! {
        /// §8: emitted strings contain only printable characters and
        /// never an unescaped `"` or `\`; embedding the result in a JSON
        /// string literal must therefore always parse.
        #[test]
        fn json_safe_string_is_always_embeddable(input in ".*") {
            let safe = json_safe_string(&input);

            prop_assert!(!safe.chars().any(|c| c.is_control()));

            let embedded = format!("\"{safe}\"");
            let parsed: serde_json::Result<Value> = serde_json::from_str(&embedded);
            prop_assert!(parsed.is_ok(), "not embeddable: {embedded:?}");
        }
    }
}
