use super::Field;
use serde_json::Value;

/// Fill a message template with field values
///
/// `{name}` and `{@name}` are replaced by the value of the field called `name`:
/// strings are inserted verbatim, everything else as compact JSON. Placeholders
/// without a matching field are left untouched.
///
/// ```rust
/// use rust_database_logger::logging::render_template;
/// use serde_json::json;
///
/// let message = render_template(
///     "SQL: {sql}, Parameters: {@params}",
///     &[("sql", json!("SELECT 1")), ("params", json!({"Id": 1}))],
/// );
/// assert_eq!(message, r#"SQL: SELECT 1, Parameters: {"Id":1}"#);
/// ```
pub fn render_template(template: &str, fields: &[Field]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        let key = name.strip_prefix('@').unwrap_or(name);
        match fields.iter().find(|(field, _)| *field == key) {
            Some((_, value)) => push_value(&mut out, value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_fields() {
        let fields = [("rows", json!(2))];
        assert_eq!(render_template("Affected {rows} rows", &fields), "Affected 2 rows");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(render_template("{missing} here", &[]), "{missing} here");
        assert_eq!(render_template("unterminated {brace", &[]), "unterminated {brace");
    }

    #[test]
    fn test_render_structured_value() {
        let fields = [("result", json!(null))];
        assert_eq!(
            render_template("Scalar result: {@result}", &fields),
            "Scalar result: null"
        );
    }
}
