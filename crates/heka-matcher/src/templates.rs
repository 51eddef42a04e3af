//! Fixed table of `%NAME%` template macros recognized inside regex literals.
//! Referencing an undefined template is a compile error.

use crate::error::MatchError;

const TEMPLATES: &[(&str, &str)] = &[
    ("TIMESTAMP", r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?"),
    ("DATE", r"\d{4}-\d{2}-\d{2}"),
    ("TIME", r"\d{2}:\d{2}:\d{2}"),
    ("IPV4", r"(?:\d{1,3}\.){3}\d{1,3}"),
    ("IPV6", r"(?:[0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4}"),
    ("HOSTNAME", r"[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*"),
    ("UUID", r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"),
    ("WORD", r"\w+"),
    ("INTEGER", r"-?\d+"),
];

fn lookup(name: &str) -> Option<&'static str> {
    TEMPLATES.iter().find(|(n, _)| *n == name).map(|(_, p)| *p)
}

/// Expand every `%NAME%` occurrence in `pattern` to its fixed-table replacement.
/// Fails closed: an unrecognized template name is a compile error, not a literal
/// passthrough.
pub fn expand(pattern: &str) -> Result<String, MatchError> {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                let expansion = lookup(name)
                    .ok_or_else(|| MatchError::UnknownTemplate(name.to_string()))?;
                out.push_str(expansion);
                rest = &after[end + 1..];
            }
            None => {
                // Lone '%' with no closing delimiter: treat as a literal character.
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_template() {
        let expanded = expand("^%DATE% error$").unwrap();
        assert!(expanded.contains(r"\d{4}-\d{2}-\d{2}"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(expand("%NOT_A_THING%").is_err());
    }

    #[test]
    fn leaves_plain_regex_untouched() {
        assert_eq!(expand(r"^foo\d+$").unwrap(), r"^foo\d+$");
    }
}
