//! Evaluator: tests a compiled [`Specification`] against a [`Message`].

use crate::ast::{Expr, Lhs, RelOp, Rhs};
use crate::error::MatchError;
use crate::parser;
use heka_core::{FieldScalar, Message};
use regex::{Captures, Regex};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Compiled form of a matcher expression. Cheap
/// and safe to evaluate from multiple tasks concurrently — evaluation never
/// mutates the message and never panics, even on type mismatch.
#[derive(Debug, Clone)]
pub struct Specification {
    expr: Expr,
    source: String,
}

/// Regex captures surfaced from a `=~` comparison that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSet {
    pub pattern: String,
    pub named: HashMap<String, String>,
    pub positional: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub captures: Vec<CaptureSet>,
}

impl Specification {
    pub fn compile(source: &str) -> Result<Self, MatchError> {
        let expr = parser::parse(source)?;
        Ok(Specification {
            expr,
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Deterministic; worst case linear in the number of AST nodes.
    pub fn evaluate(&self, msg: &Message) -> MatchOutcome {
        let mut captures = Vec::new();
        let matched = eval_expr(&self.expr, msg, &mut captures);
        MatchOutcome { matched, captures }
    }
}

fn eval_expr(expr: &Expr, msg: &Message, captures: &mut Vec<CaptureSet>) -> bool {
    match expr {
        Expr::True => true,
        Expr::False => false,
        Expr::Or(items) => items.iter().any(|e| eval_expr(e, msg, captures)),
        Expr::And(items) => items.iter().all(|e| eval_expr(e, msg, captures)),
        Expr::Cmp(lhs, op, rhs) => eval_cmp(lhs, *op, rhs, msg, captures),
    }
}

fn resolve_lhs<'m>(lhs: &Lhs, msg: &'m Message) -> Option<FieldScalar<'m>> {
    match lhs {
        Lhs::Var(v) => Some(msg.var(*v)),
        Lhs::Field { name, i, j } => msg.field_element(name, *i, *j),
    }
}

fn eval_cmp(lhs: &Lhs, op: RelOp, rhs: &Rhs, msg: &Message, captures: &mut Vec<CaptureSet>) -> bool {
    // Absence of a field is a sentinel, not an error: it simply never matches.
    let Some(scalar) = resolve_lhs(lhs, msg) else {
        return false;
    };

    if matches!(op, RelOp::Match | RelOp::NotMatch) {
        let Rhs::Regex(re) = rhs else { return false };
        let text = match &scalar {
            FieldScalar::Str(s) => s.as_ref(),
            _ => return false,
        };
        let is_match = re.is_match(text);
        if is_match {
            if let Some(caps) = re.captures(text) {
                captures.push(capture_set(re, &caps));
            }
        }
        return if op == RelOp::Match { is_match } else { !is_match };
    }

    compare_ord(&scalar, rhs, op)
}

fn compare_ord(scalar: &FieldScalar, rhs: &Rhs, op: RelOp) -> bool {
    let ordering: Option<Ordering> = match (scalar, rhs) {
        (FieldScalar::Str(s), Rhs::Str(r)) => Some(s.as_ref().cmp(r.as_str())),
        (FieldScalar::Int(a), Rhs::Int(b)) => Some(a.cmp(b)),
        (FieldScalar::Int(a), Rhs::Float(b)) => (*a as f64).partial_cmp(b),
        (FieldScalar::Double(a), Rhs::Float(b)) => a.partial_cmp(b),
        (FieldScalar::Double(a), Rhs::Int(b)) => a.partial_cmp(&(*b as f64)),
        (FieldScalar::Bool(a), Rhs::Bool(b)) => Some(a.cmp(b)),
        (FieldScalar::Bytes(a), Rhs::Str(b)) => Some(a.as_ref().cmp(b.as_bytes())),
        // Any other pairing is a type mismatch: never errors, simply doesn't match.
        _ => None,
    };
    let Some(ordering) = ordering else { return false };
    match op {
        RelOp::Eq => ordering == Ordering::Equal,
        RelOp::Ne => ordering != Ordering::Equal,
        RelOp::Lt => ordering == Ordering::Less,
        RelOp::Le => ordering != Ordering::Greater,
        RelOp::Gt => ordering == Ordering::Greater,
        RelOp::Ge => ordering != Ordering::Less,
        RelOp::Match | RelOp::NotMatch => unreachable!("handled in eval_cmp"),
    }
}

fn capture_set(re: &Regex, caps: &Captures<'_>) -> CaptureSet {
    let mut named = HashMap::new();
    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            named.insert(name.to_string(), m.as_str().to_string());
        }
    }
    let positional = (1..caps.len())
        .map(|idx| caps.get(idx).map(|m| m.as_str().to_string()))
        .collect();
    CaptureSet {
        pattern: re.as_str().to_string(),
        named,
        positional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heka_core::{Field, Message};

    fn msg(type_: &str, severity: i32) -> Message {
        let mut m = Message::new(type_, "payload");
        m.severity = severity;
        m
    }

    #[test]
    fn type_and_severity_predicates() {
        let o1 = Specification::compile(r#"Type == "a""#).unwrap();
        let o2 = Specification::compile(r#"Severity < 4"#).unwrap();

        let m1 = msg("a", 7);
        let m2 = msg("b", 2);
        let m3 = msg("a", 1);

        assert!(o1.evaluate(&m1).matched);
        assert!(!o1.evaluate(&m2).matched);
        assert!(o1.evaluate(&m3).matched);

        assert!(!o2.evaluate(&m1).matched);
        assert!(o2.evaluate(&m2).matched);
        assert!(o2.evaluate(&m3).matched);
    }

    #[test]
    fn type_mismatch_never_panics_returns_false() {
        let spec = Specification::compile(r#"Payload == 1"#).unwrap();
        let m = msg("a", 1);
        assert!(!spec.evaluate(&m).matched);
    }

    #[test]
    fn regex_capture_is_exposed() {
        let spec = Specification::compile(r#"Payload =~ /id=(?P<id>\d+)/"#).unwrap();
        let mut m = msg("a", 1);
        m.payload = "req id=42 done".to_string();
        let outcome = spec.evaluate(&m);
        assert!(outcome.matched);
        assert_eq!(outcome.captures[0].named.get("id"), Some(&"42".to_string()));
    }

    #[test]
    fn field_indexing_matches() {
        let mut m = msg("a", 1);
        m.add_field(Field::strings("tag", vec!["x".into(), "y".into()]));
        let spec = Specification::compile(r#"Fields[tag][0][1] == "y""#).unwrap();
        assert!(spec.evaluate(&m).matched);
    }

    #[test]
    fn evaluation_does_not_mutate_message() {
        let spec = Specification::compile(r#"Type == "a""#).unwrap();
        let m = msg("a", 1);
        let before = m.clone();
        let _ = spec.evaluate(&m);
        assert_eq!(before, m);
    }

    #[test]
    fn short_circuits_and_deterministically() {
        let spec = Specification::compile(r#"FALSE && Type == "a""#).unwrap();
        let m = msg("a", 1);
        assert!(!spec.evaluate(&m).matched);
    }

    proptest::proptest! {
        // Evaluating a compiled specification never mutates the message and
        // always returns the same verdict for the same message.
        #[test]
        fn evaluate_is_deterministic_and_pure(
            type_ in "[a-zA-Z]{1,8}",
            severity in 0i32..8,
            payload in "[a-zA-Z0-9 ]{0,16}",
        ) {
            let spec = Specification::compile(r#"Type == "a" || Severity < 4"#).unwrap();
            let mut m = msg(&type_, severity);
            m.payload = payload;
            let before = m.clone();

            let first = spec.evaluate(&m);
            proptest::prop_assert_eq!(&m, &before);
            let second = spec.evaluate(&m);
            proptest::prop_assert_eq!(first, second);
            proptest::prop_assert_eq!(m, before);
        }
    }
}
