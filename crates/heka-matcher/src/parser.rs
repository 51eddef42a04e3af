//! Recursive-descent parser for the matcher DSL, built on `nom`.
//!
//! ```text
//! expr    := or
//! or      := and ("||" and)*
//! and     := cmp ("&&" cmp)*
//! cmp     := "(" expr ")" | "TRUE" | "FALSE" | lhs relop rhs
//! relop   := "==" | "!=" | "<" | "<=" | ">" | ">=" | "=~" | "!~"
//! lhs     := var | "Fields[" name ("[" int "]" ("[" int "]")?)? "]"
//! rhs     := string | number | "TRUE" | "FALSE" | regex
//! ```

use crate::ast::{Expr, Lhs, RelOp, Rhs};
use crate::error::MatchError;
use crate::templates;
use heka_core::Var;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{anychar, char, digit1, multispace0, none_of};
use nom::combinator::{map, map_res, opt, value};
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded};
use nom::Err as NomErr;
use regex::Regex;

#[derive(Debug)]
pub struct PErr<'a> {
    pub input: &'a str,
    pub kind: PErrKind,
}

#[derive(Debug)]
pub enum PErrKind {
    Nom(nom::error::ErrorKind),
    Match(MatchError),
}

impl<'a> nom::error::ParseError<&'a str> for PErr<'a> {
    fn from_error_kind(input: &'a str, kind: nom::error::ErrorKind) -> Self {
        PErr {
            input,
            kind: PErrKind::Nom(kind),
        }
    }
    fn append(_input: &'a str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> nom::error::FromExternalError<&'a str, MatchError> for PErr<'a> {
    fn from_external_error(input: &'a str, _kind: nom::error::ErrorKind, e: MatchError) -> Self {
        PErr {
            input,
            kind: PErrKind::Match(e),
        }
    }
}

type PResult<'a, O> = nom::IResult<&'a str, O, PErr<'a>>;

fn tok<'a, O, F>(mut f: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    move |input: &'a str| {
        let (input, _) = multispace0::<&str, PErr>(input)?;
        f(input)
    }
}

fn ident(input: &str) -> PResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn int_literal(input: &str) -> PResult<i64> {
    map_res(
        nom::combinator::recognize(pair(opt(char('-')), digit1)),
        |s: &str| s.parse::<i64>(),
    )(input)
}

fn double_quoted(input: &str) -> PResult<String> {
    delimited(
        char('"'),
        fold_many0(
            alt((
                map(preceded(char('\\'), anychar), |c| c.to_string()),
                map(none_of("\"\\"), |c: char| c.to_string()),
            )),
            String::new,
            |mut acc, s| {
                acc.push_str(&s);
                acc
            },
        ),
        char('"'),
    )(input)
}

fn single_quoted(input: &str) -> PResult<String> {
    delimited(
        char('\''),
        fold_many0(
            alt((
                map(preceded(char('\\'), anychar), |c| c.to_string()),
                map(none_of("'\\"), |c: char| c.to_string()),
            )),
            String::new,
            |mut acc, s| {
                acc.push_str(&s);
                acc
            },
        ),
        char('\''),
    )(input)
}

fn string_literal(input: &str) -> PResult<String> {
    alt((double_quoted, single_quoted))(input)
}

fn regex_literal(input: &str) -> PResult<String> {
    delimited(
        char('/'),
        fold_many0(
            alt((
                map(preceded(char('\\'), anychar), |c| {
                    if c == '/' {
                        "/".to_string()
                    } else {
                        format!("\\{c}")
                    }
                }),
                map(none_of("/\\"), |c: char| c.to_string()),
            )),
            String::new,
            |mut acc, s| {
                acc.push_str(&s);
                acc
            },
        ),
        char('/'),
    )(input)
}

fn number(input: &str) -> PResult<Rhs> {
    let (rest, sign) = opt(char('-'))(input)?;
    let (rest, int_part) = digit1(rest)?;
    if let Ok((rest2, _)) = char::<&str, PErr>('.')(rest) {
        if let Ok((rest3, frac_part)) = digit1::<&str, PErr>(rest2) {
            let s = format!(
                "{}{}.{}",
                if sign.is_some() { "-" } else { "" },
                int_part,
                frac_part
            );
            let v: f64 = s.parse().expect("validated digits parse as f64");
            return Ok((rest3, Rhs::Float(v)));
        }
    }
    let s = format!("{}{}", if sign.is_some() { "-" } else { "" }, int_part);
    let v: i64 = s.parse().expect("validated digits parse as i64");
    Ok((rest, Rhs::Int(v)))
}

fn compile_regex(pattern: String) -> Result<Rhs, MatchError> {
    let expanded = templates::expand(&pattern)?;
    let re = Regex::new(&expanded).map_err(MatchError::InvalidRegex)?;
    Ok(Rhs::Regex(Box::new(re)))
}

fn rhs(input: &str) -> PResult<Rhs> {
    alt((
        map(string_literal, Rhs::Str),
        value(Rhs::Bool(true), tag("TRUE")),
        value(Rhs::Bool(false), tag("FALSE")),
        number,
        map_res(regex_literal, compile_regex),
    ))(input)
}

fn relop(input: &str) -> PResult<RelOp> {
    alt((
        value(RelOp::Eq, tag("==")),
        value(RelOp::Ne, tag("!=")),
        value(RelOp::Le, tag("<=")),
        value(RelOp::Ge, tag(">=")),
        value(RelOp::Match, tag("=~")),
        value(RelOp::NotMatch, tag("!~")),
        value(RelOp::Lt, tag("<")),
        value(RelOp::Gt, tag(">")),
    ))(input)
}

fn field_name(input: &str) -> PResult<String> {
    alt((
        string_literal,
        map(take_while1(|c: char| c != ']' && c != '['), |s: &str| {
            s.to_string()
        }),
    ))(input)
}

fn fields_lhs(input: &str) -> PResult<Lhs> {
    let (input, _) = char('[')(input)?;
    let (input, name) = field_name(input)?;
    let (input, _) = char(']')(input)?;
    let (input, idx1) = opt(delimited(char('['), int_literal, char(']')))(input)?;
    let (input, idx2) = if idx1.is_some() {
        opt(delimited(char('['), int_literal, char(']')))(input)?
    } else {
        (input, None)
    };
    Ok((
        input,
        Lhs::Field {
            name,
            i: idx1.unwrap_or(0) as usize,
            j: idx2.unwrap_or(0) as usize,
        },
    ))
}

fn lhs(input: &str) -> PResult<Lhs> {
    let (input, head) = ident(input)?;
    match head {
        "Fields" => fields_lhs(input),
        "Uuid" => Ok((input, Lhs::Var(Var::Uuid))),
        "Type" => Ok((input, Lhs::Var(Var::Type))),
        "Logger" => Ok((input, Lhs::Var(Var::Logger))),
        "Payload" => Ok((input, Lhs::Var(Var::Payload))),
        "EnvVersion" => Ok((input, Lhs::Var(Var::EnvVersion))),
        "Hostname" => Ok((input, Lhs::Var(Var::Hostname))),
        "Timestamp" => Ok((input, Lhs::Var(Var::Timestamp))),
        "Severity" => Ok((input, Lhs::Var(Var::Severity))),
        "Pid" => Ok((input, Lhs::Var(Var::Pid))),
        other => Err(NomErr::Failure(PErr::from_external_error(
            input,
            nom::error::ErrorKind::Tag,
            MatchError::UnknownVar(other.to_string()),
        ))),
    }
}

fn comparison(input: &str) -> PResult<Expr> {
    let (input, l) = tok(lhs)(input)?;
    let (input, op) = tok(relop)(input)?;
    let (input, r) = tok(rhs)(input)?;
    Ok((input, Expr::Cmp(l, op, r)))
}

fn cmp_expr(input: &str) -> PResult<Expr> {
    alt((
        delimited(tok(char('(')), or_expr, tok(char(')'))),
        value(Expr::True, tok(tag("TRUE"))),
        value(Expr::False, tok(tag("FALSE"))),
        comparison,
    ))(input)
}

fn and_expr(input: &str) -> PResult<Expr> {
    let (input, first) = cmp_expr(input)?;
    let (input, rest) = many0(preceded(tok(tag("&&")), cmp_expr))(input)?;
    if rest.is_empty() {
        Ok((input, first))
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok((input, Expr::And(all)))
    }
}

fn or_expr(input: &str) -> PResult<Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(tok(tag("||")), and_expr))(input)?;
    if rest.is_empty() {
        Ok((input, first))
    } else {
        let mut all = vec![first];
        all.extend(rest);
        Ok((input, Expr::Or(all)))
    }
}

/// Parse and fully validate a matcher expression, ensuring no trailing garbage.
pub fn parse(source: &str) -> Result<Expr, MatchError> {
    match or_expr(source) {
        Ok((rest, expr)) => {
            let (rest, _) = multispace0::<&str, PErr>(rest)
                .map_err(|e| to_match_error(source, e))?;
            if !rest.is_empty() {
                return Err(MatchError::TrailingInput(rest.to_string()));
            }
            Ok(expr)
        }
        Err(e) => Err(to_match_error(source, e)),
    }
}

fn to_match_error(_source: &str, e: NomErr<PErr<'_>>) -> MatchError {
    match e {
        NomErr::Error(pe) | NomErr::Failure(pe) => match pe.kind {
            PErrKind::Match(me) => me,
            PErrKind::Nom(kind) => MatchError::Syntax {
                at: pe.input.chars().take(32).collect(),
                detail: format!("{kind:?}"),
            },
        },
        NomErr::Incomplete(_) => MatchError::Syntax {
            at: String::new(),
            detail: "incomplete input".to_string(),
        },
    }
}
