// ABOUTME: Parser module for reading Lisp source text into Values using nom combinators

//! The reader: turns source text into `Value`s. A `nom` combinator
//! structure — one function per literal kind, `alt`-dispatched, a shared
//! whitespace/comment skipper — over the value model (integers not
//! floats, characters, vectors, dotted pairs, keywords, the `[obj idx]`
//! dwim bracket sugar, and the `from..to` range-literal sugar used inside
//! dwim indices).
//!
//! Symbol interning needs a mutable `Packages` table, which a pure nom
//! combinator can't thread through easily, so parsing happens in two
//! phases: an intermediate [`Sexpr`] tree (this module's private AST, no
//! interning yet) is parsed with nom, then [`to_value`] walks it once,
//! interning symbols against the caller's `Packages`.

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{map, opt, peek, value},
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};

use crate::package::Packages;
use crate::value::Value;

#[derive(Debug, Clone)]
enum Sexpr {
    Int(i64),
    Char(char),
    Str(String),
    Sym(String),
    Vector(Vec<Sexpr>),
    List(Vec<Sexpr>, Option<Box<Sexpr>>),
    Range(i64, i64),
    Quote(Box<Sexpr>),
    Quasiquote(Box<Sexpr>),
    Unquote(Box<Sexpr>),
    UnquoteSplice(Box<Sexpr>),
    Dwim(Box<Sexpr>, Vec<Sexpr>),
}

fn parse_regular_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((value((), multispace1), parse_regular_comment)))
        .map(|_| ())
        .parse(input)
}

fn parse_int(input: &str) -> IResult<&str, Sexpr> {
    let (input, sign) = opt(char('-')).parse(input)?;
    let (input, digits) = digit1(input)?;
    let n: i64 = digits.parse().unwrap();
    Ok((input, Sexpr::Int(if sign.is_some() { -n } else { n })))
}

fn parse_range(input: &str) -> IResult<&str, Sexpr> {
    let (input, sign) = opt(char('-')).parse(input)?;
    let (input, from_digits) = digit1(input)?;
    let (input, _) = tag("..")(input)?;
    let (input, to_sign) = opt(char('-')).parse(input)?;
    let (input, to_digits) = digit1(input)?;
    let from: i64 = from_digits.parse().unwrap();
    let to: i64 = to_digits.parse().unwrap();
    let from = if sign.is_some() { -from } else { from };
    let to = if to_sign.is_some() { -to } else { to };
    Ok((input, Sexpr::Range(from, to)))
}

fn named_char(input: &str) -> IResult<&str, Sexpr> {
    alt((
        value(Sexpr::Char(' '), tag("space")),
        value(Sexpr::Char('\n'), tag("newline")),
        value(Sexpr::Char('\t'), tag("tab")),
        value(Sexpr::Char('\0'), tag("nul")),
    ))
    .parse(input)
}

fn parse_char(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = tag("#\\")(input)?;
    alt((named_char, map(nom::character::complete::anychar, Sexpr::Char))).parse(input)
}

fn parse_string(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = char('"')(input)?;
    let (input, content) = opt(escaped(none_of("\\\""), '\\', one_of("\\\"ntr"))).parse(input)?;
    let (input, _) = char('"')(input)?;
    let raw = content.unwrap_or("");
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    Ok((input, Sexpr::Str(out)))
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || "+-*/%<>=!?_:.&^~@".contains(c)
}

fn is_symbol_start(c: char) -> bool {
    is_symbol_char(c) && !c.is_ascii_digit()
}

fn parse_symbol(input: &str) -> IResult<&str, Sexpr> {
    let (input, first) = peek(nom::character::complete::satisfy(is_symbol_start)).parse(input)?;
    let _ = first;
    let (input, s) = take_while1(is_symbol_char)(input)?;
    Ok((input, Sexpr::Sym(s.to_string())))
}

fn parse_vector(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = tag("#(")(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, items) = many0(preceded(ws_and_comments, parse_expr)).parse(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Sexpr::Vector(items)))
}

/// True if `s` begins with a lone `.` marking a dotted-pair tail (followed
/// by whitespace or the close paren) rather than a `.`-containing symbol.
fn is_dot_marker(s: &str) -> bool {
    let mut chars = s.chars();
    if chars.next() != Some('.') {
        return false;
    }
    match chars.next() {
        None => true,
        Some(c) => c.is_whitespace() || c == ')',
    }
}

fn parse_list(input: &str) -> IResult<&str, Sexpr> {
    let (mut cur, _) = char('(')(input)?;
    let mut items = Vec::new();
    loop {
        let (rest, _) = ws_and_comments(cur)?;
        if is_dot_marker(rest) {
            cur = rest;
            break;
        }
        match parse_expr(rest) {
            Ok((rest2, e)) => {
                items.push(e);
                cur = rest2;
            }
            Err(_) => {
                cur = rest;
                break;
            }
        }
    }
    let (cur, dotted) = opt(preceded((char('.'), ws_and_comments), parse_expr)).parse(cur)?;
    let (cur, _) = ws_and_comments(cur)?;
    let (cur, _) = char(')')(cur)?;
    if items.is_empty() {
        return Ok((cur, Sexpr::List(vec![], None)));
    }
    Ok((cur, Sexpr::List(items, dotted.map(Box::new))))
}

fn parse_dwim_bracket(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, obj) = parse_expr(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, args) = many0(preceded(ws_and_comments, parse_expr)).parse(input)?;
    let (input, _) = ws_and_comments(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, Sexpr::Dwim(Box::new(obj), args)))
}

fn parse_quote(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = char('\'')(input)?;
    let (input, e) = parse_expr(input)?;
    Ok((input, Sexpr::Quote(Box::new(e))))
}

fn parse_quasiquote(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = char('`')(input)?;
    let (input, e) = parse_expr(input)?;
    Ok((input, Sexpr::Quasiquote(Box::new(e))))
}

fn parse_unquote(input: &str) -> IResult<&str, Sexpr> {
    let (input, _) = char(',')(input)?;
    let (input, splice) = opt(char('@')).parse(input)?;
    let (input, e) = parse_expr(input)?;
    if splice.is_some() {
        Ok((input, Sexpr::UnquoteSplice(Box::new(e))))
    } else {
        Ok((input, Sexpr::Unquote(Box::new(e))))
    }
}

fn parse_expr(input: &str) -> IResult<&str, Sexpr> {
    alt((
        parse_vector,
        parse_char,
        parse_string,
        parse_list,
        parse_dwim_bracket,
        parse_quote,
        parse_quasiquote,
        parse_unquote,
        parse_range,
        parse_int,
        parse_symbol,
    ))
    .parse(input)
}

fn parse_program(input: &str) -> IResult<&str, Vec<Sexpr>> {
    let (input, _) = ws_and_comments(input)?;
    let (input, items) = many0(preceded(ws_and_comments, parse_expr)).parse(input)?;
    let (input, _) = ws_and_comments(input)?;
    Ok((input, items))
}

fn to_value(s: &Sexpr, pkgs: &mut Packages) -> Value {
    match s {
        Sexpr::Int(n) => Value::Integer(*n),
        Sexpr::Char(c) => Value::Character(*c),
        Sexpr::Str(s) => Value::string(s.clone()),
        Sexpr::Range(from, to) => Value::cons(Value::Integer(*from), Value::Integer(*to)),
        Sexpr::Sym(name) => symbol_value(name, pkgs),
        Sexpr::Vector(items) => {
            Value::Vector(std::rc::Rc::new(std::cell::RefCell::new(
                items.iter().map(|i| to_value(i, pkgs)).collect(),
            )))
        }
        Sexpr::List(items, tail) => {
            let tail_value = match tail {
                Some(t) => to_value(t, pkgs),
                None => Value::Nil,
            };
            let mut out = tail_value;
            for item in items.iter().rev() {
                out = Value::cons(to_value(item, pkgs), out);
            }
            out
        }
        Sexpr::Quote(e) => {
            let quote = symbol_value("quote", pkgs);
            Value::cons(quote, Value::cons(to_value(e, pkgs), Value::Nil))
        }
        Sexpr::Quasiquote(e) => {
            let qq = symbol_value("qquote", pkgs);
            Value::cons(qq, Value::cons(to_value(e, pkgs), Value::Nil))
        }
        Sexpr::Unquote(e) => {
            let uq = symbol_value("unquote", pkgs);
            Value::cons(uq, Value::cons(to_value(e, pkgs), Value::Nil))
        }
        Sexpr::UnquoteSplice(e) => {
            let sp = symbol_value("splice", pkgs);
            Value::cons(sp, Value::cons(to_value(e, pkgs), Value::Nil))
        }
        Sexpr::Dwim(obj, args) => {
            let dwim = symbol_value("dwim", pkgs);
            let mut out = Value::Nil;
            for a in args.iter().rev() {
                out = Value::cons(to_value(a, pkgs), out);
            }
            Value::cons(dwim, Value::cons(to_value(obj, pkgs), out))
        }
    }
}

fn symbol_value(name: &str, pkgs: &mut Packages) -> Value {
    match name {
        "nil" => Value::Nil,
        "t" => Value::T,
        // The optional-parameter marker: a bare `:` is not a keyword, it's the
        // bindable symbol `eval.rs::parse_param_list` looks for by name.
        ":" => Value::Symbol(pkgs.intern(":", None)),
        _ if name.starts_with(':') => Value::Symbol(pkgs.intern_keyword(&name[1..])),
        _ if name.starts_with("sys:") => Value::Symbol(pkgs.intern_system(&name[4..])),
        _ => Value::Symbol(pkgs.intern(name, None)),
    }
}

/// Parses every top-level form in `input`.
pub fn parse_all(input: &str, pkgs: &mut Packages) -> Result<Vec<Value>, String> {
    match parse_program(input) {
        Ok((rest, items)) => {
            let (rest2, _) = ws_and_comments(rest).unwrap_or((rest, ()));
            if !rest2.trim().is_empty() {
                return Err(format!("unexpected trailing input: {:?}", &rest2[..rest2.len().min(40)]));
            }
            Ok(items.iter().map(|s| to_value(s, pkgs)).collect())
        }
        Err(e) => Err(format!("parse error: {e}")),
    }
}

/// Parses exactly one top-level form, erroring if there's more than one or
/// none.
pub fn parse_one(input: &str, pkgs: &mut Packages) -> Result<Value, String> {
    let mut all = parse_all(input, pkgs)?;
    if all.is_empty() {
        return Err("no expression found".to_string());
    }
    if all.len() > 1 {
        return Err("multiple top-level expressions".to_string());
    }
    Ok(all.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse1(src: &str) -> Value {
        let mut pkgs = Packages::new();
        parse_one(src, &mut pkgs).unwrap()
    }

    #[test]
    fn parses_integers() {
        let v = parse1("42");
        assert!(v.eql(&Value::int(42)));
        let v = parse1("-7");
        assert!(v.eql(&Value::int(-7)));
    }

    #[test]
    fn parses_nil_and_t() {
        assert!(parse1("nil").is_nil());
        assert!(matches!(parse1("t"), Value::T));
    }

    #[test]
    fn parses_empty_list_as_nil() {
        assert!(parse1("()").is_nil());
    }

    #[test]
    fn lone_colon_is_a_bindable_symbol_not_a_keyword() {
        let v = parse1(":");
        match v.as_symbol() {
            Some(s) => {
                assert_eq!(s.name, ":");
                assert_ne!(s.package, crate::package::KEYWORD_PACKAGE);
            }
            None => panic!("expected a symbol"),
        }
        assert!(v.is_bindable_symbol());
    }

    #[test]
    fn parses_proper_list() {
        let v = parse1("(1 2 3)");
        let items = v.list_to_vec().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[2].eql(&Value::int(3)));
    }

    #[test]
    fn parses_dotted_pair() {
        let v = parse1("(1 . 2)");
        let cell = v.as_cons().unwrap();
        assert!(cell.borrow().car.eql(&Value::int(1)));
        assert!(cell.borrow().cdr.eql(&Value::int(2)));
    }

    #[test]
    fn parses_character_literals() {
        assert!(matches!(parse1("#\\a"), Value::Character('a')));
        assert!(matches!(parse1("#\\space"), Value::Character(' ')));
        assert!(matches!(parse1("#\\newline"), Value::Character('\n')));
    }

    #[test]
    fn parses_string_with_escapes() {
        let v = parse1("\"a\\nb\"");
        match v {
            Value::Str(s) => assert_eq!(*s.borrow(), "a\nb"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn parses_vector_literal() {
        let v = parse1("#(1 2 3)");
        match v {
            Value::Vector(items) => assert_eq!(items.borrow().len(), 3),
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn parses_keyword() {
        match parse1(":foo") {
            Value::Symbol(s) => {
                assert_eq!(s.name, "foo");
                assert_eq!(s.package, crate::package::KEYWORD_PACKAGE);
            }
            _ => panic!("expected keyword symbol"),
        }
    }

    #[test]
    fn parses_quote_sugar() {
        let v = parse1("'x");
        let items = v.list_to_vec().unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Value::Symbol(s) if s.name == "quote"));
    }

    #[test]
    fn parses_quasiquote_unquote_splice() {
        let v = parse1("`(1 ,(+ 1 1) ,@(list 3 4) 5)");
        let items = v.list_to_vec().unwrap();
        assert!(matches!(&items[0], Value::Symbol(s) if s.name == "qquote"));
    }

    #[test]
    fn parses_dwim_bracket() {
        let v = parse1("[v 1]");
        let items = v.list_to_vec().unwrap();
        assert!(matches!(&items[0], Value::Symbol(s) if s.name == "dwim"));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn parses_range_literal_inside_dwim() {
        let v = parse1("[l 1..3]");
        let items = v.list_to_vec().unwrap();
        let range = items[2].as_cons().unwrap();
        assert!(range.borrow().car.eql(&Value::int(1)));
        assert!(range.borrow().cdr.eql(&Value::int(3)));
    }

    #[test]
    fn multiple_top_level_exprs_is_error() {
        let mut pkgs = Packages::new();
        assert!(parse_one("1 2", &mut pkgs).is_err());
    }

    #[test]
    fn unclosed_list_is_error() {
        let mut pkgs = Packages::new();
        assert!(parse_all("(1 2", &mut pkgs).is_err());
    }
}
