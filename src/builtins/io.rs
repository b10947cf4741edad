//! Minimal stdio I/O bindings ("consumed only for error message
//! construction and built-in I/O bindings" — no stream-port abstraction,
//! since that lives with the character-oriented stream collaborator).

use std::io::{self, Write};

use crate::error::{Unwind, TAG_FILE_ERROR, TAG_TYPE_ERROR};
use crate::interp::Interp;
use crate::value::{Arity, Value};

fn one(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Nil)
}

fn builtin_put_line(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let v = one(args);
    writeln!(io::stdout(), "{v}").map_err(|e| interp.make_error(TAG_FILE_ERROR, format!("put-line: {e}")))?;
    Ok(v.clone())
}

fn builtin_put_char(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    match one(args) {
        Value::Character(c) => {
            write!(io::stdout(), "{c}").map_err(|e| interp.make_error(TAG_FILE_ERROR, format!("put-char: {e}")))?;
            io::stdout().flush().ok();
            Ok(Value::Character(*c))
        }
        _ => Err(interp.make_error(TAG_TYPE_ERROR, "put-char: not a character")),
    }
}

fn builtin_get_line(interp: &mut Interp, _args: &[Value]) -> Result<Value, Unwind> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => Ok(Value::Nil),
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::string(line))
        }
        Err(e) => Err(interp.make_error(TAG_FILE_ERROR, format!("get-line: {e}"))),
    }
}

fn builtin_get_char(interp: &mut Interp, _args: &[Value]) -> Result<Value, Unwind> {
    use std::io::Read;
    let mut buf = [0u8; 1];
    match io::stdin().read(&mut buf) {
        Ok(0) => Ok(Value::Nil),
        Ok(_) => Ok(Value::Character(buf[0] as char)),
        Err(e) => Err(interp.make_error(TAG_FILE_ERROR, format!("get-char: {e}"))),
    }
}

/// `(format fmt arg...)`: `~a` substitutes the printed form of the next
/// argument, `~%` a newline, `~~` a literal tilde; anything else passes
/// through unchanged.
fn builtin_format(interp: &mut Interp, args: &[Value]) -> Result<Value, Unwind> {
    let fmt = match one(args) {
        Value::Str(s) => s.borrow().clone(),
        _ => return Err(interp.make_error(TAG_TYPE_ERROR, "format: not a string")),
    };
    let mut rest = args[1.min(args.len())..].iter();
    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') | Some('A') => {
                let v = rest.next().cloned().unwrap_or(Value::Nil);
                out.push_str(&v.to_string());
            }
            Some('%') => out.push('\n'),
            Some('~') => out.push('~'),
            Some(other) => {
                out.push('~');
                out.push(other);
            }
            None => out.push('~'),
        }
    }
    Ok(Value::string(out))
}

pub fn register(interp: &mut Interp) {
    interp.reg_fun("put-line", Arity::exact(1), builtin_put_line);
    interp.reg_fun("put-char", Arity::exact(1), builtin_put_char);
    interp.reg_fun("get-line", Arity::exact(0), builtin_get_line);
    interp.reg_fun("get-char", Arity::exact(0), builtin_get_char);
    interp.reg_fun("format", Arity::at_least(1), builtin_format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_substitutes_a_directive() {
        let mut interp = Interp::new();
        let r = builtin_format(&mut interp, &[Value::string("hello ~a!"), Value::string("world")]).unwrap();
        match r {
            Value::Str(s) => assert_eq!(*s.borrow(), "hello world!"),
            _ => panic!("expected string"),
        }
    }

    #[test]
    fn format_newline_and_tilde_escapes() {
        let mut interp = Interp::new();
        let r = builtin_format(&mut interp, &[Value::string("a~%b~~c")]).unwrap();
        match r {
            Value::Str(s) => assert_eq!(*s.borrow(), "a\nb~c"),
            _ => panic!("expected string"),
        }
    }
}
