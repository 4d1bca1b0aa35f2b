//! Executing a parsed template against a value tree.

use std::cmp::Ordering;
use std::fmt::Write as _;

use cfgtar_core::{
    application::{RenderError, TemplateFunctions},
    domain::Value,
};

use super::parse::{Command, List, Node, Pipeline, Term};

const BUILTINS: &[&str] = &[
    "and", "or", "not", "len", "index", "eq", "ne", "lt", "le", "gt", "ge", "print", "println",
    "printf", "join",
];

pub(super) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

fn fail(message: impl Into<String>) -> RenderError {
    RenderError::new(message)
}

pub(super) struct Exec<'a> {
    functions: &'a dyn TemplateFunctions,
    vars: Vec<(String, Value)>,
    out: String,
}

impl<'a> Exec<'a> {
    pub fn run(list: &List, data: &Value, functions: &'a dyn TemplateFunctions) -> Result<String, RenderError> {
        let mut exec = Self {
            functions,
            vars: vec![(String::new(), data.clone())],
            out: String::new(),
        };
        exec.walk_list(list, data)?;
        Ok(exec.out)
    }

    fn walk_list(&mut self, list: &List, dot: &Value) -> Result<(), RenderError> {
        list.iter().try_for_each(|node| self.walk(node, dot))
    }

    fn walk(&mut self, node: &Node, dot: &Value) -> Result<(), RenderError> {
        match node {
            Node::Text(text) => self.out.push_str(text),
            Node::Action(pipe) => {
                let value = self.pipeline(pipe, dot)?;
                if pipe.decl.is_empty() {
                    let _ = write!(self.out, "{value}");
                }
            }
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                let mark = self.vars.len();
                let value = self.pipeline(cond, dot)?;
                let branch = if value.is_truthy() { then } else { otherwise };
                let result = self.walk_list(branch, dot);
                self.vars.truncate(mark);
                result?;
            }
            Node::With {
                pipe,
                body,
                otherwise,
            } => {
                let mark = self.vars.len();
                let value = self.pipeline(pipe, dot)?;
                let result = if value.is_truthy() {
                    self.walk_list(body, &value)
                } else {
                    self.walk_list(otherwise, dot)
                };
                self.vars.truncate(mark);
                result?;
            }
            Node::Range {
                pipe,
                body,
                otherwise,
            } => self.range(pipe, body, otherwise, dot)?,
        }
        Ok(())
    }

    fn range(&mut self, pipe: &Pipeline, body: &List, otherwise: &List, dot: &Value) -> Result<(), RenderError> {
        let items: Vec<(Value, Value)> = match self.eval(pipe, dot)? {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Int(i as i64), item))
                .collect(),
            Value::Mapping(map) => map.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            Value::Int(n) if n >= 0 => (0..n).map(|i| (Value::Int(i), Value::Int(i))).collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(fail(format!("range can't iterate over {}", other.type_name())).at_line(pipe.line));
            }
        };

        if items.is_empty() {
            return self.walk_list(otherwise, dot);
        }

        let mark = self.vars.len();
        let mut result = Ok(());
        for (key, item) in items {
            self.vars.truncate(mark);
            match pipe.decl.as_slice() {
                [value] => self.vars.push((value.clone(), item.clone())),
                [index, value] => {
                    self.vars.push((index.clone(), key));
                    self.vars.push((value.clone(), item.clone()));
                }
                _ => {}
            }
            result = self.walk_list(body, &item);
            if result.is_err() {
                break;
            }
        }
        self.vars.truncate(mark);
        result
    }

    /// Evaluate and bind any declared variables.
    fn pipeline(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, RenderError> {
        let value = self.eval(pipe, dot)?;
        for name in &pipe.decl {
            self.vars.push((name.clone(), value.clone()));
        }
        Ok(value)
    }

    fn eval(&self, pipe: &Pipeline, dot: &Value) -> Result<Value, RenderError> {
        let mut piped = None;
        for cmd in &pipe.cmds {
            piped = Some(self.command(cmd, dot, piped.take()).map_err(|e| e.at_line(pipe.line))?);
        }
        Ok(piped.unwrap_or_default())
    }

    fn command(&self, cmd: &Command, dot: &Value, piped: Option<Value>) -> Result<Value, RenderError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Err(fail("empty command"));
        };
        match first {
            Term::Func(name) => self.call(name, rest, dot, piped),
            term if rest.is_empty() && piped.is_none() => self.term(term, dot),
            _ => Err(fail("can't give argument to non-function")),
        }
    }

    fn call(&self, name: &str, rest: &[Term], dot: &Value, piped: Option<Value>) -> Result<Value, RenderError> {
        if name == "and" || name == "or" {
            return self.logical(name == "and", rest, dot, piped);
        }

        let mut args = rest
            .iter()
            .map(|term| self.term(term, dot))
            .collect::<Result<Vec<_>, _>>()?;
        args.extend(piped);

        if is_builtin(name) {
            builtin(name, &args)
        } else {
            self.functions
                .call(name, &args)
                .map_err(|e| fail(format!("error calling {name}: {e}")))
        }
    }

    /// `and` yields the first falsy argument, `or` the first truthy one;
    /// otherwise the last. Later arguments are not evaluated.
    fn logical(&self, is_and: bool, rest: &[Term], dot: &Value, piped: Option<Value>) -> Result<Value, RenderError> {
        if rest.is_empty() && piped.is_none() {
            return Err(fail("wrong number of args: want at least 1 got 0"));
        }
        let mut last = Value::Null;
        for term in rest {
            let value = self.term(term, dot)?;
            if is_and != value.is_truthy() {
                return Ok(value);
            }
            last = value;
        }
        if let Some(value) = piped {
            if is_and != value.is_truthy() {
                return Ok(value);
            }
            last = value;
        }
        Ok(last)
    }

    fn term(&self, term: &Term, dot: &Value) -> Result<Value, RenderError> {
        match term {
            Term::Dot => Ok(dot.clone()),
            Term::Field(chain) => fields(dot, chain),
            Term::Var(name, chain) => {
                let (_, value) = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .ok_or_else(|| fail(format!("undefined variable \"${name}\"")))?;
                fields(value, chain)
            }
            Term::Func(name) => self.call(name, &[], dot, None),
            Term::Str(s) => Ok(Value::String(s.clone())),
            Term::Int(n) => Ok(Value::Int(*n)),
            Term::Float(f) => Ok(Value::Float(*f)),
            Term::Bool(b) => Ok(Value::Bool(*b)),
            Term::Nil => Ok(Value::Null),
            Term::Sub(pipe, chain) => fields(&self.eval(pipe, dot)?, chain),
        }
    }
}

/// Follow `.a.b` from `value`; missing keys are errors.
fn fields(value: &Value, chain: &[String]) -> Result<Value, RenderError> {
    let mut current = value;
    for name in chain {
        current = match current {
            Value::Mapping(map) => map
                .get(name)
                .ok_or_else(|| fail(format!("map has no entry for key \"{name}\"")))?,
            Value::Null => return Err(fail(format!("nil pointer evaluating .{name}"))),
            other => {
                return Err(fail(format!(
                    "can't evaluate field {name} in type {}",
                    other.type_name()
                )));
            }
        };
    }
    Ok(current.clone())
}

// ── builtins ─────────────────────────────────────────────────────────────────

fn arity(name: &str, args: &[Value], want: usize) -> Result<(), RenderError> {
    if args.len() != want {
        return Err(fail(format!(
            "wrong number of args for {name}: want {want} got {}",
            args.len()
        )));
    }
    Ok(())
}

fn builtin(name: &str, args: &[Value]) -> Result<Value, RenderError> {
    match name {
        "not" => {
            arity(name, args, 1)?;
            Ok(Value::Bool(!args[0].is_truthy()))
        }
        "len" => {
            arity(name, args, 1)?;
            let n = match &args[0] {
                Value::String(s) => s.len(),
                Value::Sequence(items) => items.len(),
                Value::Mapping(map) => map.len(),
                other => return Err(fail(format!("len of type {}", other.type_name()))),
            };
            Ok(Value::Int(n as i64))
        }
        "index" => {
            let (item, keys) = args
                .split_first()
                .ok_or_else(|| fail("wrong number of args for index: want at least 1 got 0"))?;
            keys.iter().try_fold(item.clone(), |item, key| index(&item, key))
        }
        "eq" => {
            let (first, rest) = args
                .split_first()
                .filter(|(_, rest)| !rest.is_empty())
                .ok_or_else(|| fail("wrong number of args for eq: want at least 2"))?;
            for other in rest {
                if equal(first, other)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "ne" => {
            arity(name, args, 2)?;
            Ok(Value::Bool(!equal(&args[0], &args[1])?))
        }
        "lt" | "le" | "gt" | "ge" => {
            arity(name, args, 2)?;
            let ord = compare(&args[0], &args[1])?;
            Ok(Value::Bool(match name {
                "lt" => ord == Ordering::Less,
                "le" => ord != Ordering::Greater,
                "gt" => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        "print" => Ok(Value::String(sprint(args))),
        "println" => {
            let words: Vec<String> = args.iter().map(ToString::to_string).collect();
            Ok(Value::String(words.join(" ") + "\n"))
        }
        "printf" => {
            let (format, rest) = args
                .split_first()
                .ok_or_else(|| fail("wrong number of args for printf: want at least 1 got 0"))?;
            let format = format
                .as_str()
                .ok_or_else(|| fail("printf format must be a string"))?;
            Ok(Value::String(sprintf(format, rest)))
        }
        "join" => {
            arity(name, args, 2)?;
            let sep = args[0]
                .as_str()
                .ok_or_else(|| fail("join separator must be a string"))?;
            let items = args[1]
                .as_sequence()
                .ok_or_else(|| fail(format!("can't join {}", args[1].type_name())))?;
            let words: Vec<String> = items.iter().map(ToString::to_string).collect();
            Ok(Value::String(words.join(sep)))
        }
        other => Err(fail(format!("function \"{other}\" not defined"))),
    }
}

fn index(item: &Value, key: &Value) -> Result<Value, RenderError> {
    match (item, key) {
        (Value::Sequence(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| fail(format!("index out of range: {i}"))),
        (Value::String(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.as_bytes().get(i))
            .map(|b| Value::Int(i64::from(*b)))
            .ok_or_else(|| fail(format!("index out of range: {i}"))),
        (Value::Mapping(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or_default()),
        (Value::Null, _) => Err(fail("index of untyped nil")),
        (Value::Sequence(_) | Value::String(_), other) | (Value::Mapping(_), other) => Err(fail(
            format!("cannot index {} with {}", item.type_name(), other.type_name()),
        )),
        (other, _) => Err(fail(format!("can't index item of type {}", other.type_name()))),
    }
}

fn equal(a: &Value, b: &Value) -> Result<bool, RenderError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => Ok(a.as_f64() == b.as_f64()),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Sequence(_) | Value::Mapping(_), _) | (_, Value::Sequence(_) | Value::Mapping(_)) => {
            Err(fail("non-comparable type"))
        }
        _ => Err(fail("incompatible types for comparison")),
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, RenderError> {
    let ord = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    };
    ord.ok_or_else(|| fail("incompatible types for comparison"))
}

/// Operands are separated by a space when neither side is a string.
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        let is_str = matches!(arg, Value::String(_));
        if i > 0 && !is_str && !matches!(args[i - 1], Value::String(_)) {
            out.push(' ');
        }
        let _ = write!(out, "{arg}");
    }
    out
}

/// The common `printf` verbs: `%v %s %d %f %q %t %x %%` with flags `-`
/// and `0`, width and precision.
fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let (mut left, mut zero) = (false, false);
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => left = true,
                '0' => zero = true,
                '+' | ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        let width = digits(&mut chars);
        let precision = if chars.peek() == Some(&'.') {
            chars.next();
            Some(digits(&mut chars))
        } else {
            None
        };
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let (width, precision) = match (width, precision) {
            (Number::TooLarge, _) => {
                out.push_str("%!(BADWIDTH)");
                args.next();
                continue;
            }
            (_, Some(Number::TooLarge)) => {
                out.push_str("%!(BADPREC)");
                args.next();
                continue;
            }
            (width, precision) => (width.value(), precision.map(|p| p.value().unwrap_or(0))),
        };
        let Some(arg) = args.next() else {
            let _ = write!(out, "%!{verb}(MISSING)");
            continue;
        };

        let text = match (verb, arg) {
            ('d', Value::Int(n)) => n.to_string(),
            ('d', Value::Float(f)) if f.fract() == 0.0 => format!("{f:.0}"),
            ('f' | 'F', v) if v.as_f64().is_some() => {
                format!("{:.*}", precision.unwrap_or(6), v.as_f64().unwrap_or_default())
            }
            ('q', Value::String(s)) => format!("{s:?}"),
            ('x', Value::Int(n)) => format!("{n:x}"),
            ('X', Value::Int(n)) => format!("{n:X}"),
            ('x', Value::String(s)) => s.bytes().map(|b| format!("{b:02x}")).collect(),
            ('t', Value::Bool(b)) => b.to_string(),
            ('s' | 'v', v) => match precision {
                Some(p) => v.to_string().chars().take(p).collect(),
                None => v.to_string(),
            },
            (verb, v) => format!("%!{verb}({}={v})", v.type_name()),
        };
        pad(&mut out, &text, width, left, zero && !left && verb != 's');
    }

    let extra: Vec<String> = args.map(|v| format!("{}={v}", v.type_name())).collect();
    if !extra.is_empty() {
        let _ = write!(out, "%!(EXTRA {})", extra.join(", "));
    }
    out
}

/// Widths and precisions above this are rejected.
const MAX_WIDTH: usize = 1_000_000;

/// A width or precision as written in a `printf` verb.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Absent,
    Value(usize),
    TooLarge,
}

impl Number {
    fn value(self) -> Option<usize> {
        match self {
            Self::Value(n) => Some(n),
            Self::Absent | Self::TooLarge => None,
        }
    }
}

/// Consumes every digit, even past the limit.
fn digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Number {
    let mut n = Number::Absent;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = match n {
            Number::Absent => Number::Value(d as usize),
            Number::Value(v) => v
                .checked_mul(10)
                .and_then(|v| v.checked_add(d as usize))
                .filter(|v| *v <= MAX_WIDTH)
                .map_or(Number::TooLarge, Number::Value),
            Number::TooLarge => Number::TooLarge,
        };
        chars.next();
    }
    n
}

fn pad(out: &mut String, text: &str, width: Option<usize>, left: bool, zero: bool) {
    let fill = width.unwrap_or(0).saturating_sub(text.chars().count());
    if left {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if zero {
        let (sign, body) = match text.strip_prefix('-') {
            Some(body) => ("-", body),
            None => ("", text),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Value {
        Value::from_json_str(text).unwrap()
    }

    #[test]
    fn sprint_spacing_follows_operand_types() {
        assert_eq!(sprint(&[v("1"), v("2")]), "1 2");
        assert_eq!(sprint(&[v(r#""a""#), v("1"), v(r#""b""#)]), "a1b");
    }

    #[test]
    fn sprintf_verbs() {
        assert_eq!(sprintf("%s=%d", &[v(r#""port""#), v("80")]), "port=80");
        assert_eq!(sprintf("%05.2f|%-4s|%3d", &[v("3.14159"), v(r#""ab""#), v("7")]), "03.14|ab  |  7");
        assert_eq!(sprintf("%q %x %%", &[v(r#""hi""#), v("255")]), "\"hi\" ff %");
        assert_eq!(sprintf("%d", &[]), "%!d(MISSING)");
        assert_eq!(sprintf("%d", &[v(r#""x""#)]), "%!d(string=x)");
    }

    #[test]
    fn sprintf_rejects_huge_width_and_precision() {
        assert_eq!(sprintf("%99999999999999999999d|%s", &[v("1"), v(r#""a""#)]), "%!(BADWIDTH)|a");
        assert_eq!(sprintf("%1000001d", &[v("1")]), "%!(BADWIDTH)");
        assert_eq!(sprintf("%.99999999999f", &[v("1.5")]), "%!(BADPREC)");
        assert_eq!(sprintf("%3.1f", &[v("1.25")]).len(), 3);
    }

    #[test]
    fn index_semantics() {
        assert_eq!(index(&v("[1,2]"), &v("1")).unwrap(), v("2"));
        assert!(index(&v("[1,2]"), &v("2")).is_err());
        assert_eq!(index(&v(r#"{"a":1}"#), &v(r#""b""#)).unwrap(), Value::Null);
        assert!(index(&Value::Null, &v("0")).is_err());
    }

    #[test]
    fn comparisons() {
        assert!(equal(&v("1"), &v("1.0")).unwrap());
        assert!(equal(&v(r#""1""#), &v("1")).is_err());
        assert_eq!(compare(&v(r#""a""#), &v(r#""b""#)).unwrap(), Ordering::Less);
        assert!(compare(&v("true"), &v("false")).is_err());
    }
}
