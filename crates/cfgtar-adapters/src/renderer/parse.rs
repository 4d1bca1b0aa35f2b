//! Parse tree for templates.

use cfgtar_core::application::{RenderError, TemplateFunctions};

use super::exec::is_builtin;
use super::lex::{Segment, Tok, Token, tokenize};

pub(super) type List = Vec<Node>;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Node {
    Text(String),
    Action(Pipeline),
    If {
        cond: Pipeline,
        then: List,
        otherwise: List,
    },
    Range {
        pipe: Pipeline,
        body: List,
        otherwise: List,
    },
    With {
        pipe: Pipeline,
        body: List,
        otherwise: List,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Pipeline {
    pub line: usize,
    /// Variables declared with `:=`, without the `$`.
    pub decl: Vec<String>,
    pub cmds: Vec<Command>,
}

/// Operands of one pipeline stage; a leading `Func` is called with the rest.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Command {
    pub args: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Term {
    Dot,
    /// `.a.b` relative to dot.
    Field(Vec<String>),
    /// `$x.a.b`
    Var(String, Vec<String>),
    Func(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    /// `(pipeline).a.b`
    Sub(Box<Pipeline>, Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    Range,
    With,
}

impl Control {
    const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Range => "range",
            Self::With => "with",
        }
    }
}

/// How a list ended.
enum Stop {
    Eof,
    End { line: usize },
    Else { rest: Vec<Token>, line: usize },
}

const UNSUPPORTED: &[&str] = &["define", "template", "block", "break", "continue"];

pub(super) struct Parser<'a> {
    segments: std::vec::IntoIter<Segment>,
    functions: &'a dyn TemplateFunctions,
    vars: Vec<String>,
    scopes: Vec<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(segments: Vec<Segment>, functions: &'a dyn TemplateFunctions) -> Self {
        Self {
            segments: segments.into_iter(),
            functions,
            vars: vec![String::new()],
            scopes: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<List, RenderError> {
        let (list, stop) = self.parse_list()?;
        match stop {
            Stop::Eof => Ok(list),
            Stop::End { line } => Err(RenderError::new("unexpected {{end}}").at_line(line)),
            Stop::Else { line, .. } => Err(RenderError::new("unexpected {{else}}").at_line(line)),
        }
    }

    fn parse_list(&mut self) -> Result<(List, Stop), RenderError> {
        let mut list = Vec::new();
        while let Some(segment) = self.segments.next() {
            let (body, line) = match segment {
                Segment::Text(text) => {
                    list.push(Node::Text(text));
                    continue;
                }
                Segment::Action { body, line } => (body, line),
            };

            let tokens = tokenize(&body, line)?;
            let keyword = match tokens.first().map(|t| &t.tok) {
                Some(Tok::Ident(name)) => name.as_str(),
                None => return Err(RenderError::new("missing value for command").at_line(line)),
                _ => "",
            };
            match keyword {
                "end" if tokens.len() == 1 => return Ok((list, Stop::End { line })),
                "end" => return Err(RenderError::new("unexpected tokens after end").at_line(line)),
                "else" => {
                    let rest = tokens[1..].to_vec();
                    return Ok((list, Stop::Else { rest, line }));
                }
                "if" => list.push(self.parse_control(Control::If, &tokens[1..], line)?),
                "range" => list.push(self.parse_control(Control::Range, &tokens[1..], line)?),
                "with" => list.push(self.parse_control(Control::With, &tokens[1..], line)?),
                kw if UNSUPPORTED.contains(&kw) => {
                    return Err(RenderError::new(format!("{{{{{kw}}}}} is not supported")).at_line(line));
                }
                _ => {
                    let pipe = self.parse_pipeline(&tokens, line, 1)?;
                    self.declare(&pipe);
                    list.push(Node::Action(pipe));
                }
            }
        }
        Ok((list, Stop::Eof))
    }

    fn parse_control(&mut self, control: Control, tokens: &[Token], line: usize) -> Result<Node, RenderError> {
        self.scopes.push(self.vars.len());
        let max_decl = if control == Control::Range { 2 } else { 1 };
        let pipe = self.parse_pipeline(tokens, line, max_decl)?;
        self.declare(&pipe);

        let (body, stop) = self.parse_list()?;
        let otherwise = match stop {
            Stop::Eof => {
                return Err(RenderError::new(format!(
                    "unexpected EOF in {{{{{}}}}}",
                    control.keyword()
                ))
                .at_line(line));
            }
            Stop::End { .. } => Vec::new(),
            Stop::Else { rest, line: else_line } if rest.is_empty() => {
                let (otherwise, stop) = self.parse_list()?;
                match stop {
                    Stop::End { .. } => otherwise,
                    _ => {
                        return Err(RenderError::new(format!(
                            "expected {{{{end}}}} after {{{{else}}}} in {{{{{}}}}}",
                            control.keyword()
                        ))
                        .at_line(else_line));
                    }
                }
            }
            Stop::Else { rest, line: else_line } => match &rest[0].tok {
                Tok::Ident(kw) if control != Control::Range && kw == control.keyword() => {
                    vec![self.parse_control(control, &rest[1..], else_line)?]
                }
                _ => return Err(RenderError::new("unexpected tokens after else").at_line(else_line)),
            },
        };

        if let Some(mark) = self.scopes.pop() {
            self.vars.truncate(mark);
        }
        Ok(match control {
            Control::If => Node::If {
                cond: pipe,
                then: body,
                otherwise,
            },
            Control::Range => Node::Range {
                pipe,
                body,
                otherwise,
            },
            Control::With => Node::With {
                pipe,
                body,
                otherwise,
            },
        })
    }

    fn declare(&mut self, pipe: &Pipeline) {
        self.vars.extend(pipe.decl.iter().cloned());
    }

    /// Parse `[$a[, $b] :=] cmd | cmd ...`.
    fn parse_pipeline(&self, tokens: &[Token], line: usize, max_decl: usize) -> Result<Pipeline, RenderError> {
        let (decl, tokens) = split_declaration(tokens, max_decl, line)?;
        let mut pos = 0;
        let pipe = self.parse_commands(tokens, &mut pos, line, decl)?;
        if pos < tokens.len() {
            return Err(RenderError::new(format!("unexpected {:?} in operand", tokens[pos].tok)).at_line(line));
        }
        Ok(pipe)
    }

    fn parse_commands(
        &self,
        tokens: &[Token],
        pos: &mut usize,
        line: usize,
        decl: Vec<String>,
    ) -> Result<Pipeline, RenderError> {
        let mut cmds = Vec::new();
        let mut args = Vec::new();
        while let Some(token) = tokens.get(*pos) {
            match token.tok {
                Tok::RParen => break,
                Tok::Pipe => {
                    if args.is_empty() {
                        return Err(RenderError::new("missing value for command").at_line(line));
                    }
                    cmds.push(Command {
                        args: std::mem::take(&mut args),
                    });
                    *pos += 1;
                }
                _ => args.push(self.parse_operand(tokens, pos, line)?),
            }
        }
        if args.is_empty() {
            return Err(RenderError::new("missing value for command").at_line(line));
        }
        cmds.push(Command { args });
        Ok(Pipeline { line, decl, cmds })
    }

    fn parse_operand(&self, tokens: &[Token], pos: &mut usize, line: usize) -> Result<Term, RenderError> {
        let err = |msg: String| RenderError::new(msg).at_line(line);
        let token = &tokens[*pos];
        *pos += 1;
        let mut term = match &token.tok {
            Tok::Dot => Term::Dot,
            Tok::Field(name) => Term::Field(vec![name.clone()]),
            Tok::Var(name) => {
                if !self.vars.iter().any(|v| v == name) {
                    return Err(err(format!("undefined variable \"${name}\"")));
                }
                Term::Var(name.clone(), Vec::new())
            }
            Tok::Ident(name) => {
                if !is_builtin(name) && !self.functions.has(name) {
                    return Err(err(format!("function \"{name}\" not defined")));
                }
                Term::Func(name.clone())
            }
            Tok::Str(s) => Term::Str(s.clone()),
            Tok::Int(n) => Term::Int(*n),
            Tok::Float(f) => Term::Float(*f),
            Tok::Bool(b) => Term::Bool(*b),
            Tok::Nil => Term::Nil,
            Tok::LParen => {
                let inner = self.parse_commands(tokens, pos, line, Vec::new())?;
                match tokens.get(*pos) {
                    Some(Token { tok: Tok::RParen, .. }) => *pos += 1,
                    _ => return Err(err("unclosed left paren".into())),
                }
                Term::Sub(Box::new(inner), Vec::new())
            }
            other => return Err(err(format!("unexpected {other:?} in operand"))),
        };

        while let Some(Token {
            tok: Tok::Field(name),
            spaced: false,
        }) = tokens.get(*pos)
        {
            match &mut term {
                Term::Field(chain) | Term::Var(_, chain) | Term::Sub(_, chain) => chain.push(name.clone()),
                _ => return Err(err(format!("unexpected .{name} after operand"))),
            }
            *pos += 1;
        }
        Ok(term)
    }
}

fn split_declaration(tokens: &[Token], max: usize, line: usize) -> Result<(Vec<String>, &[Token]), RenderError> {
    let toks: Vec<&Tok> = tokens.iter().take(4).map(|t| &t.tok).collect();
    match toks.as_slice() {
        [Tok::Var(a), Tok::Declare, ..] => Ok((vec![a.clone()], &tokens[2..])),
        [Tok::Var(a), Tok::Comma, Tok::Var(b), Tok::Declare] if max >= 2 => {
            Ok((vec![a.clone(), b.clone()], &tokens[4..]))
        }
        [Tok::Var(_), Tok::Comma, ..] => Err(RenderError::new("too many declarations").at_line(line)),
        [Tok::Var(_), Tok::Assign, ..] => {
            Err(RenderError::new("variable assignment is not supported").at_line(line))
        }
        _ => Ok((Vec::new(), tokens)),
    }
}

#[cfg(test)]
mod tests {
    use cfgtar_core::application::NoFunctions;
    use cfgtar_core::domain::Delimiters;

    use super::super::lex::split;
    use super::*;

    fn parse(source: &str) -> Result<List, RenderError> {
        let segments = split(source, &Delimiters::default())?;
        Parser::new(segments, &NoFunctions).parse()
    }

    #[test]
    fn nested_else_if_shares_one_end() {
        let list = parse("{{if .a}}A{{else if .b}}B{{else}}C{{end}}").unwrap();
        let [Node::If { otherwise, .. }] = list.as_slice() else {
            panic!("expected one if node: {list:?}");
        };
        assert!(matches!(otherwise.as_slice(), [Node::If { .. }]));
    }

    #[test]
    fn field_chains_and_subexpressions() {
        let list = parse("{{(index .m \"k\").x.y}}").unwrap();
        let [Node::Action(pipe)] = list.as_slice() else {
            panic!("expected action");
        };
        let [Term::Sub(_, chain)] = pipe.cmds[0].args.as_slice() else {
            panic!("expected subexpression");
        };
        assert_eq!(chain, &vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn range_declares_two_variables() {
        let list = parse("{{range $i, $v := .xs}}{{$i}}{{$v}}{{end}}").unwrap();
        let [Node::Range { pipe, .. }] = list.as_slice() else {
            panic!("expected range");
        };
        assert_eq!(pipe.decl, vec!["i".to_string(), "v".to_string()]);
    }

    #[test]
    fn variables_go_out_of_scope() {
        assert!(parse("{{with $x := .a}}{{$x}}{{end}}").is_ok());
        let err = parse("{{with $x := .a}}{{end}}{{$x}}").unwrap_err();
        assert!(err.message.contains("undefined variable"));
    }

    #[test]
    fn unknown_function_fails_at_parse_time() {
        let err = parse("{{if false}}{{frobnicate 1}}{{end}}").unwrap_err();
        assert_eq!(err.message, "function \"frobnicate\" not defined");
    }

    #[test]
    fn structural_errors() {
        assert!(parse("{{if .a}}x").is_err());
        assert!(parse("{{end}}").is_err());
        assert!(parse("{{else}}").is_err());
        assert!(parse("{{}}").is_err());
        assert!(parse("{{ .a | }}").is_err());
        assert!(parse("{{ (.a }}").is_err());
        assert!(parse("{{template \"x\"}}").is_err());
        assert!(parse("{{range .a}}{{else if .b}}{{end}}").is_err());
    }
}
