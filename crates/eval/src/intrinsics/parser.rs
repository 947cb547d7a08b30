//! Lexer and recursive-descent parser for intrinsic function expressions.
//!
//! Grammar: `Name.Sub(arg, arg, ...)` where an argument is a nested call,
//! a path (`$...` / `$$...`), a single-quoted string, or a number. The
//! parser is strict: trailing input, mismatched parentheses, and empty
//! names are syntax errors with the offending offset.

use crate::error::EvalError;

/// One parsed argument of an intrinsic call.
#[derive(Debug, Clone, PartialEq)]
pub enum IntrinsicArg {
    /// A nested intrinsic call, evaluated first.
    Call(IntrinsicCall),
    /// A JSONPath into the input.
    Path(String),
    /// A JSONPath into the context object (written `$$...`, stored
    /// with the extra `$` already stripped).
    ContextPath(String),
    Str(String),
    Int(i64),
    Float(f64),
}

/// A parsed `States.Name(args...)` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicCall {
    pub name: String,
    pub args: Vec<IntrinsicArg>,
}

/// Parse one complete intrinsic expression.
pub fn parse_intrinsic(src: &str) -> Result<IntrinsicCall, EvalError> {
    let tokens = lex(src)?;
    let mut parser = Parser { tokens, idx: 0 };
    let call = parser.parse_call()?;
    match parser.peek() {
        (Token::Eof, _) => Ok(call),
        (_, pos) => Err(syntax(pos, "unexpected trailing input")),
    }
}

fn syntax(position: usize, message: impl Into<String>) -> EvalError {
    EvalError::IntrinsicFunctionSyntaxError {
        position,
        message: message.into(),
    }
}

// ── Lexer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Int(i64),
    Float(f64),
    Path(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Eof,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    pos: usize,
}

fn lex(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        let tok_pos = pos;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Path token: everything up to a delimiter belongs to the path
        if c == '$' {
            let start = pos;
            while pos < chars.len() && !is_path_delimiter(chars[pos]) {
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Path(chars[start..pos].iter().collect()),
                pos: tok_pos,
            });
            continue;
        }

        // Single-quoted string literal
        if c == '\'' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(syntax(tok_pos, "unterminated string literal"));
                }
                match chars[pos] {
                    '\'' => {
                        pos += 1;
                        break;
                    }
                    '\\' => {
                        pos += 1;
                        if pos >= chars.len() {
                            return Err(syntax(tok_pos, "unterminated escape in string"));
                        }
                        match chars[pos] {
                            '\'' => s.push('\''),
                            '\\' => s.push('\\'),
                            // Brace escapes stay verbatim; States.Format
                            // resolves them when expanding placeholders.
                            '{' => s.push_str("\\{"),
                            '}' => s.push_str("\\}"),
                            other => {
                                return Err(syntax(
                                    pos,
                                    format!("invalid escape '\\{}' in string", other),
                                ));
                            }
                        }
                        pos += 1;
                    }
                    other => {
                        s.push(other);
                        pos += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                pos: tok_pos,
            });
            continue;
        }

        // Number
        if c.is_ascii_digit() || (c == '-' && pos + 1 < chars.len() && chars[pos + 1].is_ascii_digit())
        {
            let start = pos;
            if c == '-' {
                pos += 1;
            }
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let mut is_float = false;
            if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                is_float = true;
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text: String = chars[start..pos].iter().collect();
            let token = if is_float {
                Token::Float(
                    text.parse::<f64>()
                        .map_err(|_| syntax(tok_pos, "invalid number literal"))?,
                )
            } else {
                Token::Int(
                    text.parse::<i64>()
                        .map_err(|_| syntax(tok_pos, "integer literal out of range"))?,
                )
            };
            tokens.push(Spanned {
                token,
                pos: tok_pos,
            });
            continue;
        }

        // Identifier
        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Word(chars[start..pos].iter().collect()),
                pos: tok_pos,
            });
            continue;
        }

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '.' => Token::Dot,
            other => return Err(syntax(pos, format!("unexpected character '{}'", other))),
        };
        tokens.push(Spanned {
            token,
            pos: tok_pos,
        });
        pos += 1;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        pos: chars.len(),
    });
    Ok(tokens)
}

fn is_path_delimiter(c: char) -> bool {
    c == ',' || c == '(' || c == ')' || c.is_whitespace()
}

// ── Parser ──────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Spanned>,
    idx: usize,
}

impl Parser {
    fn peek(&self) -> (&Token, usize) {
        let spanned = &self.tokens[self.idx.min(self.tokens.len() - 1)];
        (&spanned.token, spanned.pos)
    }

    fn advance(&mut self) -> Spanned {
        let spanned = self.tokens[self.idx.min(self.tokens.len() - 1)].clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        spanned
    }

    fn parse_call(&mut self) -> Result<IntrinsicCall, EvalError> {
        let name = self.parse_dotted_name()?;
        match self.advance() {
            Spanned {
                token: Token::LParen,
                ..
            } => {}
            Spanned { pos, .. } => return Err(syntax(pos, "expected '(' after function name")),
        }

        let mut args = Vec::new();
        if matches!(self.peek().0, Token::RParen) {
            self.advance();
            return Ok(IntrinsicCall { name, args });
        }
        loop {
            args.push(self.parse_arg()?);
            match self.advance() {
                Spanned {
                    token: Token::Comma,
                    ..
                } => continue,
                Spanned {
                    token: Token::RParen,
                    ..
                } => break,
                Spanned { pos, .. } => {
                    return Err(syntax(pos, "expected ',' or ')' in argument list"))
                }
            }
        }
        Ok(IntrinsicCall { name, args })
    }

    fn parse_dotted_name(&mut self) -> Result<String, EvalError> {
        let mut name = match self.advance() {
            Spanned {
                token: Token::Word(w),
                ..
            } => w,
            Spanned { pos, .. } => return Err(syntax(pos, "expected function name")),
        };
        while matches!(self.peek().0, Token::Dot) {
            self.advance();
            match self.advance() {
                Spanned {
                    token: Token::Word(w),
                    ..
                } => {
                    name.push('.');
                    name.push_str(&w);
                }
                Spanned { pos, .. } => return Err(syntax(pos, "expected name after '.'")),
            }
        }
        Ok(name)
    }

    fn parse_arg(&mut self) -> Result<IntrinsicArg, EvalError> {
        match self.peek() {
            (Token::Word(_), _) => Ok(IntrinsicArg::Call(self.parse_call()?)),
            _ => match self.advance() {
                Spanned {
                    token: Token::Path(p),
                    ..
                } => {
                    if let Some(rest) = p.strip_prefix("$$") {
                        Ok(IntrinsicArg::ContextPath(format!("${}", rest)))
                    } else {
                        Ok(IntrinsicArg::Path(p))
                    }
                }
                Spanned {
                    token: Token::Str(s),
                    ..
                } => Ok(IntrinsicArg::Str(s)),
                Spanned {
                    token: Token::Int(i),
                    ..
                } => Ok(IntrinsicArg::Int(i)),
                Spanned {
                    token: Token::Float(f),
                    ..
                } => Ok(IntrinsicArg::Float(f)),
                Spanned { pos, .. } => Err(syntax(pos, "expected argument")),
            },
        }
    }
}
