use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::value::Value;

/// The generic statement tree every grammar starts from: the file's
/// top-level assignments and `OBJECT` blocks, before any class-specific
/// structure is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment { key: String, value: Value, line: u32 },
    Object { name: String, statements: Vec<Statement>, line: u32 },
}

impl Statement {
    pub fn line(&self) -> u32 {
        match self {
            Statement::Assignment { line, .. } | Statement::Object { line, .. } => *line,
        }
    }
}

/// Parses a whole catalog file into its statement tree. This is the
/// grammar shared by all catalog classes; the per-class grammars consume
/// its output.
pub fn parse_label(text: &str, file: &str) -> Result<Label, ParseError> {
    let tokens = tokenize(text, file)?;
    let mut cursor = Cursor { tokens, position: 0, file };
    let statements = cursor.parse_statements(None)?;
    Ok(Label { statements })
}

struct Cursor<'a> {
    tokens: Vec<Token>,
    position: usize,
    file: &'a str,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn last_position(&self) -> (u32, u32) {
        self.tokens
            .last()
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1))
    }

    /// Parses statements until `END`, `END_OBJECT` (left for the caller
    /// when inside a block), or the end of input. `enclosing` names the
    /// open OBJECT, for error reporting.
    fn parse_statements(&mut self, enclosing: Option<&str>) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        loop {
            let Some(token) = self.peek().cloned() else {
                if let Some(name) = enclosing {
                    let (line, _) = self.last_position();
                    return Err(ParseError::UnclosedObject {
                        file: self.file.to_string(),
                        line,
                        name: name.to_string(),
                    });
                }
                return Ok(statements);
            };

            if token.kind != TokenKind::Word {
                return Err(ParseError::syntax(
                    self.file,
                    token.line,
                    token.column,
                    format!("expected a keyword, found {:?}", token.text),
                ));
            }

            if token.text.eq_ignore_ascii_case("END") {
                self.next();
                if let Some(name) = enclosing {
                    return Err(ParseError::UnclosedObject {
                        file: self.file.to_string(),
                        line: token.line,
                        name: name.to_string(),
                    });
                }
                // Anything after END is ignored, as archive files often
                // carry trailing padding.
                return Ok(statements);
            }

            if token.text.eq_ignore_ascii_case("END_OBJECT") {
                // The caller consumes END_OBJECT; at top level it is stray.
                if enclosing.is_some() {
                    return Ok(statements);
                }
                return Err(ParseError::syntax(
                    self.file,
                    token.line,
                    token.column,
                    "END_OBJECT without a matching OBJECT",
                ));
            }

            if token.text.eq_ignore_ascii_case("OBJECT") {
                statements.push(self.parse_object(&token)?);
                continue;
            }

            statements.push(self.parse_assignment()?);
        }
    }

    fn parse_object(&mut self, object_token: &Token) -> Result<Statement, ParseError> {
        self.next(); // OBJECT
        self.expect(TokenKind::Equals, "=")?;
        let name_token = self.expect(TokenKind::Word, "an object name")?;
        let name = name_token.text.to_ascii_uppercase();

        let statements = self.parse_statements(Some(&name))?;

        // Consume `END_OBJECT [= NAME]`.
        let end = self.expect(TokenKind::Word, "END_OBJECT")?;
        debug_assert!(end.text.eq_ignore_ascii_case("END_OBJECT"));
        if self.peek().map(|t| t.kind) == Some(TokenKind::Equals) {
            self.next();
            let close_name = self.expect(TokenKind::Word, "an object name")?;
            if !close_name.text.eq_ignore_ascii_case(&name) {
                return Err(ParseError::MismatchedEnd {
                    file: self.file.to_string(),
                    line: close_name.line,
                    expected: name,
                    found: close_name.text.to_ascii_uppercase(),
                });
            }
        }

        Ok(Statement::Object {
            name,
            statements,
            line: object_token.line,
        })
    }

    fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
        let key_token = self.expect(TokenKind::Word, "a keyword")?;
        self.expect(TokenKind::Equals, "=")?;
        let value = self.parse_value()?;
        Ok(Statement::Assignment {
            key: key_token.text.to_ascii_uppercase(),
            value,
            line: key_token.line,
        })
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let Some(token) = self.next() else {
            let (line, column) = self.last_position();
            return Err(ParseError::syntax(self.file, line, column, "expected a value"));
        };

        match token.kind {
            TokenKind::QuotedString => Ok(Value::from_quoted(&token.text)),
            TokenKind::QuotedSymbol => Ok(Value::Symbol(token.text)),
            TokenKind::Word => Ok(Value::from_word(&token.text)),
            TokenKind::OpenParen => self.parse_sequence(TokenKind::CloseParen).map(Value::List),
            TokenKind::OpenBrace => self.parse_sequence(TokenKind::CloseBrace).map(Value::Set),
            _ => Err(ParseError::syntax(
                self.file,
                token.line,
                token.column,
                format!("expected a value, found {:?}", token.text),
            )),
        }
    }

    fn parse_sequence(&mut self, close: TokenKind) -> Result<Vec<Value>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(t) if t.kind == close => {
                    self.next();
                    return Ok(items);
                }
                Some(t) if t.kind == TokenKind::Comma => {
                    self.next();
                }
                Some(_) => items.push(self.parse_value()?),
                None => {
                    let (line, column) = self.last_position();
                    return Err(ParseError::syntax(
                        self.file,
                        line,
                        column,
                        "sequence is never closed",
                    ));
                }
            }
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.next() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(ParseError::syntax(
                self.file,
                token.line,
                token.column,
                format!("expected {what}, found {:?}", token.text),
            )),
            None => {
                let (line, column) = self.last_position();
                Err(ParseError::syntax(self.file, line, column, format!("expected {what}")))
            }
        }
    }
}
