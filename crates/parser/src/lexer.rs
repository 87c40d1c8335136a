use crate::error::ParseError;

/// One lexical token, with the position it started at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Bare word: keyword names, barewords, numbers, dates,
    /// `^POINTER` names.
    Word,
    /// `"…"`; may span multiple lines.
    QuotedString,
    /// `'…'`, an ODL symbol literal.
    QuotedSymbol,
    Equals,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
}

/// Characters that may appear inside a bare word. Catalog files use dashes
/// in identifiers, colons and dots in timestamps, and carets on pointers.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '^' | '+' | '/')
}

/// Tokenizes a whole file. `/* … */` comments and whitespace separate
/// tokens and are discarded.
pub(crate) fn tokenize(input: &str, file: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line: u32 = 1;
    let mut column: u32 = 1;

    macro_rules! bump {
        ($c:expr) => {{
            if $c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }};
    }

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            bump!(c);
            continue;
        }

        // Comment: consume through the closing marker.
        if c == '/' {
            let mut lookahead = chars.clone();
            lookahead.next();
            if lookahead.peek() == Some(&'*') {
                let (start_line, start_column) = (line, column);
                chars.next();
                bump!('/');
                chars.next();
                bump!('*');
                let mut closed = false;
                while let Some(c) = chars.next() {
                    bump!(c);
                    if c == '*' && chars.peek() == Some(&'/') {
                        if let Some(slash) = chars.next() {
                            bump!(slash);
                        }
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(ParseError::syntax(
                        file,
                        start_line,
                        start_column,
                        "comment is never closed",
                    ));
                }
                continue;
            }
        }

        let (start_line, start_column) = (line, column);

        match c {
            '"' | '\'' => {
                let quote = c;
                chars.next();
                bump!(c);
                let mut text = String::new();
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    bump!(inner);
                    if inner == quote {
                        closed = true;
                        break;
                    }
                    text.push(inner);
                }
                if !closed {
                    return Err(ParseError::syntax(
                        file,
                        start_line,
                        start_column,
                        "quoted value is never closed",
                    ));
                }
                let kind = if quote == '"' {
                    TokenKind::QuotedString
                } else {
                    TokenKind::QuotedSymbol
                };
                tokens.push(Token { kind, text, line: start_line, column: start_column });
            }
            '=' | '(' | ')' | '{' | '}' | ',' => {
                chars.next();
                bump!(c);
                let kind = match c {
                    '=' => TokenKind::Equals,
                    '(' => TokenKind::OpenParen,
                    ')' => TokenKind::CloseParen,
                    '{' => TokenKind::OpenBrace,
                    '}' => TokenKind::CloseBrace,
                    _ => TokenKind::Comma,
                };
                tokens.push(Token {
                    kind,
                    text: c.to_string(),
                    line: start_line,
                    column: start_column,
                });
            }
            c if is_word_char(c) => {
                let mut text = String::new();
                while let Some(&w) = chars.peek() {
                    if !is_word_char(w) {
                        break;
                    }
                    text.push(w);
                    chars.next();
                    bump!(w);
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    text,
                    line: start_line,
                    column: start_column,
                });
            }
            other => {
                return Err(ParseError::syntax(
                    file,
                    start_line,
                    start_column,
                    format!("unexpected character {other:?}"),
                ));
            }
        }
    }

    Ok(tokens)
}
