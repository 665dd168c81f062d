//! Tokenizer: turns source text into a flat stream of [`Token`]s.
//!
//! Produces tokens lazily on demand via [`Lexer::next_token`]; [`tokenize`]
//! drains a [`Lexer`] into a `Vec<Token>` for the parser to walk with simple
//! index-based lookahead.

use crate::error::{CompileError, Position};

const KEYWORDS: &[&str] = &[
    "int", "char", "void", "return", "if", "else", "while", "for", "struct", "enum", "break",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Keyword,
    Identifier,
    Number,
    String,
    CharLit,
    Operator,
    Separator,
}

/// A single lexeme with its source position.
///
/// `text` carries the literal spelling (already escape-resolved for string
/// and char literals); callers compare it directly rather than re-deriving
/// a value, matching how the parser consumes tokens.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// Resolve a single backslash escape character to the character it denotes.
/// Any character not in the known set passes through literally.
fn resolve_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        '\\' => '\\',
        '0' => '\0',
        '"' => '"',
        '\'' => '\'',
        other => other,
    }
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    _source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            _source: source,
        }
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        if self.pos >= self.chars.len() {
            return '\0';
        }
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_whitespace() {
                self.advance();
            }

            if self.peek() == '/' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                while self.peek() != '\n' && self.peek() != '\0' {
                    self.advance();
                }
                continue;
            }

            if self.peek() == '/' && self.peek_next() == '*' {
                self.advance();
                self.advance();
                while !(self.peek() == '*' && self.peek_next() == '/') && self.peek() != '\0' {
                    self.advance();
                }
                if self.peek() == '*' {
                    self.advance();
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, CompileError> {
        self.advance(); // opening quote
        let mut value = String::new();
        while self.peek() != '"' && self.peek() != '\0' {
            let mut c = self.advance();
            if c == '\\' {
                c = resolve_escape(self.advance());
            }
            value.push(c);
        }
        if self.peek() != '"' {
            return Err(CompileError::lex(
                Position::new(line, column),
                "unterminated string literal",
            ));
        }
        self.advance(); // closing quote
        Ok(Token::new(TokenKind::String, value, line, column))
    }

    fn lex_char_lit(&mut self, line: usize, column: usize) -> Result<Token, CompileError> {
        self.advance(); // opening quote
        if self.peek() == '\0' {
            return Err(CompileError::lex(
                Position::new(line, column),
                "unterminated character literal",
            ));
        }
        let c = if self.peek() == '\\' {
            self.advance();
            resolve_escape(self.advance())
        } else {
            self.advance()
        };
        if self.peek() != '\'' {
            return Err(CompileError::lex(
                Position::new(line, column),
                "unterminated character literal",
            ));
        }
        self.advance(); // closing quote
        Ok(Token::new(TokenKind::CharLit, c.to_string(), line, column))
    }

    /// Produce the next token, or a token of kind [`TokenKind::Eof`] once the
    /// source is exhausted.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let c = self.peek();

        if c == '\0' {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        }

        if c == '"' {
            return self.lex_string(line, column);
        }

        if c == '\'' {
            return self.lex_char_lit(line, column);
        }

        if c.is_ascii_digit() {
            let mut text = String::new();
            while self.peek().is_ascii_digit() {
                text.push(self.advance());
            }
            return Ok(Token::new(TokenKind::Number, text, line, column));
        }

        if c.is_alphabetic() || c == '_' {
            let mut text = String::new();
            while self.peek().is_alphanumeric() || self.peek() == '_' {
                text.push(self.advance());
            }
            let kind = if KEYWORDS.contains(&text.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            return Ok(Token::new(kind, text, line, column));
        }

        if "+-*/%=<>!&|".contains(c) {
            self.advance();
            let next = self.peek();
            let two_char = match (c, next) {
                ('=', '=') => Some("=="),
                ('!', '=') => Some("!="),
                ('<', '=') => Some("<="),
                ('>', '=') => Some(">="),
                ('&', '&') => Some("&&"),
                ('|', '|') => Some("||"),
                _ => None,
            };
            if let Some(text) = two_char {
                self.advance();
                return Ok(Token::new(TokenKind::Operator, text, line, column));
            }
            return Ok(Token::new(
                TokenKind::Operator,
                c.to_string(),
                line,
                column,
            ));
        }

        if "(){}[];,.".contains(c) {
            self.advance();
            return Ok(Token::new(
                TokenKind::Separator,
                c.to_string(),
                line,
                column,
            ));
        }

        Err(CompileError::lex(
            Position::new(line, column),
            format!("unexpected character '{c}'"),
        ))
    }
}

/// Drain a [`Lexer`] over `source` into a token vector ending in a single
/// [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_simple_function() {
        let tokens = tokenize("int main() { return 0; }").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Separator,
                TokenKind::Separator,
                TokenKind::Separator,
                TokenKind::Keyword,
                TokenKind::Number,
                TokenKind::Separator,
                TokenKind::Separator,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_are_greedy() {
        let tokens = tokenize("a <= b && c == d").unwrap();
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["<=", "&&", "=="]);
    }

    #[test]
    fn string_literal_resolves_escapes() {
        let tokens = tokenize("\"a\\nb\\\"c\"").unwrap();
        assert_eq!(tokens[0].text, "a\nb\"c");
    }

    #[test]
    fn unknown_escape_passes_through_literally() {
        let tokens = tokenize("\"\\q\"").unwrap();
        assert_eq!(tokens[0].text, "q");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("\"abc").unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = tokenize("int\nx;").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 1);
    }

    #[test]
    fn percent_is_a_single_char_operator() {
        let tokens = tokenize("a % b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[1].text, "%");
    }

    #[test]
    fn line_comment_is_skipped() {
        let tokens = tokenize("int x; // trailing comment\nint y;").unwrap();
        assert_eq!(kinds(&tokens).len(), 7); // int x ; int y ; EOF
    }

    #[test]
    fn block_comment_is_skipped() {
        let tokens = tokenize("int /* inline */ x;").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Separator,
                TokenKind::Eof
            ]
        );
    }
}
