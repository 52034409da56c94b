//! # CCL Lexer
//!
//! Byte stream to token stream with source positions. The lexer is
//! deliberately forgiving: unrecognized characters are skipped, an
//! unterminated string literal runs to end of input, and runs of
//! newlines collapse into a single `Newline` token. Syntax rejection is
//! the parser's job.

use crate::token::{Token, TokenKind};

/// Keyword table, matched case-insensitively. All time-unit spellings
/// share the `Seconds` class; the concrete unit survives in the token
/// value for period conversion.
fn keyword_kind(lower: &str) -> Option<TokenKind> {
    Some(match lower {
        "permit" => TokenKind::Permit,
        "deny" => TokenKind::Deny,
        "require" => TokenKind::Require,
        "limit" => TokenKind::Limit,
        "on" => TokenKind::On,
        "when" => TokenKind::When,
        "severity" => TokenKind::Severity,
        "per" => TokenKind::Per,
        "second" | "seconds" | "minute" | "minutes" | "hour" | "hours" | "day" | "days" => {
            TokenKind::Seconds
        }
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        _ => return None,
    })
}

/// Word-form operators, matched case-sensitively (before keyword
/// normalization).
fn is_word_operator(ident: &str) -> bool {
    matches!(
        ident,
        "contains" | "not_contains" | "in" | "not_in" | "matches" | "starts_with" | "ends_with"
    )
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        // Tabs advance one column, like any other character.
        self.column += 1;
        ch
    }

    fn push(&mut self, kind: TokenKind, value: impl Into<String>, line: u32, column: u32) {
        self.tokens.push(Token::new(kind, value, line, column));
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            match ch {
                // Spaces, tabs, and carriage returns are insignificant.
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => self.lex_newline(),
                '#' => self.lex_comment(),
                '\'' => self.lex_string(),
                '(' => self.lex_single(TokenKind::LParen),
                ')' => self.lex_single(TokenKind::RParen),
                '[' => self.lex_single(TokenKind::LBracket),
                ']' => self.lex_single(TokenKind::RBracket),
                ',' => self.lex_single(TokenKind::Comma),
                '!' if self.peek_at(1) == Some('=') => self.lex_two_char_operator("!="),
                '<' if self.peek_at(1) == Some('=') => self.lex_two_char_operator("<="),
                '>' if self.peek_at(1) == Some('=') => self.lex_two_char_operator(">="),
                '<' => self.lex_one_char_operator("<"),
                '>' => self.lex_one_char_operator(">"),
                '=' => self.lex_one_char_operator("="),
                '*' => self.lex_wildcard(),
                '0'..='9' => self.lex_number(),
                c if is_ident_start(c) => self.lex_identifier(),
                '.' => self.lex_single(TokenKind::Dot),
                '/' => self.lex_bare_path(),
                // Anything else is silently skipped.
                _ => {
                    self.advance();
                }
            }
        }
        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, "", line, column);
        self.tokens
    }

    fn lex_single(&mut self, kind: TokenKind) {
        let (line, column) = (self.line, self.column);
        let ch = self.advance();
        self.push(kind, ch.to_string(), line, column);
    }

    fn lex_newline(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance();
        self.line += 1;
        self.column = 1;
        // Collapse runs: emit only when the previous token is not already
        // a newline, and never at the start of input.
        if matches!(self.tokens.last(), Some(t) if t.kind != TokenKind::Newline) {
            self.push(TokenKind::Newline, "\n", line, column);
        }
    }

    fn lex_comment(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut comment = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment.push(self.advance());
        }
        self.push(TokenKind::Comment, comment, line, column);
    }

    fn lex_string(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c == '\'' {
                break;
            }
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
            s.push(self.advance());
        }
        if self.peek().is_some() {
            self.advance(); // closing quote; an unterminated literal runs to EOF
        }
        self.push(TokenKind::Str, s, line, column);
    }

    fn lex_two_char_operator(&mut self, op: &str) {
        let (line, column) = (self.line, self.column);
        self.advance();
        self.advance();
        self.push(TokenKind::Operator, op, line, column);
    }

    fn lex_one_char_operator(&mut self, op: &str) {
        let (line, column) = (self.line, self.column);
        self.advance();
        self.push(TokenKind::Operator, op, line, column);
    }

    fn lex_wildcard(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance();
        if self.peek() == Some('*') {
            self.advance();
            self.push(TokenKind::DoubleWildcard, "**", line, column);
        } else {
            self.push(TokenKind::Wildcard, "*", line, column);
        }
    }

    fn lex_number(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut num = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            num.push(self.advance());
        }
        self.push(TokenKind::Number, num, line, column);
    }

    fn lex_identifier(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_part(c) {
                break;
            }
            ident.push(self.advance());
        }

        if is_word_operator(&ident) {
            self.push(TokenKind::Operator, ident, line, column);
            return;
        }

        if let Some(kind) = keyword_kind(&ident.to_lowercase()) {
            self.push(kind, ident, line, column);
            return;
        }

        self.push(TokenKind::Identifier, ident, line, column);
    }

    /// A bare token starting with `/` is a resource path; it consumes
    /// everything up to the next whitespace and lexes as a string.
    fn lex_bare_path(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut path = String::new();
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                break;
            }
            path.push(self.advance());
        }
        self.push(TokenKind::Str, path, line, column);
    }
}

/// Tokenize CCL source into a token vector ending with `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_permit_statement() {
        let tokens = tokenize("permit read on '/data'");
        let expected = [
            (TokenKind::Permit, "permit"),
            (TokenKind::Identifier, "read"),
            (TokenKind::On, "on"),
            (TokenKind::Str, "/data"),
            (TokenKind::Eof, ""),
        ];
        assert_eq!(tokens.len(), expected.len());
        for (tok, (kind, value)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(tok.kind, *kind);
            assert_eq!(tok.value, *value);
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("PERMIT Read ON '/x'"),
            vec![
                TokenKind::Permit,
                TokenKind::Identifier,
                TokenKind::On,
                TokenKind::Str,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn word_operators_are_case_sensitive() {
        let tokens = tokenize("contains Contains");
        assert_eq!(tokens[0].kind, TokenKind::Operator);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn newline_runs_collapse() {
        let tokens = tokenize("permit\n\n\ndeny");
        let newlines = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn leading_newlines_produce_no_token() {
        let tokens = tokenize("\n\npermit");
        assert_eq!(tokens[0].kind, TokenKind::Permit);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("permit x\ndeny y");
        let deny = tokens.iter().find(|t| t.kind == TokenKind::Deny).unwrap();
        assert_eq!(deny.line, 2);
        assert_eq!(deny.column, 1);
        let y = &tokens[tokens.len() - 2];
        assert_eq!(y.value, "y");
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 6);
    }

    #[test]
    fn tabs_advance_one_column() {
        let tokens = tokenize("\tx");
        assert_eq!(tokens[0].value, "x");
        assert_eq!(tokens[0].column, 2);
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = tokenize("# a comment\npermit");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].value, "# a comment");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Permit);
    }

    #[test]
    fn single_quoted_string_has_no_escapes() {
        let tokens = tokenize(r"'a\b'");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].value, r"a\b");
    }

    #[test]
    fn unterminated_string_runs_to_eof() {
        let tokens = tokenize("'never closed");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].value, "never closed");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn bare_slash_path_lexes_as_string() {
        let tokens = tokenize("permit read on /data/users");
        let path = &tokens[3];
        assert_eq!(path.kind, TokenKind::Str);
        assert_eq!(path.value, "/data/users");
    }

    #[test]
    fn bare_path_stops_at_whitespace() {
        let tokens = tokenize("/a/b severity");
        assert_eq!(tokens[0].value, "/a/b");
        assert_eq!(tokens[1].kind, TokenKind::Severity);
    }

    #[test]
    fn wildcards() {
        assert_eq!(
            kinds("* **"),
            vec![TokenKind::Wildcard, TokenKind::DoubleWildcard, TokenKind::Eof]
        );
    }

    #[test]
    fn operators() {
        let tokens = tokenize("!= <= >= < > =");
        let values: Vec<&str> = tokens[..6].iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["!=", "<=", ">=", "<", ">", "="]);
        assert!(tokens[..6].iter().all(|t| t.kind == TokenKind::Operator));
    }

    #[test]
    fn time_units_lex_as_seconds_class_preserving_value() {
        for unit in ["seconds", "second", "minutes", "hours", "days", "Hours"] {
            let tokens = tokenize(unit);
            assert_eq!(tokens[0].kind, TokenKind::Seconds, "unit {unit}");
            assert_eq!(tokens[0].value, unit);
        }
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(
            kinds("permit @ ; read"),
            vec![TokenKind::Permit, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn dotted_action_lexes_as_ident_dot_ident() {
        assert_eq!(
            kinds("file.read"),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn array_tokens() {
        assert_eq!(
            kinds("['a', 'b']"),
            vec![
                TokenKind::LBracket,
                TokenKind::Str,
                TokenKind::Comma,
                TokenKind::Str,
                TokenKind::RBracket,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }
}
