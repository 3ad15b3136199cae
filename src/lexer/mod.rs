mod cursor;
#[cfg(test)]
mod lexer_tests;
mod token;

use cursor::Cursor;
pub use token::{Token, TokenKind};

pub type Tokens = Vec<Token>;

fn is_operator_start(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '=' | '!' | '<' | '>' | '&' | '|' | '^' | '~'
    )
}

fn is_two_char_operator(first: char, second: char) -> bool {
    matches!(
        (first, second),
        ('=', '=')
            | ('!', '=')
            | ('<', '=')
            | ('>', '=')
            | ('&', '&')
            | ('|', '|')
            | ('+', '+')
            | ('-', '-')
            | ('<', '<')
            | ('>', '>')
    )
}

fn lex_operator(cursor: &mut Cursor) -> TokenKind {
    let Some(first) = cursor.take() else {
        return TokenKind::Error;
    };
    if let Some(second) = cursor.peek() {
        if is_two_char_operator(first, second) {
            cursor.take();
        }
    }
    TokenKind::Operator
}

fn lex_word(cursor: &mut Cursor) -> TokenKind {
    let start = cursor.pos();
    while cursor.skip_if(|c| c.is_ascii_alphanumeric() || c == '_') {}
    token::classify_word(cursor.slice_from(start))
}

fn lex_number(cursor: &mut Cursor) -> TokenKind {
    while cursor.skip_if(|c| c.is_ascii_digit()) {}
    let has_fraction =
        cursor.peek() == Some('.') && cursor.peek_2nd().filter(char::is_ascii_digit).is_some();
    if has_fraction {
        cursor.take();
        while cursor.skip_if(|c| c.is_ascii_digit()) {}
    }
    TokenKind::Number
}

fn lex_string(cursor: &mut Cursor) -> TokenKind {
    cursor.take();
    while let Some(peek) = cursor.peek() {
        match peek {
            '\\' => {
                cursor.take();
                cursor.take();
            }
            '"' => {
                cursor.take();
                return TokenKind::String;
            }
            // An unterminated literal ends at the line break.
            '\n' => return TokenKind::Error,
            _ => {
                cursor.take();
            }
        }
    }
    TokenKind::Error
}

fn lex_char(cursor: &mut Cursor) -> TokenKind {
    cursor.take();
    match cursor.peek() {
        Some('\\') => {
            cursor.take();
            cursor.take();
        }
        Some('\n') | None => return TokenKind::Error,
        Some(_) => {
            cursor.take();
        }
    }
    if cursor.bump_if('\'') {
        TokenKind::Char
    } else {
        TokenKind::Error
    }
}

fn lex_block_comment(cursor: &mut Cursor) -> TokenKind {
    cursor.take();
    cursor.take();
    while let Some(peek) = cursor.peek() {
        if peek == '*' && cursor.peek_2nd() == Some('/') {
            cursor.take();
            cursor.take();
            return TokenKind::Comment;
        }
        cursor.take();
    }
    TokenKind::Error
}

/// Scans the whole source into a token sequence.
///
/// Total: never fails. Anything that cannot be classified (a stray byte, an
/// unterminated string or comment) becomes a [`TokenKind::Error`] token and
/// scanning continues, so `lex(s)` is deterministic and every byte of input
/// is accounted for by some token's `start..end` range or by whitespace.
pub fn lex(source: &str) -> Tokens {
    let mut tokens = Tokens::new();
    let mut cursor = Cursor::new(source);
    cursor.skip_whitespace();

    while let Some(peek) = cursor.peek() {
        let start = cursor.pos();
        let line = cursor.line();
        let column = cursor.column();
        let kind = match peek {
            '#' => {
                cursor.take_line();
                TokenKind::Preprocessor
            }
            '/' if cursor.peek_2nd() == Some('/') => {
                cursor.take_line();
                TokenKind::Comment
            }
            '/' if cursor.peek_2nd() == Some('*') => lex_block_comment(&mut cursor),
            '"' => lex_string(&mut cursor),
            '\'' => lex_char(&mut cursor),
            '_' | 'a'..='z' | 'A'..='Z' => lex_word(&mut cursor),
            '0'..='9' => lex_number(&mut cursor),
            ';' | ',' | '(' | ')' | '{' | '}' | '[' | ']' | '?' | ':' | '.' => {
                cursor.take();
                TokenKind::Punctuation
            }
            c if is_operator_start(c) => lex_operator(&mut cursor),
            _ => {
                cursor.take();
                TokenKind::Error
            }
        };
        let end = cursor.pos();
        tokens.push(Token {
            kind,
            value: source[start..end].to_owned(),
            start,
            end,
            line,
            column,
        });
        cursor.skip_whitespace();
    }

    tokens
}
