//! Expression tokenizer

use crate::error::UtilityError;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    /// Function or constant name, lowercased
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

pub fn tokenize(expr: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                let mut seen_dot = false;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                        seen_dot |= c == '.';
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expr[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| UtilityError::Malformed(format!("bad number '{literal}'")))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(expr[start..end].to_ascii_lowercase()));
            }
            _ => {
                let token = match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    other => return Err(UtilityError::InvalidCharacter(other)),
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("2.5 * sqrt(16) - PI").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.5),
                Token::Star,
                Token::Ident("sqrt".to_string()),
                Token::LParen,
                Token::Number(16.0),
                Token::RParen,
                Token::Minus,
                Token::Ident("pi".to_string()),
            ]
        );
    }

    #[test]
    fn test_identifiers_keep_digits() {
        assert_eq!(
            tokenize("log10(100)").unwrap()[0],
            Token::Ident("log10".to_string())
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            tokenize("2 $ 3").unwrap_err(),
            UtilityError::InvalidCharacter('$')
        );
    }

    #[test]
    fn test_lone_dot_is_malformed() {
        assert!(matches!(
            tokenize("1 + .").unwrap_err(),
            UtilityError::Malformed(_)
        ));
    }
}
