use crate::error::SyntaxError;
use crate::token::{SyntaxKind, Token};

/// Where the lexer is inside string templates.
enum Mode {
    /// Between backticks; `line` is where the template opened.
    Template { line: u32 },
    /// Inside `${ ... }`, counting nested braces.
    Interpolation { depth: usize },
}

/// Split source text into tokens, ending with a single EOF token.
///
/// Characters the lexer cannot classify become `Invalid` tokens so the parser
/// can remove them through recovery. Only unterminated string literals,
/// string templates and block comments are fatal.
pub fn lex(src: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut modes: Vec<Mode> = Vec::new();

    while pos < chars.len() {
        let c = chars[pos];

        if let Some(Mode::Template { .. }) = modes.last() {
            let tok_line = line;
            if c == '`' {
                tokens.push(Token::new(SyntaxKind::Backtick, "`", tok_line));
                modes.pop();
                pos += 1;
                continue;
            }
            if starts_interpolation(&chars, pos) {
                tokens.push(Token::new(SyntaxKind::InterpolationStart, "${", tok_line));
                modes.push(Mode::Interpolation { depth: 0 });
                pos += 2;
                continue;
            }
            let start = pos;
            while pos < chars.len() && chars[pos] != '`' && !starts_interpolation(&chars, pos) {
                if chars[pos] == '\n' {
                    line += 1;
                }
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            tokens.push(Token::new(SyntaxKind::TemplateString, text, tok_line));
            continue;
        }

        // Line comment
        if c == '/' && pos + 1 < chars.len() && chars[pos + 1] == '/' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && pos + 1 < chars.len() && chars[pos + 1] == '*' {
            let start_line = line;
            pos += 2;
            loop {
                if pos >= chars.len() {
                    return Err(SyntaxError::lex(start_line, "unterminated block comment"));
                }
                if chars[pos] == '\n' {
                    line += 1;
                }
                if chars[pos] == '*' && pos + 1 < chars.len() && chars[pos + 1] == '/' {
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            continue;
        }

        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        let tok_line = line;

        // Documentation line
        if c == '#' {
            let start = pos + 1;
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            // Consecutive doc lines form one documentation string.
            match tokens.last_mut() {
                Some(Token {
                    kind: SyntaxKind::DocumentationString,
                    text: prev,
                    ..
                }) => {
                    prev.push('\n');
                    prev.push_str(text.trim());
                }
                _ => tokens.push(Token::new(
                    SyntaxKind::DocumentationString,
                    text.trim(),
                    tok_line,
                )),
            }
            continue;
        }

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() || chars[pos] == '\n' {
                    return Err(SyntaxError::lex(tok_line, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(SyntaxError::lex(tok_line, "unterminated escape in string"));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Token::new(SyntaxKind::StringLiteral, s, tok_line));
            continue;
        }

        // Number
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let mut kind = SyntaxKind::IntLiteral;
            if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                pos += 1; // consume '.'
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
                kind = SyntaxKind::FloatLiteral;
            }
            let s: String = chars[start..pos].iter().collect();
            tokens.push(Token::new(kind, s, tok_line));
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let kind = SyntaxKind::keyword(&word).unwrap_or(SyntaxKind::Identifier);
            tokens.push(Token::new(kind, word, tok_line));
            continue;
        }

        // Two-character operators
        let next = chars.get(pos + 1).copied();
        let pair = match (c, next) {
            ('=', Some('=')) => Some(SyntaxKind::DoubleEqual),
            ('!', Some('=')) => Some(SyntaxKind::NotEqual),
            ('<', Some('=')) => Some(SyntaxKind::Lte),
            ('>', Some('=')) => Some(SyntaxKind::Gte),
            ('&', Some('&')) => Some(SyntaxKind::LogicalAnd),
            ('|', Some('|')) => Some(SyntaxKind::LogicalOr),
            ('=', Some('>')) => Some(SyntaxKind::RightDoubleArrow),
            ('-', Some('>')) => Some(SyntaxKind::RightArrow),
            ('<', Some('-')) => Some(SyntaxKind::LeftArrow),
            _ => None,
        };
        if let Some(kind) = pair {
            tokens.push(Token::new(kind, kind.text(), tok_line));
            pos += 2;
            continue;
        }

        let kind = match c {
            '(' => SyntaxKind::OpenParen,
            ')' => SyntaxKind::CloseParen,
            '{' => SyntaxKind::OpenBrace,
            '}' => SyntaxKind::CloseBrace,
            ';' => SyntaxKind::Semicolon,
            ',' => SyntaxKind::Comma,
            '.' => SyntaxKind::Dot,
            '/' => SyntaxKind::Slash,
            '=' => SyntaxKind::Assign,
            '?' => SyntaxKind::QuestionMark,
            '+' => SyntaxKind::Plus,
            '-' => SyntaxKind::Minus,
            '*' => SyntaxKind::Asterisk,
            '%' => SyntaxKind::Percent,
            '<' => SyntaxKind::Lt,
            '>' => SyntaxKind::Gt,
            '!' => SyntaxKind::Exclamation,
            '[' => SyntaxKind::OpenBracket,
            ']' => SyntaxKind::CloseBracket,
            ':' => SyntaxKind::Colon,
            '|' => SyntaxKind::Pipe,
            '`' => SyntaxKind::Backtick,
            _ => SyntaxKind::Invalid,
        };
        match kind {
            SyntaxKind::Backtick => modes.push(Mode::Template { line: tok_line }),
            SyntaxKind::OpenBrace => {
                if let Some(Mode::Interpolation { depth }) = modes.last_mut() {
                    *depth += 1;
                }
            }
            SyntaxKind::CloseBrace => {
                // The brace that closes `${` hands back to the template text.
                if let Some(Mode::Interpolation { depth: 0 }) = modes.last() {
                    modes.pop();
                } else if let Some(Mode::Interpolation { depth }) = modes.last_mut() {
                    *depth -= 1;
                }
            }
            _ => {}
        }
        tokens.push(Token::new(kind, c.to_string(), tok_line));
        pos += 1;
    }

    if let Some(start_line) = modes.iter().find_map(|m| match m {
        Mode::Template { line } => Some(*line),
        Mode::Interpolation { .. } => None,
    }) {
        return Err(SyntaxError::lex(start_line, "unterminated string template"));
    }

    tokens.push(Token::eof(line));
    Ok(tokens)
}

fn starts_interpolation(chars: &[char], pos: usize) -> bool {
    chars[pos] == '$' && chars.get(pos + 1) == Some(&'{')
}
