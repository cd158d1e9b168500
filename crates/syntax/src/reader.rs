use crate::token::Token;

/// Token source consumed by the parser and the recovery engine.
///
/// Peeking never mutates; only `read` advances. Lookahead offsets are
/// one-based: `peek_n(1)` is the same token as `peek()`. Reads and peeks past
/// the end of input keep yielding the EOF token.
pub trait TokenReader {
    fn peek(&self) -> &Token {
        self.peek_n(1)
    }

    fn peek_n(&self, k: usize) -> &Token;

    fn read(&mut self) -> Token;

    /// The token consumed most recently, if any.
    fn previous(&self) -> Option<&Token>;

    /// Number of tokens consumed so far.
    fn current_index(&self) -> usize;
}

/// `TokenReader` over a fully lexed token vector.
pub struct BufferedTokenReader {
    tokens: Vec<Token>,
    pos: usize,
}

impl BufferedTokenReader {
    /// `tokens` should end with an EOF token; one is appended if missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != crate::token::SyntaxKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        BufferedTokenReader { tokens, pos: 0 }
    }

    fn last(&self) -> usize {
        self.tokens.len() - 1
    }
}

impl TokenReader for BufferedTokenReader {
    fn peek_n(&self, k: usize) -> &Token {
        let idx = self.pos + k.max(1) - 1;
        &self.tokens[idx.min(self.last())]
    }

    fn read(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.last())].clone();
        if self.pos < self.last() {
            self.pos += 1;
        }
        t
    }

    fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).map(|idx| &self.tokens[idx])
    }

    fn current_index(&self) -> usize {
        self.pos
    }
}
