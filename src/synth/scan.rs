#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    StringLit,
    RuneLit,
    RawString,
    /// A quote, rune or raw string that runs off the end of the input.
    Unterminated,
    Define,
    Punct(char),
    Space,
    Other,
}

/// A lexeme of the expression text. Joining every token's text gives back the
/// input byte for byte, so rewrites are done by editing tokens and re-joining.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn ident(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Ident, text)
    }

    pub fn punct(ch: char) -> Self {
        Self::new(TokenKind::Punct(ch), ch.to_string())
    }

    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_space(&self) -> bool {
        self.kind == TokenKind::Space
    }
}

pub struct Scanner<'a> {
    src: &'a str,
    idx: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, idx: 0 }
    }

    pub fn scan_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.idx;
        let ch = self.peek_char()?;
        let kind = if is_ident_start(ch) {
            self.skip_while(is_ident_continue);
            TokenKind::Ident
        } else if ch.is_ascii_digit() {
            self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            TokenKind::Number
        } else if ch.is_whitespace() {
            self.skip_while(char::is_whitespace);
            TokenKind::Space
        } else {
            match ch {
                '"' => self.read_quoted('"', TokenKind::StringLit),
                '\'' => self.read_quoted('\'', TokenKind::RuneLit),
                '`' => self.read_raw_string(),
                ':' if self.peek_next_char() == Some('=') => {
                    self.advance();
                    self.advance();
                    TokenKind::Define
                }
                c if c.is_ascii_punctuation() => {
                    self.advance();
                    TokenKind::Punct(c)
                }
                _ => {
                    self.advance();
                    TokenKind::Other
                }
            }
        };
        Some(Token::new(kind, &self.src[start..self.idx]))
    }

    fn read_quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        self.advance(); // opening quote
        while let Some(ch) = self.peek_char() {
            self.advance();
            if ch == '\\' {
                self.advance();
            } else if ch == quote {
                return kind;
            }
        }
        TokenKind::Unterminated
    }

    fn read_raw_string(&mut self) -> TokenKind {
        self.advance();
        while let Some(ch) = self.peek_char() {
            self.advance();
            if ch == '`' {
                return TokenKind::RawString;
            }
        }
        TokenKind::Unterminated
    }

    fn skip_while<F>(&mut self, f: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(ch) = self.peek_char() {
            if !f(ch) {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.idx += ch.len_utf8();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.idx..].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut chars = self.src[self.idx..].chars();
        chars.next();
        chars.next()
    }
}

pub fn scan(src: &str) -> Vec<Token> {
    Scanner::new(src).scan_all()
}

pub fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Strip leading and trailing whitespace tokens.
pub fn trim(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| !t.is_space())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !t.is_space())
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

/// True when the token before `idx` is a `.`, i.e. `tokens[idx]` is a member
/// name rather than the head of a selector chain.
pub fn follows_dot(tokens: &[Token], idx: usize) -> bool {
    idx > 0 && tokens[idx - 1].is_punct('.')
}

pub fn next_is_punct(tokens: &[Token], idx: usize, ch: char) -> bool {
    tokens.get(idx + 1).is_some_and(|t| t.is_punct(ch))
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
