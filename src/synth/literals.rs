use super::scan::{self, Token, TokenKind};

/// A string literal hoisted out of the expression into its own declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralBinding {
    pub name: String,
    pub literal: String,
}

impl LiteralBinding {
    pub fn declaration(&self) -> String {
        format!("{} := {}", self.name, self.literal)
    }
}

#[derive(Debug)]
pub struct Extracted {
    pub tokens: Vec<Token>,
    pub bindings: Vec<LiteralBinding>,
}

#[cfg(test)]
impl Extracted {
    fn text(&self) -> String {
        scan::join(&self.tokens)
    }
}

/// Replace each double-quoted literal with `_s1`, `_s2`, ... in source order.
/// Later rewrites only ever see the placeholders, so literal text can never be
/// mistaken for a shortcut, a statement separator or a package qualifier.
pub fn extract_literals(raw: &str) -> Extracted {
    let mut bindings = Vec::new();
    let tokens = scan::scan(raw)
        .into_iter()
        .map(|tok| {
            if tok.kind != TokenKind::StringLit {
                return tok;
            }
            let name = format!("_s{}", bindings.len() + 1);
            bindings.push(LiteralBinding {
                name: name.clone(),
                literal: tok.text,
            });
            Token::ident(name)
        })
        .collect();
    Extracted { tokens, bindings }
}
