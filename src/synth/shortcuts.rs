use std::collections::{BTreeMap, HashSet};

use super::scan::{Token, TokenKind, follows_dot, next_is_punct};

/// Built-in single-letter package abbreviations.
pub const DEFAULT_ALIASES: &[(char, &str)] = &[('S', "strings"), ('M', "math"), ('C', "strconv")];

const REGEX_SHORTCUT: &str = "R";

/// Single uppercase letter -> short package name, e.g. `S` -> `strings`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<char, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(letter, pkg)| (*letter, pkg.to_string()))
                .collect(),
        }
    }
}

impl AliasTable {
    #[cfg(test)]
    fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an alias. The key must be a single ASCII uppercase letter
    /// other than the regex shortcut `R`.
    pub fn insert(&mut self, key: &str, package: &str) -> anyhow::Result<()> {
        let mut chars = key.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => c,
            _ => anyhow::bail!("alias `{key}` must be a single uppercase letter"),
        };
        if key == REGEX_SHORTCUT {
            anyhow::bail!("alias `R` is reserved for the regexp shortcut");
        }
        if package.is_empty() || !package.chars().all(|c| c.is_alphanumeric() || c == '_') {
            anyhow::bail!("alias `{key}` must name a package, got `{package}`");
        }
        self.entries.insert(letter, package.to_string());
        Ok(())
    }

    pub fn get(&self, letter: char) -> Option<&str> {
        self.entries.get(&letter).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Names the text binds with `:=`, including every name of a `a, b :=` list.
pub fn declared_names(tokens: &[Token]) -> HashSet<String> {
    let mut names = HashSet::new();
    for (idx, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Define {
            continue;
        }
        for prev in tokens[..idx].iter().rev() {
            match &prev.kind {
                TokenKind::Ident => {
                    names.insert(prev.text.clone());
                }
                TokenKind::Space | TokenKind::Punct(',') => {}
                _ => break,
            }
        }
    }
    names
}

/// Expand `R(` into `regexp.MustCompile(` and single-letter aliases such as
/// `S.` into `strings.`. Only a bare letter heading a selector is expanded:
/// `x.S.y`, `SS.y` and letters the user declared locally are left alone.
pub fn expand_shortcuts(tokens: &mut Vec<Token>, aliases: &AliasTable) {
    let src: &[Token] = tokens.as_slice();
    let declared = declared_names(src);
    let mut out = Vec::with_capacity(src.len());
    for (idx, tok) in src.iter().enumerate() {
        let candidate = tok.is_ident() && !follows_dot(src, idx) && !declared.contains(&tok.text);
        if candidate && tok.text == REGEX_SHORTCUT && next_is_punct(src, idx, '(') {
            out.push(Token::ident("regexp"));
            out.push(Token::punct('.'));
            out.push(Token::ident("MustCompile"));
            continue;
        }
        if candidate && next_is_punct(src, idx, '.') {
            let mut chars = tok.text.chars();
            if let (Some(letter), None) = (chars.next(), chars.next())
                && let Some(pkg) = aliases.get(letter)
            {
                out.push(Token::ident(pkg));
                continue;
            }
        }
        out.push(tok.clone());
    }
    *tokens = out;
}
