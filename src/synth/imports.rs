use tracing::{debug, info};

use super::OutputMode;
use super::scan::{Token, follows_dot, next_is_punct};
use super::suggest::did_you_mean;
use crate::pkg::catalog::ModuleLookup;

pub const PRINT_MODULE: &str = "fmt";
pub const ARGS_MODULE: &str = "os";
pub const LOG_MODULE: &str = "log";
pub const JSON_MODULES: &[&str] = &["json", "bytes"];

/// Identifier the generated program binds to the passthrough arguments.
pub const ARGS_IDENT: &str = "args";

/// Multi-segment standard packages worth knowing without a catalog.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("json", "encoding/json"),
    ("base64", "encoding/base64"),
    ("hex", "encoding/hex"),
    ("csv", "encoding/csv"),
    ("filepath", "path/filepath"),
    ("utf8", "unicode/utf8"),
    ("exec", "os/exec"),
    ("http", "net/http"),
    ("url", "net/url"),
    ("ioutil", "io/ioutil"),
    ("heap", "container/heap"),
    ("list", "container/list"),
    ("sha256", "crypto/sha256"),
    ("md5", "crypto/md5"),
    ("atomic", "sync/atomic"),
];

/// Standard packages whose import path is their short name.
const SINGLE_SEGMENT_STD: &[&str] = &[
    "bufio", "bytes", "cmp", "context", "embed", "errors", "expvar", "flag", "fmt", "hash", "html",
    "image", "io", "iter", "log", "maps", "math", "mime", "net", "os", "path", "plugin", "reflect",
    "regexp", "runtime", "slices", "sort", "strconv", "strings", "sync", "syscall", "testing",
    "time", "unicode", "unsafe",
];

/// Everything besides the qualifiers that decides the import set.
#[derive(Debug)]
pub struct ImportRequest<'a> {
    pub tokens: &'a [Token],
    pub receivers: &'a [String],
    pub prints_result: bool,
    pub uses_args: bool,
    pub output: OutputMode,
    pub guard_injected: bool,
}

/// The qualifier heading a selector at `idx`: an identifier of at least two
/// characters starting with a lowercase ASCII letter, directly followed by `.`
/// and not itself a member of something else.
pub fn qualifier_at(tokens: &[Token], idx: usize) -> Option<&str> {
    let tok = &tokens[idx];
    if !tok.is_ident() || follows_dot(tokens, idx) || !next_is_punct(tokens, idx, '.') {
        return None;
    }
    let mut chars = tok.text.chars();
    let head = chars.next()?;
    if head.is_ascii_lowercase() && chars.next().is_some() {
        Some(tok.text.as_str())
    } else {
        None
    }
}

/// All qualifiers in first-seen order, deduplicated.
pub fn candidate_modules(tokens: &[Token]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for idx in 0..tokens.len() {
        if let Some(name) = qualifier_at(tokens, idx)
            && !out.iter().any(|m| m == name)
        {
            out.push(name.to_string());
        }
    }
    out
}

/// True when the expression reads the passthrough arguments through `args`,
/// unless the user bound `args` themselves.
pub fn references_args(tokens: &[Token], receivers: &[String]) -> bool {
    if receivers.iter().any(|r| r == ARGS_IDENT) {
        return false;
    }
    tokens
        .iter()
        .enumerate()
        .any(|(idx, t)| t.is_ident() && t.text == ARGS_IDENT && !follows_dot(tokens, idx))
}

/// Short package names the program needs, receivers removed, baseline and
/// conditional packages appended, first-seen order.
pub fn required_modules(req: &ImportRequest<'_>) -> Vec<String> {
    let mut mods = candidate_modules(req.tokens);
    if req.prints_result {
        mods.push(PRINT_MODULE.to_string());
    }
    if req.uses_args {
        mods.push(ARGS_MODULE.to_string());
    }
    if req.output.is_structured() {
        mods.extend(JSON_MODULES.iter().map(|m| m.to_string()));
    }
    if req.guard_injected {
        mods.push(LOG_MODULE.to_string());
    }
    let mut seen = Vec::<String>::new();
    for m in mods {
        if req.receivers.contains(&m) || seen.contains(&m) {
            continue;
        }
        seen.push(m);
    }
    seen
}

/// Map a short name to an import path: catalog first, then the built-in table
/// of well-known standard packages, then the short name itself.
pub fn resolve_module(short: &str, catalog: &dyn ModuleLookup) -> String {
    if let Some(full) = catalog.lookup(short) {
        return full.to_string();
    }
    if let Some((_, full)) = WELL_KNOWN.iter().find(|(s, _)| *s == short) {
        return full.to_string();
    }
    if !SINGLE_SEGMENT_STD.contains(&short) {
        let known = catalog
            .short_names()
            .into_iter()
            .chain(SINGLE_SEGMENT_STD.iter().map(|s| s.to_string()));
        match did_you_mean(short, known) {
            Some(hint) => info!("package `{}` is not in the catalog; {}", short, hint),
            None => debug!("package `{}` is not in the catalog; importing as is", short),
        }
    }
    short.to_string()
}

pub fn resolve_imports(req: &ImportRequest<'_>, catalog: &dyn ModuleLookup) -> Vec<String> {
    let modules = required_modules(req);
    debug!(?modules, receivers = ?req.receivers, "inferred packages");
    let mut imports: Vec<String> = Vec::with_capacity(modules.len());
    for m in &modules {
        let path = resolve_module(m, catalog);
        if !imports.contains(&path) {
            imports.push(path);
        }
    }
    imports
}
