use super::scan::{self, Token, TokenKind};

/// Leading statements, the trailing expression and what the assignments bound.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Split {
    pub statements: Vec<String>,
    pub final_expr: String,
    pub receivers: Vec<String>,
    pub guard_injected: bool,
}

/// `name := ...` or `name, second := ...` at the head of a statement.
#[derive(Debug, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub name: &'a str,
    pub second: Option<&'a str>,
}

/// Cut the token stream at every `;` that is not nested inside `()`, `[]` or
/// `{}`. There is always at least one segment.
pub fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::Punct('(' | '[' | '{') => depth += 1,
            TokenKind::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
            TokenKind::Punct(';') if depth == 0 => {
                segments.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&tokens[start..]);
    segments
}

/// Recognize a short variable declaration binding one or two names. The first
/// name must start with a lowercase ASCII letter; the second may also be `_`.
pub fn match_assignment(stmt: &[Token]) -> Option<Assignment<'_>> {
    let mut toks = stmt.iter().filter(|t| !t.is_space());
    let first = toks.next()?;
    if !first.is_ident() || !starts_lowercase(&first.text) {
        return None;
    }
    let next = toks.next()?;
    if next.kind == TokenKind::Define {
        return Some(Assignment {
            name: &first.text,
            second: None,
        });
    }
    if !next.is_punct(',') {
        return None;
    }
    let second = toks.next()?;
    let second_ok = second.is_ident()
        && (starts_lowercase(&second.text) || second.text.starts_with('_'));
    if !second_ok || toks.next()?.kind != TokenKind::Define {
        return None;
    }
    Some(Assignment {
        name: &first.text,
        second: Some(&second.text),
    })
}

/// Naming convention for error results: starts with `e` and is either short
/// (`e`, `er`, `err`, `ex`) or prefixed `err` (`errParse`). Purely lexical, so a
/// short non-error name like `el` is also treated as an error.
pub fn is_error_name(name: &str) -> bool {
    name.starts_with('e') && (name.chars().count() <= 3 || name.starts_with("err"))
}

pub fn error_guard(name: &str) -> String {
    format!("if {name} != nil {{ log.Fatal({name}) }}")
}

/// Split `a; b; expr` into leading statements and the final expression,
/// recording receivers and injecting a fail-fast guard after each assignment
/// whose second name is an error by convention.
pub fn split_statements(tokens: &[Token]) -> Split {
    let mut segments = split_top_level(tokens);
    let last = segments.pop().unwrap_or_default();
    let mut split = Split {
        final_expr: scan::join(scan::trim(last)),
        ..Split::default()
    };
    for segment in segments {
        let stmt = scan::trim(segment);
        if stmt.is_empty() {
            continue;
        }
        split.statements.push(scan::join(stmt));
        let Some(assign) = match_assignment(stmt) else {
            continue;
        };
        if !split.receivers.iter().any(|r| r == assign.name) {
            split.receivers.push(assign.name.to_string());
        }
        if let Some(second) = assign.second
            && is_error_name(second)
        {
            split.statements.push(error_guard(second));
            split.guard_injected = true;
        }
    }
    split
}

fn starts_lowercase(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{Assignment, is_error_name, match_assignment, split_statements, split_top_level};
    use crate::synth::scan::{join, scan};

    #[test]
    fn no_semicolon_means_no_statements() {
        let split = split_statements(&scan("  strings.Split(_s1, _s2) "));
        assert!(split.statements.is_empty());
        assert!(split.receivers.is_empty());
        assert_eq!(split.final_expr, "strings.Split(_s1, _s2)");
        assert!(!split.guard_injected);
    }

    #[test]
    fn leading_assignment_becomes_receiver() {
        let split = split_statements(&scan("rx := regexp.MustCompile(_s1); rx.MatchString(_s2)"));
        assert_eq!(split.statements, vec!["rx := regexp.MustCompile(_s1)"]);
        assert_eq!(split.final_expr, "rx.MatchString(_s2)");
        assert_eq!(split.receivers, vec!["rx"]);
    }

    #[test]
    fn error_result_gets_exactly_one_guard() {
        let split = split_statements(&scan("x, err := strconv.Atoi(_s1); x * 2"));
        assert_eq!(
            split.statements,
            vec![
                "x, err := strconv.Atoi(_s1)",
                "if err != nil { log.Fatal(err) }",
            ]
        );
        assert!(split.guard_injected);
        assert_eq!(split.receivers, vec!["x"]);
    }

    #[test]
    fn non_error_second_value_gets_no_guard() {
        let split = split_statements(&scan("x, elapsed := f(); x"));
        assert_eq!(split.statements, vec!["x, elapsed := f()"]);
        assert!(!split.guard_injected);
    }

    #[test]
    fn short_e_names_are_guarded_by_convention() {
        // `el` is not an error value, but the convention cannot tell.
        let split = split_statements(&scan("v, el := m[k]; v"));
        assert_eq!(split.statements.len(), 2);
        assert!(split.guard_injected);
        assert!(is_error_name("e"));
        assert!(is_error_name("errParse"));
        assert!(!is_error_name("entries"));
        assert!(!is_error_name("ok"));
    }

    #[test]
    fn guards_follow_their_statement_in_order() {
        let split = split_statements(&scan("a, e1 := f(); b := 2; c, err := g(a); a+b+c"));
        assert_eq!(
            split.statements,
            vec![
                "a, e1 := f()",
                "if e1 != nil { log.Fatal(e1) }",
                "b := 2",
                "c, err := g(a)",
                "if err != nil { log.Fatal(err) }",
            ]
        );
        assert_eq!(split.receivers, vec!["a", "b", "c"]);
    }

    #[test]
    fn nested_semicolons_do_not_split() {
        let toks = scan("f := func() int { x := 1; return x }; f()");
        let segments = split_top_level(&toks);
        assert_eq!(segments.len(), 2);
        assert_eq!(join(segments[0]), "f := func() int { x := 1; return x }");
    }

    #[test]
    fn empty_statements_are_dropped_and_trailing_semicolon_leaves_no_expression() {
        let split = split_statements(&scan("x := 1;; fmt.Println(x);"));
        assert_eq!(split.statements, vec!["x := 1", "fmt.Println(x)"]);
        assert_eq!(split.final_expr, "");
    }

    #[test]
    fn assignment_recognition_is_anchored_and_shape_checked() {
        assert_eq!(
            match_assignment(&scan("x ,  err:= f()")),
            Some(Assignment {
                name: "x",
                second: Some("err"),
            })
        );
        assert_eq!(
            match_assignment(&scan("v, _ := f()")),
            Some(Assignment {
                name: "v",
                second: Some("_"),
            })
        );
        assert_eq!(match_assignment(&scan("X := 1")), None);
        assert_eq!(match_assignment(&scan("x = 1")), None);
        assert_eq!(match_assignment(&scan("a, b, c := f()")), None);
        assert_eq!(match_assignment(&scan("fmt.Println(y := 1)")), None);
    }
}
