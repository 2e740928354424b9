// Purpose: Turn a terse Go expression into the parts of a complete program.
// Inputs/Outputs: Raw expression text in, RenderPlan (imports/statements/expression) out.
// Invariants: Stages run in a fixed order: literals, shortcuts, statements, imports.
// Gotchas: Every rewrite is lexical; nothing here knows Go types or scopes.

pub mod imports;
pub mod literals;
pub mod render;
pub mod scan;
pub mod shortcuts;
pub mod statements;
pub mod suggest;

use tracing::debug;

use crate::pkg::catalog::ModuleLookup;

use self::imports::ImportRequest;
use self::shortcuts::AliasTable;

pub use self::render::render_program;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Plain,
    Pretty,
    Flat,
}

impl OutputMode {
    pub fn is_structured(self) -> bool {
        self != OutputMode::Plain
    }
}

/// Everything the renderer needs, fixed before rendering starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderPlan {
    pub imports: Vec<String>,
    pub statements: Vec<String>,
    pub final_expr: String,
    pub output: OutputMode,
    pub uses_args: bool,
}

pub fn synthesize(
    expr: &str,
    output: OutputMode,
    aliases: &AliasTable,
    catalog: &dyn ModuleLookup,
) -> RenderPlan {
    let extracted = literals::extract_literals(expr);
    let mut tokens = extracted.tokens;
    shortcuts::expand_shortcuts(&mut tokens, aliases);
    debug!(
        rewritten = %scan::join(&tokens),
        literals = extracted.bindings.len(),
        "expanded shortcuts"
    );

    let split = statements::split_statements(&tokens);
    let uses_args = imports::references_args(&tokens, &split.receivers);
    let request = ImportRequest {
        tokens: &tokens,
        receivers: &split.receivers,
        prints_result: !split.final_expr.is_empty(),
        uses_args,
        output,
        guard_injected: split.guard_injected,
    };
    let imports = imports::resolve_imports(&request, catalog);

    let mut statements: Vec<String> = extracted
        .bindings
        .iter()
        .map(|b| b.declaration())
        .collect();
    statements.extend(split.statements);
    RenderPlan {
        imports,
        statements,
        final_expr: split.final_expr,
        output,
        uses_args,
    }
}

/// Convenience wrapper: synthesize and render in one step.
pub fn synthesize_program(
    expr: &str,
    output: OutputMode,
    aliases: &AliasTable,
    catalog: &dyn ModuleLookup,
) -> String {
    render_program(&synthesize(expr, output, aliases, catalog))
}
