use super::{OutputMode, RenderPlan};

const TYPE_ALIASES: &str = "type M = map[string]interface{}\ntype S = []interface{}\n";

const JSON_HELPERS_HEAD: &str = r#"func vararg(vv ...interface{}) []interface{} {
	return vv
}

func marshal(data interface{}) (string, error) {
	var b bytes.Buffer
	enc := json.NewEncoder(&b)
	enc.SetEscapeHTML(false)
"#;

const JSON_HELPERS_TAIL: &str = r#"	if e := enc.Encode(data); e != nil {
		return "", e
	}
	return b.String(), nil
}
"#;

const ARGS_CAPTURE: &str = r#"	args := os.Args[1:]
	if len(args) > 0 && args[0] == "--" {
		args = args[1:]
	}
"#;

/// Assemble the whole Go program for `plan`. Pure and deterministic.
pub fn render_program(plan: &RenderPlan) -> String {
    let mut out = String::from("package main\n\n");
    if !plan.imports.is_empty() {
        out.push_str("import (\n");
        for import in &plan.imports {
            out.push_str(&format!("\t\"{}\"\n", import));
        }
        out.push_str(")\n\n");
    }
    out.push_str(TYPE_ALIASES);
    out.push('\n');
    if plan.output.is_structured() {
        out.push_str(JSON_HELPERS_HEAD);
        if plan.output == OutputMode::Pretty {
            out.push_str("\tenc.SetIndent(\"\", \"  \")\n");
        }
        out.push_str(JSON_HELPERS_TAIL);
        out.push('\n');
    }
    out.push_str("func main() {\n");
    if plan.uses_args {
        out.push_str(ARGS_CAPTURE);
    }
    for stmt in &plan.statements {
        out.push('\t');
        out.push_str(stmt);
        out.push('\n');
    }
    if !plan.final_expr.is_empty() {
        if plan.output.is_structured() {
            emit_json_print(&mut out, &plan.final_expr);
        } else {
            out.push_str(&format!("\tfmt.Println({})\n", plan.final_expr));
        }
    }
    out.push_str("}\n");
    out
}

fn emit_json_print(out: &mut String, expr: &str) {
    out.push_str(&format!("\tfor _, val := range vararg({}) {{\n", expr));
    out.push_str("\t\ts, e := marshal(&val)\n");
    out.push_str("\t\tif e != nil {\n");
    out.push_str("\t\t\tfmt.Println(\"cannot convert\", val, \"to JSON:\", e)\n");
    out.push_str("\t\t\tcontinue\n");
    out.push_str("\t\t}\n");
    out.push_str("\t\tfmt.Print(s)\n");
    out.push_str("\t}\n");
}
