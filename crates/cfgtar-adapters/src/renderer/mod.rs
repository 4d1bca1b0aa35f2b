//! Text template renderer.
//!
//! Renders entry content with the familiar `{{ ... }}` action language:
//! field chains (`.a.b`), variables (`$x := ...`), pipelines (`a | b`),
//! parenthesized sub-expressions, `if`/`else if`/`else`, `range`, `with`,
//! trim markers (`{{-` and `-}}`) and `{{/* comments */}}`.
//!
//! Built-in functions: `and or not len index eq ne lt le gt ge print
//! println printf join`. Anything else must be provided by the
//! [`TemplateFunctions`] passed to [`TemplateRenderer::render`]; names
//! that neither knows fail when the template is parsed, before any output
//! is produced. Referencing a key that a mapping does not have is an error.

mod exec;
mod lex;
mod parse;

use cfgtar_core::{
    application::{RenderError, TemplateFunctions, TemplateRenderer},
    domain::{Delimiters, Value},
};
use tracing::{instrument, trace};

use exec::Exec;
use parse::Parser;

/// Renderer for `{{ }}`-style text templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTemplateRenderer;

impl TextTemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for TextTemplateRenderer {
    #[instrument(skip_all, fields(bytes = source.len()))]
    fn render(
        &self,
        source: &str,
        data: &Value,
        delimiters: &Delimiters,
        functions: &dyn TemplateFunctions,
    ) -> Result<String, RenderError> {
        let segments = lex::split(source, delimiters)?;
        let tree = Parser::new(segments, functions).parse()?;
        trace!(nodes = tree.len(), "template parsed");
        Exec::run(&tree, data, functions)
    }
}

#[cfg(test)]
mod tests {
    use cfgtar_core::application::NoFunctions;

    use super::*;

    struct Upper;

    impl TemplateFunctions for Upper {
        fn has(&self, name: &str) -> bool {
            matches!(name, "upper" | "boom")
        }

        fn call(&self, name: &str, args: &[Value]) -> Result<Value, String> {
            match (name, args) {
                ("upper", [Value::String(s)]) => Ok(Value::from(s.to_uppercase())),
                ("boom", _) => Err("kaboom".into()),
                _ => Err(format!("bad arguments to {name}")),
            }
        }
    }

    fn render(source: &str, data: &str) -> Result<String, RenderError> {
        let data = Value::from_json_str(data).unwrap();
        TextTemplateRenderer.render(source, &data, &Delimiters::default(), &Upper)
    }

    fn ok(source: &str, data: &str) -> String {
        render(source, data).unwrap()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(ok("no actions here\n", "{}"), "no actions here\n");
    }

    #[test]
    fn fields_and_chains() {
        let data = r#"{"name":"web","db":{"host":"10.0.0.1","port":5432}}"#;
        assert_eq!(ok("{{.name}} {{.db.host}}:{{.db.port}}", data), "web 10.0.0.1:5432");
        assert_eq!(ok("{{.}}", r#""x""#), "x");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = render("a\n{{.nope}}", r#"{"a":1}"#).unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.to_string().contains(r#"map has no entry for key "nope""#));
    }

    #[test]
    fn index_of_missing_key_yields_nothing() {
        assert_eq!(ok(r#"[{{index . "nope"}}]"#, r#"{"a":1}"#), "[]");
        assert_eq!(ok(r#"{{index .xs 1}}"#, r#"{"xs":["a","b"]}"#), "b");
    }

    #[test]
    fn conditionals() {
        let t = "{{if .a}}A{{else if .b}}B{{else}}C{{end}}";
        assert_eq!(ok(t, r#"{"a":true,"b":true}"#), "A");
        assert_eq!(ok(t, r#"{"a":false,"b":1}"#), "B");
        assert_eq!(ok(t, r#"{"a":"","b":0}"#), "C");
    }

    #[test]
    fn range_over_sequences_and_mappings() {
        let data = r#"{"xs":["a","b"],"m":{"z":1,"y":2},"none":[]}"#;
        assert_eq!(ok("{{range .xs}}<{{.}}>{{end}}", data), "<a><b>");
        assert_eq!(ok("{{range $i, $x := .xs}}{{$i}}={{$x}};{{end}}", data), "0=a;1=b;");
        assert_eq!(ok("{{range $k, $v := .m}}{{$k}}{{$v}}{{end}}", data), "y2z1");
        assert_eq!(ok("{{range .none}}x{{else}}empty{{end}}", data), "empty");
        assert!(render("{{range .}}{{end}}", "5.5").is_err());
    }

    #[test]
    fn with_rebinds_dot() {
        let data = r#"{"db":{"host":"h"},"off":null}"#;
        assert_eq!(ok("{{with .db}}{{.host}}{{end}}", data), "h");
        assert_eq!(ok("{{with .off}}x{{else}}none{{end}}", data), "none");
    }

    #[test]
    fn variables_are_scoped() {
        assert_eq!(ok("{{$x := .a}}{{$x}}{{$x}}", r#"{"a":7}"#), "77");
        assert!(render("{{if true}}{{$y := 1}}{{end}}{{$y}}", "{}").is_err());
        assert_eq!(ok("{{range .xs}}{{$.top}}{{end}}", r#"{"xs":[1,2],"top":"t"}"#), "tt");
    }

    #[test]
    fn trim_markers_and_comments() {
        assert_eq!(ok("a  {{- .v -}}  b", r#"{"v":1}"#), "a1b");
        assert_eq!(ok("a{{/* note */}}b", "{}"), "ab");
        assert_eq!(ok("{{- /* gone */ -}}\n  x", "{}"), "x");
    }

    #[test]
    fn pipelines_and_subexpressions() {
        assert_eq!(ok("{{.n | upper}}", r#"{"n":"web"}"#), "WEB");
        assert_eq!(ok(r#"{{ printf "%s-%d" .n (len .xs) }}"#, r#"{"n":"a","xs":[1,2,3]}"#), "a-3");
        assert_eq!(ok(r#"{{ .xs | join "," }}"#, r#"{"xs":["a","b"]}"#), "a,b");
        assert_eq!(ok("{{ (index .m \"k\").v }}", r#"{"m":{"k":{"v":9}}}"#), "9");
    }

    #[test]
    fn logic_short_circuits() {
        assert_eq!(ok("{{if and .a .b.c}}y{{else}}n{{end}}", r#"{"a":false}"#), "n");
        assert_eq!(ok("{{or .a .b}}", r#"{"a":"first","b":"second"}"#), "first");
        assert_eq!(ok("{{if not .a}}y{{end}}", r#"{"a":0}"#), "y");
    }

    #[test]
    fn comparisons() {
        let data = r#"{"n":3,"s":"b"}"#;
        assert_eq!(ok("{{eq .n 3}} {{ne .s \"a\"}} {{lt .n 4}} {{ge .s \"c\"}}", data), "true true true false");
        assert_eq!(ok("{{eq .s \"x\" \"y\" \"b\"}}", data), "true");
        assert!(render("{{eq .n .s}}", data).is_err());
    }

    #[test]
    fn printing_follows_value_display() {
        let data = r#"{"xs":[1,"a"],"m":{"k":true},"z":null,"f":2.5}"#;
        assert_eq!(ok("{{.xs}} {{.m}} [{{.z}}] {{.f}}", data), "[1 a] map[k:true] [] 2.5");
        assert_eq!(ok("{{print 1 2 \"x\"}}|{{println \"a\" 1}}", "{}"), "1 2x|a 1\n");
    }

    #[test]
    fn oversized_printf_width_is_reported_inline() {
        assert_eq!(ok(r#"{{printf "%99999999999999999999d" 1}}"#, "{}"), "%!(BADWIDTH)");
        assert_eq!(ok(r#"[{{printf "%4d" 7}}]"#, "{}"), "[   7]");
    }

    #[test]
    fn unknown_function_fails_before_output() {
        let err = render("text {{ nosuch .a }}", r#"{"a":1}"#).unwrap_err();
        assert!(err.to_string().contains(r#"function "nosuch" not defined"#));
    }

    #[test]
    fn function_errors_are_wrapped() {
        let err = render("{{boom}}", "{}").unwrap_err();
        assert!(err.to_string().contains("error calling boom: kaboom"));
    }

    #[test]
    fn structural_errors() {
        assert!(render("{{if .a}}x", r#"{"a":1}"#).is_err());
        assert!(render("{{end}}", "{}").is_err());
        assert!(render("{{ .a ", r#"{"a":1}"#).is_err());
        assert!(render("{{define \"x\"}}{{end}}", "{}").is_err());
    }

    #[test]
    fn custom_delimiters() {
        let data = Value::from_json_str(r#"{"v":"ok"}"#).unwrap();
        let delims: Delimiters = "[[.]]".parse().unwrap();
        let out = TextTemplateRenderer
            .render("{{keep}} [[ .v ]]", &data, &delims, &NoFunctions)
            .unwrap();
        assert_eq!(out, "{{keep}} ok");
    }
}
