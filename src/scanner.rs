//! SWC-based module parser that finds `Drupal.t` and `Drupal.formatPlural`
//! call sites and reports their byte ranges in the module source.

use std::path::Path;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{CallExpr, Callee, Expr, Lit, MemberProp};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::warn;

use crate::session::{CallSite, WatchedFunction};
use crate::slice::SourceRange;

/// Result of parsing one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleScan {
    /// Display path of the module
    pub path: String,
    /// Raw source text the call site ranges index into
    pub source: String,
    /// Watched calls in source order; an outer call precedes calls nested in
    /// its arguments
    pub sites: Vec<CallSite>,
    /// Parser error message (`file:line:column: message`), if parsing failed
    pub parse_error: Option<String>,
}

/// Visitor that records every watched call expression
struct CallVisitor {
    /// Position of the module's first byte in the source map
    module_start: BytePos,
    sites: Vec<CallSite>,
}

impl CallVisitor {
    fn new(module_start: BytePos) -> Self {
        Self {
            module_start,
            sites: Vec::new(),
        }
    }

    fn range_of(&self, span: Span) -> SourceRange {
        let start = span.lo.0.saturating_sub(self.module_start.0) as usize;
        let end = span.hi.0.saturating_sub(self.module_start.0) as usize;
        SourceRange::new(start, end)
    }
}

/// Match `Drupal.t(...)`, `Drupal.formatPlural(...)` and the computed forms
/// `Drupal['t'](...)` / `Drupal["formatPlural"](...)`.
fn watched_callee(callee: &Callee) -> Option<WatchedFunction> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    let Expr::Member(member) = expr.as_ref() else {
        return None;
    };
    let Expr::Ident(object) = member.obj.as_ref() else {
        return None;
    };

    match &member.prop {
        MemberProp::Ident(prop) => WatchedFunction::from_member(&object.sym, &prop.sym),
        MemberProp::Computed(computed) => match computed.expr.as_ref() {
            Expr::Lit(Lit::Str(s)) => WatchedFunction::from_member(&object.sym, s.value.as_str()?),
            _ => None,
        },
        _ => None,
    }
}

impl Visit for CallVisitor {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some(function) = watched_callee(&call.callee) {
            self.sites.push(CallSite {
                function,
                range: self.range_of(call.span),
            });
            // The call itself is handled; only its arguments can hold more calls.
            for arg in &call.args {
                arg.visit_with(self);
            }
            return;
        }

        call.visit_children_with(self);
    }
}

/// Parse `source` as the module at `path` and collect watched call sites.
///
/// A module that fails to parse yields no call sites and a `parse_error`;
/// it never aborts the build.
pub fn scan_source<P: AsRef<Path>>(source: &str, path: P) -> ModuleScan {
    let path = path.as_ref();
    let cm: Lrc<SourceMap> = Default::default();

    let fm = cm.new_source_file(
        FileName::Real(path.to_path_buf()).into(),
        source.to_string(),
    );

    // Determine syntax based on file extension
    let is_tsx = path
        .extension()
        .map(|ext| ext == "tsx" || ext == "jsx")
        .unwrap_or(false);

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: is_tsx,
        decorators: true,
        ..Default::default()
    });

    let lexer = Lexer::new(syntax, Default::default(), StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    // Ranges index into the source map's copy of the text
    let module_source = fm.src.as_str().to_owned();

    let module = match parser.parse_module() {
        Ok(module) => module,
        Err(e) => {
            let loc = cm.lookup_char_pos(e.span().lo);
            let message = format!(
                "{}:{}:{}: {:?}",
                path.display(),
                loc.line,
                loc.col_display + 1,
                e.kind()
            );
            warn!("Parse error in {}", message);
            return ModuleScan {
                path: path.display().to_string(),
                source: module_source,
                sites: Vec::new(),
                parse_error: Some(message),
            };
        }
    };

    let mut visitor = CallVisitor::new(fm.start_pos);
    module.visit_with(&mut visitor);

    ModuleScan {
        path: path.display().to_string(),
        source: module_source,
        sites: visitor.sites,
        parse_error: None,
    }
}
