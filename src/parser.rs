// src/parser.rs
//! TypeScript / JavaScript のルート定義モジュールから、ルート配列を AST で取り出す。
//!
//! `export const routeConfigs: RouteConfig[] = [ ... ]` のような配列リテラルを対象にし、
//! 実行はしない。文字列・真偽値・配列・ネストしたオブジェクトだけを読む。

use swc_common::{FileName, SourceMap, sync::Lrc};
use swc_ecma_ast::*;
use swc_ecma_parser::{Parser as SwcParser, StringInput, Syntax, TsConfig, lexer::Lexer};
use swc_ecma_visit::{Visit, VisitWith};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::model::{MenuInstance, RawRouteNode};

/// `export default [...]` を格納するときの名前
const DEFAULT_EXPORT: &str = "default";

/// AST をトラバースして、配列リテラルで初期化された変数を集める Visitor
#[derive(Default)]
struct RouteVisitor {
    /// 変数名とその配列リテラルのマッピング
    arrays: HashMap<String, ArrayLit>,
    /// 宣言順 (フォールバック選択用)
    order: Vec<String>,
}

impl RouteVisitor {
    fn record(&mut self, name: String, arr: &ArrayLit) {
        debug!(variable = %name, elements = arr.elems.len(), "array literal found");
        if self.arrays.insert(name.clone(), arr.clone()).is_none() {
            self.order.push(name);
        }
    }

    /// 取り出す配列を決める
    ///
    /// 指定名があればそれ。無ければ名前に `route` を含む最初の変数、最後に default export。
    fn select<'a>(&'a self, variable: &'a str) -> Option<&'a str> {
        if self.arrays.contains_key(variable) {
            return Some(variable);
        }
        self.order
            .iter()
            .find(|name| name.to_lowercase().contains("route"))
            .or_else(|| self.order.iter().find(|name| *name == DEFAULT_EXPORT))
            .map(String::as_str)
    }
}

impl Visit for RouteVisitor {
    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        for declarator in &var_decl.decls {
            if let Pat::Ident(BindingIdent { id, .. }) = &declarator.name {
                if let Some(init) = &declarator.init {
                    if let Expr::Array(arr) = unwrap_expr(init) {
                        self.record(id.sym.to_string(), arr);
                    }
                }
            }
        }
        // 子ノードも訪問
        var_decl.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, export: &ExportDefaultExpr) {
        if let Expr::Array(arr) = unwrap_expr(&export.expr) {
            self.record(DEFAULT_EXPORT.to_string(), arr);
        }
        export.visit_children_with(self);
    }
}

/// 型注釈・括弧・`as const` を剥がす
fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(ParenExpr { expr, .. })
        | Expr::TsAs(TsAsExpr { expr, .. })
        | Expr::TsConstAssertion(TsConstAssertion { expr, .. }) => unwrap_expr(expr),
        other => other,
    }
}

fn string_value(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Str(Str { value, .. })) => Some(value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .map(|q| q.cooked.as_ref().unwrap_or(&q.raw).to_string()),
        _ => None,
    }
}

fn bool_value(expr: &Expr) -> Option<bool> {
    match unwrap_expr(expr) {
        Expr::Lit(Lit::Bool(Bool { value, .. })) => Some(*value),
        _ => None,
    }
}

fn string_array(expr: &Expr) -> Option<Vec<String>> {
    match unwrap_expr(expr) {
        Expr::Array(arr) => Some(
            arr.elems
                .iter()
                .flatten()
                .filter_map(|elem| string_value(&elem.expr))
                .collect(),
        ),
        _ => None,
    }
}

/// `() => import("...")` や `lazy(() => import("..."))` からモジュール指定子を取り出す
fn import_specifier(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Arrow(ArrowExpr { body, .. }) => {
            let body: &BlockStmtOrExpr = body;
            match body {
                BlockStmtOrExpr::Expr(expr) => import_specifier(expr),
                BlockStmtOrExpr::BlockStmt(block) => block.stmts.iter().find_map(|stmt| match stmt {
                    Stmt::Return(ReturnStmt { arg: Some(arg), .. }) => import_specifier(arg),
                    _ => None,
                }),
            }
        }
        Expr::Call(CallExpr { callee, args, .. }) => match callee {
            Callee::Import(_) => args.first().and_then(|arg| string_value(&arg.expr)),
            // import("...").then(m => m.X)
            Callee::Expr(callee) => match unwrap_expr(callee) {
                Expr::Member(MemberExpr { obj, .. }) => import_specifier(obj),
                _ => args.first().and_then(|arg| import_specifier(&arg.expr)),
            },
            Callee::Super(_) => None,
        },
        _ => None,
    }
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// オブジェクトの `key: value` プロパティを列挙する
fn key_values(obj: &ObjectLit) -> impl Iterator<Item = (String, &Expr)> {
    obj.props.iter().filter_map(|prop| match prop {
        PropOrSpread::Prop(boxed_prop) => match &**boxed_prop {
            Prop::KeyValue(KeyValueProp { key, value }) => prop_name(key).map(|name| (name, &**value)),
            other => {
                debug!("skipping non key-value property: {:?}", other);
                None
            }
        },
        PropOrSpread::Spread(_) => {
            warn!("object spread inside a route definition is not supported");
            None
        }
    })
}

/// 配列リテラルを RawRouteNode 列に変換する
struct Extractor<'a> {
    arrays: &'a HashMap<String, ArrayLit>,
    /// 変数参照の解決中スタック (循環参照の検出用)
    resolving: Vec<String>,
}

impl<'a> Extractor<'a> {
    fn routes_from_array(&mut self, arr: &ArrayLit) -> Vec<RawRouteNode> {
        let mut routes = Vec::new();
        for elem in arr.elems.iter().flatten() {
            let expr = unwrap_expr(&elem.expr);
            if elem.spread.is_some() {
                // ...otherRoutes
                match expr {
                    Expr::Ident(ident) => routes.extend(self.routes_from_ident(&ident.sym)),
                    Expr::Array(inner) => routes.extend(self.routes_from_array(inner)),
                    _ => warn!("unsupported spread element in route array"),
                }
                continue;
            }
            match expr {
                Expr::Object(obj) => routes.push(self.route_from_object(obj)),
                other => warn!("skipping non-object route entry: {:?}", other),
            }
        }
        routes
    }

    fn routes_from_value(&mut self, expr: &Expr) -> Option<Vec<RawRouteNode>> {
        match unwrap_expr(expr) {
            Expr::Array(arr) => Some(self.routes_from_array(arr)),
            Expr::Ident(ident) => Some(self.routes_from_ident(&ident.sym)),
            _ => None,
        }
    }

    fn routes_from_ident(&mut self, name: &str) -> Vec<RawRouteNode> {
        if self.resolving.iter().any(|n| n == name) {
            warn!(variable = name, "cyclic route array reference");
            return Vec::new();
        }
        let arrays = self.arrays;
        let Some(arr) = arrays.get(name) else {
            warn!(variable = name, "route array variable not found");
            return Vec::new();
        };
        self.resolving.push(name.to_string());
        let routes = self.routes_from_array(arr);
        self.resolving.pop();
        routes
    }

    fn route_from_object(&mut self, obj: &ObjectLit) -> RawRouteNode {
        let mut route = RawRouteNode::default();

        for (name, value) in key_values(obj) {
            match name.as_str() {
                "path" => route.path = string_value(value).unwrap_or_default(),
                "component" | "componentRef" => {
                    route.component = string_value(value).or_else(|| import_specifier(value))
                }
                "redirect" => route.redirect = string_value(value),
                "label" => route.label = string_value(value),
                "menuLabel" => route.menu_label = string_value(value),
                "icon" => route.icon = string_value(value),
                "key" => route.key = string_value(value),
                "showInMenu" => route.show_in_menu = bool_value(value),
                "params" => route.params = string_array(value),
                "menuInstances" => route.menu_instances = menu_instances(value),
                "children" | "routes" => route.children = self.routes_from_value(value),
                other => debug!(property = other, "ignored route property"),
            }
        }

        debug!(path = %route.path, component = ?route.component, "route object parsed");
        route
    }
}

fn menu_instances(expr: &Expr) -> Option<Vec<MenuInstance>> {
    let Expr::Array(arr) = unwrap_expr(expr) else {
        return None;
    };
    let instances = arr
        .elems
        .iter()
        .flatten()
        .filter_map(|elem| match unwrap_expr(&elem.expr) {
            Expr::Object(obj) => {
                let mut fields: HashMap<String, String> = key_values(obj)
                    .filter_map(|(name, value)| string_value(value).map(|s| (name, s)))
                    .collect();
                let path = fields.remove("path")?;
                let label = fields.remove("label")?;
                Some(MenuInstance {
                    path,
                    label,
                    key: fields.remove("key"),
                    icon: fields.remove("icon"),
                })
            }
            _ => None,
        })
        .collect();
    Some(instances)
}

/// ソース文字列を解析してルート配列を取り出す
pub fn parse_routes_source(src: String, file_path: &Path, variable: &str) -> Result<Vec<RawRouteNode>, SourceError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(file_path.to_path_buf()), src);

    // TypeScript構文でパースする設定 (.tsx / .jsx は JSX を許可)
    let tsx = file_path
        .extension()
        .is_some_and(|ext| ext == "tsx" || ext == "jsx");
    let syntax = Syntax::Typescript(TsConfig {
        tsx,
        decorators: true,
        dts: false,
        no_early_errors: true,
        disallow_ambiguous_jsx_like: true,
    });

    let lexer = Lexer::new(
        syntax,
        Default::default(), // es version
        StringInput::from(&*fm),
        None,
    );

    let mut parser = SwcParser::new_from(lexer);
    let module = parser.parse_module().map_err(|e| SourceError::Parse {
        path: file_path.to_path_buf(),
        message: format!("{:?}", e),
    })?;

    let mut visitor = RouteVisitor::default();
    visitor.visit_module(&module);

    let selected = visitor
        .select(variable)
        .ok_or_else(|| SourceError::RoutesNotFound {
            path: file_path.to_path_buf(),
            variable: variable.to_string(),
        })?
        .to_string();
    if selected != variable {
        info!(requested = variable, using = %selected, "route array selected by fallback");
    }

    let mut extractor = Extractor {
        arrays: &visitor.arrays,
        resolving: Vec::new(),
    };
    Ok(extractor.routes_from_ident(&selected))
}

/// ファイルを読み込んで解析する
pub fn parse_routes_in_file(file_path: &Path, variable: &str) -> Result<Vec<RawRouteNode>, SourceError> {
    let src = fs::read_to_string(file_path).map_err(|e| SourceError::Io(file_path.to_path_buf(), e))?;
    debug!(file = ?file_path, bytes = src.len(), "parsing route module");
    parse_routes_source(src, file_path, variable)
}
