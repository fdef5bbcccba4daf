// src/compile.rs
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, Severity};
use crate::loader::ComponentLoader;
use crate::menu_tree::build_menu_tree;
use crate::model::{MenuTreeNode, NodeKind, RouteSpecNode, RouteTreeNode, attached_children};
use crate::path::{compose, constant_name};
use crate::route_tree::build_route_tree;

/// 未知の URL に対する最上位のキャッチオールルート
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Redirect(String),
    Component(String),
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub fallback: Option<Fallback>,
}

/// 1 回のコンパイル結果。入力が変わったら丸ごと作り直す
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOutput {
    pub routes: Vec<RouteTreeNode>,
    pub menu: Vec<MenuTreeNode>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// ルート定義からルートツリーとメニューツリーを作る
///
/// 2 つの木は同じ入力を別々に辿って作るので、互いに影響しない。
pub fn compile<L>(roots: &[RouteSpecNode], loader: &L, options: &CompileOptions) -> CompileOutput
where
    L: ComponentLoader + ?Sized,
{
    let (mut routes, mut diagnostics) = build_route_tree(roots, loader);
    let (menu, menu_diagnostics) = build_menu_tree(roots);
    diagnostics.extend(menu_diagnostics);

    if let Some(fallback) = &options.fallback {
        // 展開されたラッパーの子も最上位になるので、入力ではなく出力を見る
        if routes.iter().any(|r| r.path.as_deref() == Some("*")) {
            debug!("route tree already has a top-level catch-all; fallback skipped");
        } else {
            routes.push(fallback_route(fallback, loader));
        }
    }

    info!(
        routes = routes.len(),
        menu = menu.len(),
        diagnostics = diagnostics.len(),
        "compiled route spec"
    );

    CompileOutput {
        routes,
        menu,
        diagnostics,
    }
}

fn fallback_route<L>(fallback: &Fallback, loader: &L) -> RouteTreeNode
where
    L: ComponentLoader + ?Sized,
{
    let (redirect_target, component_loader) = match fallback {
        Fallback::Redirect(target) => (Some(target.clone()), None),
        Fallback::Component(reference) => (None, Some(loader.defer(reference))),
    };
    RouteTreeNode {
        path: Some("*".to_string()),
        is_index: false,
        component_loader,
        redirect_target,
        children: None,
    }
}

/// 遷移可能な各ルートの定数名 → フルパスの表
///
/// 同じ名前になった場合は先に現れたものを残す。
pub fn route_constants(roots: &[RouteSpecNode]) -> BTreeMap<String, String> {
    fn walk(nodes: &[RouteSpecNode], parent_full: &str, table: &mut BTreeMap<String, String>) {
        for node in attached_children(nodes) {
            let full = compose(parent_full, &node.path);
            if node.kind != NodeKind::Group {
                table.entry(constant_name(&full)).or_insert_with(|| full.clone());
            }
            if !node.is_index() {
                walk(&node.children, &full, table);
            }
        }
    }

    let mut table = BTreeMap::new();
    walk(roots, "", &mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{DeferredHandle, PassThroughLoader};

    fn spec() -> Vec<RouteSpecNode> {
        vec![
            RouteSpecNode::new("/login").component("@/pages/login").hidden(),
            RouteSpecNode::new("/").component("@/components/Layout").children(vec![
                RouteSpecNode::new("").component("@/pages/Home").menu_label("Home"),
                RouteSpecNode::new("/dynamic-form").component("@/pages/DynamicFormDemo").menu_label("Form"),
                RouteSpecNode::new("/examples").menu_label("Examples").children(vec![
                    RouteSpecNode::new("users/:id").component("@/pages/UserDetail"),
                    RouteSpecNode::new("*").component("@/pages/NotFound"),
                ]),
            ]),
        ]
    }

    #[test]
    fn test_fallback_redirect_is_appended() {
        let options = CompileOptions {
            fallback: Some(Fallback::Redirect("/".into())),
        };
        let out = compile(&spec(), &PassThroughLoader, &options);
        let last = out.routes.last().unwrap();
        assert_eq!(last.path.as_deref(), Some("*"));
        assert_eq!(last.redirect_target.as_deref(), Some("/"));
        assert!(!out.has_errors());
    }

    #[test]
    fn test_fallback_component_uses_loader() {
        let options = CompileOptions {
            fallback: Some(Fallback::Component("@/pages/NotFound".into())),
        };
        let loader = |r: &str| DeferredHandle::opaque(r.to_uppercase());
        let out = compile(&spec(), &loader, &options);
        let last = out.routes.last().unwrap();
        assert_eq!(
            last.component_loader,
            Some(DeferredHandle::opaque("@/PAGES/NOTFOUND"))
        );
    }

    #[test]
    fn test_fallback_skipped_when_flattened_wrapper_has_catch_all() {
        let roots = vec![RouteSpecNode::new("/").children(vec![
            RouteSpecNode::new("about").component("About"),
            RouteSpecNode::new("*").component("NotFound"),
        ])];
        let options = CompileOptions {
            fallback: Some(Fallback::Redirect("/".into())),
        };
        let out = compile(&roots, &PassThroughLoader, &options);
        let catch_alls = out
            .routes
            .iter()
            .filter(|r| r.path.as_deref() == Some("*"))
            .count();
        assert_eq!(catch_alls, 1);
        assert_eq!(out.routes.len(), 2);
        assert_eq!(out.routes[1].redirect_target, None);
    }

    #[test]
    fn test_hidden_parent_keeps_routes_but_not_menu() {
        let roots = vec![
            RouteSpecNode::new("/admin").label("Admin").hidden().children(vec![
                RouteSpecNode::new("users").component("Users").label("Users"),
                RouteSpecNode::new("roles").component("Roles").label("Roles"),
            ]),
        ];
        let out = compile(&roots, &PassThroughLoader, &CompileOptions::default());

        // メニューには何も出ない
        assert!(out.menu.is_empty());

        // ルートツリーには子も含めて残る
        assert_eq!(out.routes.len(), 1);
        assert_eq!(out.routes[0].path.as_deref(), Some("admin"));
        let children: Vec<_> = out.routes[0]
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.path.as_deref())
            .collect();
        assert_eq!(children, vec![Some("users"), Some("roles")]);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_has_errors_on_duplicates() {
        let roots = vec![
            RouteSpecNode::new("/a").component("A"),
            RouteSpecNode::new("a").component("B"),
        ];
        let out = compile(&roots, &PassThroughLoader, &CompileOptions::default());
        assert!(out.has_errors());
        assert_eq!(out.routes.len(), 2);
    }

    #[test]
    fn test_route_constants() {
        let table = route_constants(&spec());
        let expected: BTreeMap<String, String> = [
            ("LOGIN", "/login"),
            ("HOME", "/"),
            ("DYNAMIC_FORM", "/dynamic-form"),
            ("EXAMPLES_USERS_ID", "/examples/users/:id"),
            ("EXAMPLES_NOT_FOUND", "/examples/*"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(table, expected);
    }
}
