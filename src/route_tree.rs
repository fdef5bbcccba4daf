// src/route_tree.rs
//! ルート定義からルーターランタイム向けの実行用ルートツリーを組み立てる。

use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Sink};
use crate::loader::ComponentLoader;
use crate::model::{NodeKind, RouteSpecNode, RouteTreeNode, attached_children};
use crate::path::{compose, extract_param_names};

/// 兄弟の並びがどこに置かれているか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// 入力の最上位
    Root,
    /// ルートラッパー (`/`) 直下。最上位と同じ扱い
    Wrapped,
    /// それ以外のネスト
    Nested,
}

/// ルートツリーを組み立てる
///
/// 兄弟の順序は入力のまま。`/` で子を持つラッパーだけは余分な階層を作らない:
/// コンポーネントやリダイレクトを持つなら `/` のレイアウトルート 1 つに子を直接ぶら下げ、
/// 何も持たないなら子を最上位のルートとして展開する。
///
/// 設定の問題は診断として返し、他の部分木の組み立ては続ける。
pub fn build_route_tree<L>(roots: &[RouteSpecNode], loader: &L) -> (Vec<RouteTreeNode>, Vec<Diagnostic>)
where
    L: ComponentLoader + ?Sized,
{
    let mut builder = RouteTreeBuilder {
        loader,
        claimed: HashSet::new(),
        sink: Sink::default(),
    };
    let tree = builder.build_level(roots, "", Level::Root);
    (tree, builder.sink.into_vec())
}

struct RouteTreeBuilder<'a, L: ?Sized> {
    loader: &'a L,
    /// 既に登録されたフルパス
    claimed: HashSet<String>,
    sink: Sink,
}

impl<L> RouteTreeBuilder<'_, L>
where
    L: ComponentLoader + ?Sized,
{
    fn build_level(&mut self, nodes: &[RouteSpecNode], parent_full: &str, level: Level) -> Vec<RouteTreeNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in attached_children(nodes) {
            self.build_node(node, parent_full, level, &mut out);
        }
        out
    }

    fn build_node(
        &mut self,
        node: &RouteSpecNode,
        parent_full: &str,
        level: Level,
        out: &mut Vec<RouteTreeNode>,
    ) {
        let full = compose(parent_full, &node.path);
        debug!(full_path = %full, segment = %node.path, "building route");

        // 1) このノード自身の形についての検査
        self.check_node(node, &full, level);

        // 2) 何も持たないルートラッパーは子を最上位として展開するだけ
        if node.is_root_wrapper() && node.kind == NodeKind::Group {
            debug!(full_path = %full, "flattening root wrapper");
            let children = self.build_level(&node.children, &full, Level::Wrapped);
            out.extend(children);
            return;
        }

        // 3) パスの登録 (重複検出)
        if claims_path(node) {
            self.claim(&full);
        }

        // 4) パスまたはインデックスの決定
        let (path, is_index) = if node.is_index() {
            (None, true)
        } else if level == Level::Nested && node.path == "/" {
            // 入れ子の `/` は親と同じパスになる。子があればパスなしレイアウト、無ければインデックス
            (None, !node.has_children())
        } else if node.is_root_wrapper() {
            (Some("/".to_string()), false)
        } else {
            (Some(emitted_segment(&node.path)), false)
        };

        // 5) リダイレクトはコンポーネントより優先
        let (redirect_target, component_loader) = match &node.kind {
            NodeKind::Redirect { target, .. } => (Some(target.clone()), None),
            NodeKind::Component(reference) => (None, Some(self.loader.defer(reference))),
            NodeKind::Group => (None, None),
        };

        // 6) 子の再帰 (インデックスルートは子を持たない)
        let children = if node.has_children() && !node.is_index() {
            let child_level = if node.is_root_wrapper() {
                Level::Wrapped
            } else {
                Level::Nested
            };
            Some(self.build_level(&node.children, &full, child_level)).filter(|c| !c.is_empty())
        } else {
            None
        };

        out.push(RouteTreeNode {
            path,
            is_index,
            component_loader,
            redirect_target,
            children,
        });
    }

    fn check_node(&mut self, node: &RouteSpecNode, full: &str, level: Level) {
        if let NodeKind::Redirect {
            target,
            shadowed_component: Some(component),
        } = &node.kind
        {
            self.sink.push(
                Diagnostic::new(
                    DiagnosticKind::RedirectShadowsComponent,
                    full,
                    format!("redirect to `{}` overrides component `{}`", target, component),
                )
                .with_hint("remove either `redirect` or `component`"),
            );
        }

        if node.is_index() {
            if level == Level::Root {
                self.sink.push(Diagnostic::new(
                    DiagnosticKind::IndexAtRoot,
                    full,
                    "index route declared at top level",
                ));
            }
            if node.has_children() {
                self.sink.push(
                    Diagnostic::new(
                        DiagnosticKind::IndexWithChildren,
                        full,
                        format!(
                            "index route declares {} child route(s); attaching them to the parent",
                            node.children.len()
                        ),
                    )
                    .with_hint("move the children next to the index route"),
                );
            }
        }

        if node.is_dead_leaf() {
            self.sink.push(
                Diagnostic::new(DiagnosticKind::DeadLeaf, full, "route has nothing to render")
                    .with_hint("add a component or a redirect"),
            );
        }

        if level == Level::Nested && node.path.starts_with('/') {
            self.sink.push(
                Diagnostic::new(
                    DiagnosticKind::AbsoluteChildPath,
                    full,
                    format!("nested path `{}` starts with `/`; composed relative to its parent", node.path),
                )
                .with_hint("drop the leading `/` from nested paths"),
            );
        }

        if !node.params.is_empty() {
            let declared: BTreeSet<&str> = node.params.iter().map(String::as_str).collect();
            let found = extract_param_names(full);
            let found: BTreeSet<&str> = found.iter().map(String::as_str).collect();
            if declared != found {
                self.sink.push(Diagnostic::new(
                    DiagnosticKind::ParamsMismatch,
                    full,
                    format!("declared params {:?} but the path binds {:?}", declared, found),
                ));
            }
        }
    }

    fn claim(&mut self, full: &str) {
        if !self.claimed.insert(full.to_string()) {
            self.sink.push(
                Diagnostic::new(
                    DiagnosticKind::DuplicatePath,
                    full,
                    "another route already uses this path; the first one wins at runtime",
                )
                .with_hint("rename or remove one of the routes"),
            );
        }
    }
}

/// ノードが自分のフルパスを占有するかどうか
///
/// インデックスの子 (または `/` の子) を持つレイアウトは、同じパスをその子に譲る。
fn claims_path(node: &RouteSpecNode) -> bool {
    if node.is_index() || !node.has_children() {
        return true;
    }
    !attached_children(&node.children)
        .iter()
        .any(|child| child.is_index() || child.path == "/")
}

/// ランタイムは子を親からの相対で解決するので、先頭の `/` を 1 つだけ外す
fn emitted_segment(path: &str) -> String {
    match path.strip_prefix('/') {
        Some("") => "/".to_string(),
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}
