// src/menu_tree.rs
//! ルート定義からナビゲーション用のメニューツリーを導出する。
//!
//! ルートツリーとは独立に同じ入力を辿る。状態は共有しない。

use std::collections::HashSet;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Sink};
use crate::model::{MenuTreeNode, NodeKind, RouteSpecNode, attached_children};
use crate::path::{compose, derive_menu_key, has_params, is_active};

/// メニューツリーを組み立てる
///
/// - `showInMenu: false` のノードは部分木ごと除外
/// - `menuInstances` があればそのエントリだけを葉として出す
/// - ラベルの無いノードは自分を出さず、子のエントリを同じ階層へ持ち上げる
/// - 最上位の `/` レイアウトラッパー (menuLabel なし) は透過的に扱う
pub fn build_menu_tree(roots: &[RouteSpecNode]) -> (Vec<MenuTreeNode>, Vec<Diagnostic>) {
    let mut builder = MenuBuilder {
        keys: HashSet::new(),
        sink: Sink::default(),
    };
    let tree = builder.build_level(roots, "", true);
    (tree, builder.sink.into_vec())
}

struct MenuBuilder {
    keys: HashSet<String>,
    sink: Sink,
}

impl MenuBuilder {
    fn build_level(&mut self, nodes: &[RouteSpecNode], parent_full: &str, top: bool) -> Vec<MenuTreeNode> {
        let mut out = Vec::new();
        for node in attached_children(nodes) {
            self.build_node(node, parent_full, top, &mut out);
        }
        out
    }

    fn build_node(&mut self, node: &RouteSpecNode, parent_full: &str, top: bool, out: &mut Vec<MenuTreeNode>) {
        // 1) 非表示なら部分木ごと飛ばす
        if !node.menu.show_in_menu {
            debug!(path = %node.path, "hidden from menu");
            return;
        }

        let full = compose(parent_full, &node.path);

        // 2) menuInstances は具体的なエントリ (葉) に展開する
        if !node.menu.instances.is_empty() {
            for instance in &node.menu.instances {
                let key = instance
                    .key
                    .clone()
                    .unwrap_or_else(|| derive_menu_key(&instance.path));
                let key = self.unique_key(key, &instance.path);
                out.push(MenuTreeNode {
                    path: instance.path.clone(),
                    label: instance.label.clone(),
                    key,
                    icon: instance.icon.clone().or_else(|| node.menu.icon.clone()),
                    children: None,
                });
            }
            return;
        }

        // 3) 最上位のレイアウトラッパーは子をそのまま最上位メニューにする
        if top
            && node.is_root_wrapper()
            && node.menu.menu_label.is_none()
            && matches!(node.kind, NodeKind::Component(_))
        {
            let lifted = self.build_level(&node.children, &full, true);
            out.extend(lifted);
            return;
        }

        match node.display_label() {
            // 4) ラベル付き: 自分を出し、子があればぶら下げる
            Some(label) => {
                if has_params(&full) {
                    self.sink.push(
                        Diagnostic::new(
                            DiagnosticKind::ParamRouteInMenu,
                            full.as_str(),
                            "parameterized route appears in the menu with its raw pattern",
                        )
                        .with_hint("declare `menuInstances` or set `showInMenu: false`"),
                    );
                }

                let key = node
                    .menu
                    .key
                    .clone()
                    .unwrap_or_else(|| derive_menu_key(&full));
                let key = self.unique_key(key, &full);

                let children = if node.is_index() {
                    None
                } else {
                    Some(self.build_level(&node.children, &full, false)).filter(|c| !c.is_empty())
                };

                out.push(MenuTreeNode {
                    path: full,
                    label: label.to_string(),
                    key,
                    icon: node.menu.icon.clone(),
                    children,
                });
            }
            // 5) ラベル無し: 子のエントリを同じ階層へ持ち上げる
            None if !node.is_index() => {
                let lifted = self.build_level(&node.children, &full, top);
                out.extend(lifted);
            }
            None => {}
        }
    }

    /// キーを登録する。重複していれば `-2`, `-3`, ... を付けて一意にする
    fn unique_key(&mut self, key: String, location: &str) -> String {
        if self.keys.insert(key.clone()) {
            return key;
        }

        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{}-{}", key, n);
            if !self.keys.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.sink.push(
            Diagnostic::new(
                DiagnosticKind::DuplicateMenuKey,
                location,
                format!("menu key `{}` is already used; renamed to `{}`", key, renamed),
            )
            .with_hint("give the entry an explicit `key`"),
        );
        self.keys.insert(renamed.clone());
        renamed
    }
}

/// キーに対応するメニューのパスを探す
pub fn find_path_by_key<'a>(menu: &'a [MenuTreeNode], key: &str) -> Option<&'a str> {
    for item in menu {
        if item.key == key {
            return Some(&item.path);
        }
        if let Some(children) = &item.children {
            if let Some(path) = find_path_by_key(children, key) {
                return Some(path);
            }
        }
    }
    None
}

/// パスに完全一致するメニューのキーを探す
pub fn find_key_by_path<'a>(menu: &'a [MenuTreeNode], path: &str) -> Option<&'a str> {
    for item in menu {
        if item.path == path {
            return Some(&item.key);
        }
        if let Some(children) = &item.children {
            if let Some(key) = find_key_by_path(children, path) {
                return Some(key);
            }
        }
    }
    None
}

/// 現在地に対して選択状態にするエントリと、その祖先の並び
///
/// 完全一致を優先し、無ければ最も長いパスでアクティブなものを選ぶ。
fn selected_trail<'a>(menu: &'a [MenuTreeNode], current_path: &str) -> Vec<&'a MenuTreeNode> {
    fn walk<'a>(
        nodes: &'a [MenuTreeNode],
        current_path: &str,
        stack: &mut Vec<&'a MenuTreeNode>,
        best: &mut Option<((bool, usize), Vec<&'a MenuTreeNode>)>,
    ) {
        for node in nodes {
            stack.push(node);
            if is_active(current_path, &node.path) {
                let score = (node.path == current_path, node.path.len());
                let better = match best {
                    Some((best_score, _)) => score > *best_score,
                    None => true,
                };
                if better {
                    *best = Some((score, stack.clone()));
                }
            }
            if let Some(children) = &node.children {
                walk(children, current_path, stack, best);
            }
            stack.pop();
        }
    }

    let mut best = None;
    walk(menu, current_path, &mut Vec::new(), &mut best);
    best.map(|(_, trail)| trail).unwrap_or_default()
}

/// 現在地で選択されるメニューキー (0 または 1 件)
pub fn selected_keys(menu: &[MenuTreeNode], current_path: &str) -> Vec<String> {
    selected_trail(menu, current_path)
        .last()
        .map(|node| vec![node.key.clone()])
        .unwrap_or_default()
}

/// 選択されたエントリを含むため開いておくべきサブメニューのキー
pub fn open_keys(menu: &[MenuTreeNode], current_path: &str) -> Vec<String> {
    let trail = selected_trail(menu, current_path);
    let ancestors = trail.len().saturating_sub(1);
    trail[..ancestors].iter().map(|node| node.key.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuInstance;

    fn keys(menu: &[MenuTreeNode]) -> Vec<&str> {
        menu.iter().map(|m| m.key.as_str()).collect()
    }

    fn sample() -> Vec<RouteSpecNode> {
        vec![
            RouteSpecNode::new("/login").component("@/pages/login").label("Login").hidden(),
            RouteSpecNode::new("/").component("@/components/Layout").children(vec![
                RouteSpecNode::new("").component("@/pages/Home").menu_label("Home").key("home"),
                RouteSpecNode::new("/about").component("@/pages/About").menu_label("About"),
                RouteSpecNode::new("/examples")
                    .menu_label("Examples")
                    .icon("AppstoreOutlined")
                    .key("examples")
                    .children(vec![
                        RouteSpecNode::new("users/:id").component("@/pages/UserDetail").instances(vec![
                            MenuInstance::new("/examples/users/123", "User 123").with_key("user-123"),
                            MenuInstance::new("/examples/users/456", "User 456"),
                        ]),
                        RouteSpecNode::new("blog/:slug?").component("@/pages/Blog"),
                    ]),
            ]),
        ]
    }

    #[test]
    fn test_wrapper_is_transparent_and_hidden_skipped() {
        let (menu, diagnostics) = build_menu_tree(&sample());
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(keys(&menu), vec!["home", "-about", "examples"]);
        assert_eq!(menu[0].path, "/");
        assert_eq!(menu[1].path, "/about");
    }

    #[test]
    fn test_menu_instances_become_leaves() {
        let (menu, _) = build_menu_tree(&sample());
        let examples = menu[2].children.as_ref().unwrap();
        assert_eq!(keys(examples), vec!["user-123", "-examples-users-456"]);
        assert_eq!(examples[1].path, "/examples/users/456");
        assert_eq!(examples[0].icon, None);
        assert!(examples.iter().all(|e| e.children.is_none()));
    }

    #[test]
    fn test_hidden_subtree_contributes_nothing() {
        let roots = vec![RouteSpecNode::new("/admin").label("Admin").hidden().children(vec![
            RouteSpecNode::new("users").component("Users").label("Users"),
            RouteSpecNode::new("roles").component("Roles").label("Roles"),
        ])];
        let (menu, _) = build_menu_tree(&roots);
        assert!(menu.is_empty());
    }

    #[test]
    fn test_unlabeled_group_lifts_children() {
        let roots = vec![RouteSpecNode::new("/settings").children(vec![
            RouteSpecNode::new("profile").component("Profile").label("Profile"),
            RouteSpecNode::new("hidden").component("Hidden"),
        ])];
        let (menu, _) = build_menu_tree(&roots);
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].path, "/settings/profile");
        assert!(menu[0].children.is_none());
    }

    #[test]
    fn test_empty_child_result_collapses() {
        let roots = vec![RouteSpecNode::new("/docs")
            .label("Docs")
            .children(vec![RouteSpecNode::new("intro").component("Intro")])];
        let (menu, _) = build_menu_tree(&roots);
        assert_eq!(menu[0].children, None);
    }

    #[test]
    fn test_duplicate_keys_get_suffix() {
        let roots = vec![
            RouteSpecNode::new("/a").component("A").label("A").key("same"),
            RouteSpecNode::new("/b").component("B").label("B").key("same"),
            RouteSpecNode::new("/c").component("C").label("C").key("same"),
        ];
        let (menu, diagnostics) = build_menu_tree(&roots);
        assert_eq!(keys(&menu), vec!["same", "same-2", "same-3"]);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::DuplicateMenuKey));
    }

    #[test]
    fn test_labeled_param_route_is_flagged() {
        let roots = vec![RouteSpecNode::new("/user/:id").component("User").label("User")];
        let (menu, diagnostics) = build_menu_tree(&roots);
        assert_eq!(menu[0].key, "-user--id");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ParamRouteInMenu);
    }

    #[test]
    fn test_idempotent() {
        let spec = sample();
        assert_eq!(build_menu_tree(&spec), build_menu_tree(&spec));
    }

    #[test]
    fn test_menu_queries() {
        let (menu, _) = build_menu_tree(&sample());
        assert_eq!(find_path_by_key(&menu, "user-123"), Some("/examples/users/123"));
        assert_eq!(find_key_by_path(&menu, "/about"), Some("-about"));
        assert_eq!(find_key_by_path(&menu, "/missing"), None);

        assert_eq!(selected_keys(&menu, "/"), vec!["home"]);
        assert_eq!(selected_keys(&menu, "/examples/users/123"), vec!["user-123"]);
        assert_eq!(open_keys(&menu, "/examples/users/123"), vec!["examples"]);
        assert_eq!(selected_keys(&menu, "/examples/blog/x"), vec!["examples"]);
        assert!(open_keys(&menu, "/about").is_empty());
        assert!(selected_keys(&menu, "/nowhere").is_empty());
    }
}
