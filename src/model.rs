// src/model.rs
use serde::{Deserialize, Serialize};

use crate::loader::DeferredHandle;

/// 作者が書くルート定義 1 件分 (読み込み直後の生の形)
///
/// `children` と `routes` はどちらも子ルートとして受け付ける。
/// `component` と `redirect` の排他はここでは検査せず、
/// [`RouteSpecNode`] への変換時に [`NodeKind`] として一度だけ分類する。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRouteNode {
    pub path: String,
    #[serde(default, alias = "componentRef")]
    pub component: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default, alias = "routes")]
    pub children: Option<Vec<RawRouteNode>>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub menu_label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub show_in_menu: Option<bool>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<String>>,
    #[serde(default)]
    pub menu_instances: Option<Vec<MenuInstance>>,
}

/// パラメータ付きルートがメニューに出す具体的なエントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuInstance {
    pub path: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl MenuInstance {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        MenuInstance {
            path: path.into(),
            label: label.into(),
            key: None,
            icon: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// ノードの種別。読み込み時に一度だけ決める。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// リダイレクト。`component` も書かれていた場合はそれを保持して診断に使う
    Redirect {
        target: String,
        shadowed_component: Option<String>,
    },
    /// 遅延ロードされるコンポーネント参照
    Component(String),
    /// どちらも無い (子をまとめるだけのノード、または行き止まり)
    Group,
}

/// メニュー表示用のメタデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuMeta {
    pub label: Option<String>,
    pub menu_label: Option<String>,
    pub icon: Option<String>,
    pub show_in_menu: bool,
    pub key: Option<String>,
    pub instances: Vec<MenuInstance>,
}

impl Default for MenuMeta {
    fn default() -> Self {
        MenuMeta {
            label: None,
            menu_label: None,
            icon: None,
            show_in_menu: true,
            key: None,
            instances: Vec::new(),
        }
    }
}

/// 分類済みのルート定義ノード。一度読み込んだら変更しない。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRouteNode")]
pub struct RouteSpecNode {
    /// セグメントまたはパターン。空文字は親のインデックスルート
    pub path: String,
    pub kind: NodeKind,
    pub children: Vec<RouteSpecNode>,
    pub menu: MenuMeta,
    /// 宣言された動的パラメータ名 (検証・ドキュメント用)
    pub params: Vec<String>,
}

impl From<RawRouteNode> for RouteSpecNode {
    fn from(raw: RawRouteNode) -> Self {
        let kind = match (raw.redirect, raw.component) {
            (Some(target), shadowed_component) => NodeKind::Redirect {
                target,
                shadowed_component,
            },
            (None, Some(reference)) => NodeKind::Component(reference),
            (None, None) => NodeKind::Group,
        };

        RouteSpecNode {
            path: raw.path,
            kind,
            children: raw
                .children
                .unwrap_or_default()
                .into_iter()
                .map(RouteSpecNode::from)
                .collect(),
            menu: MenuMeta {
                label: raw.label,
                menu_label: raw.menu_label,
                icon: raw.icon,
                show_in_menu: raw.show_in_menu.unwrap_or(true),
                key: raw.key,
                instances: raw.menu_instances.unwrap_or_default(),
            },
            params: raw.params.unwrap_or_default(),
        }
    }
}

impl RouteSpecNode {
    /// 子も種別も持たないノードを作る (コード上でルート定義を組み立てる用)
    pub fn new(path: impl Into<String>) -> Self {
        RouteSpecNode {
            path: path.into(),
            kind: NodeKind::Group,
            children: Vec::new(),
            menu: MenuMeta::default(),
            params: Vec::new(),
        }
    }

    pub fn component(mut self, reference: impl Into<String>) -> Self {
        self.kind = match self.kind {
            NodeKind::Redirect { target, .. } => NodeKind::Redirect {
                target,
                shadowed_component: Some(reference.into()),
            },
            _ => NodeKind::Component(reference.into()),
        };
        self
    }

    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        let shadowed_component = match self.kind {
            NodeKind::Component(reference) => Some(reference),
            NodeKind::Redirect {
                shadowed_component, ..
            } => shadowed_component,
            NodeKind::Group => None,
        };
        self.kind = NodeKind::Redirect {
            target: target.into(),
            shadowed_component,
        };
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.menu.label = Some(label.into());
        self
    }

    pub fn menu_label(mut self, label: impl Into<String>) -> Self {
        self.menu.menu_label = Some(label.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.menu.icon = Some(icon.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.menu.key = Some(key.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.menu.show_in_menu = false;
        self
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn instances(mut self, instances: Vec<MenuInstance>) -> Self {
        self.menu.instances = instances;
        self
    }

    pub fn children(mut self, children: Vec<RouteSpecNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_index(&self) -> bool {
        self.path.is_empty()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// `path: "/"` で子を持つ、共通レイアウトを載せるためだけのノード
    pub fn is_root_wrapper(&self) -> bool {
        self.path == "/" && self.has_children()
    }

    /// メニューに出すラベル (`menuLabel` 優先)
    pub fn display_label(&self) -> Option<&str> {
        self.menu
            .menu_label
            .as_deref()
            .or(self.menu.label.as_deref())
    }

    /// リダイレクトでもコンポーネントでもない子なしノード
    pub fn is_dead_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Group) && !self.has_children()
    }
}

/// 兄弟の並びを、インデックスノードが抱えた子を親側へ付け替えた形で返す
///
/// インデックスルートは子を持てないため、その子は直後の兄弟として扱う。
/// ルートツリーとメニューツリーの両方がこの並びを使う。
pub(crate) fn attached_children(nodes: &[RouteSpecNode]) -> Vec<&RouteSpecNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        out.push(node);
        if node.is_index() {
            out.extend(attached_children(&node.children));
        }
    }
    out
}

/// ルーターランタイムへ渡す実行用ルートノード
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTreeNode {
    /// 親からの相対パス。インデックスルートでは None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "index", skip_serializing_if = "std::ops::Not::not")]
    pub is_index: bool,
    #[serde(rename = "component", skip_serializing_if = "Option::is_none")]
    pub component_loader: Option<DeferredHandle>,
    #[serde(rename = "redirect", skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RouteTreeNode>>,
}

/// ナビゲーション UI へ渡すメニューノード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuTreeNode {
    /// 常に絶対パス
    pub path: String,
    pub label: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MenuTreeNode>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_node_classification() {
        let node: RouteSpecNode = serde_json::from_str(
            r#"{ "path": "/old", "redirect": "/new", "component": "@/pages/Old" }"#,
        )
        .unwrap();
        assert_eq!(
            node.kind,
            NodeKind::Redirect {
                target: "/new".into(),
                shadowed_component: Some("@/pages/Old".into()),
            }
        );

        let node: RouteSpecNode =
            serde_json::from_str(r#"{ "path": "about", "component": "@/pages/About" }"#).unwrap();
        assert_eq!(node.kind, NodeKind::Component("@/pages/About".into()));
        assert!(node.menu.show_in_menu);
    }

    #[test]
    fn test_routes_alias_for_children() {
        let node: RouteSpecNode = serde_json::from_str(
            r#"{ "path": "/", "component": "@/components/Layout",
                 "routes": [ { "path": "", "component": "@/pages/Home" } ] }"#,
        )
        .unwrap();
        assert!(node.is_root_wrapper());
        assert!(node.children[0].is_index());
    }

    #[test]
    fn test_attached_children_lifts_index_children() {
        let nodes = vec![
            RouteSpecNode::new("")
                .component("Home")
                .children(vec![RouteSpecNode::new("stray").component("Stray")]),
            RouteSpecNode::new("about").component("About"),
        ];
        let paths: Vec<&str> = attached_children(&nodes)
            .iter()
            .map(|n| n.path.as_str())
            .collect();
        assert_eq!(paths, vec!["", "stray", "about"]);
    }

    #[test]
    fn test_builder_redirect_keeps_shadowed_component() {
        let node = RouteSpecNode::new("x").component("X").redirect("/y");
        assert!(matches!(
            node.kind,
            NodeKind::Redirect { shadowed_component: Some(_), .. }
        ));
        assert_eq!(node.display_label(), None);
        assert!(!node.is_dead_leaf());
    }
}
