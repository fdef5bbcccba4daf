//! 宣言的なルート定義を、ルーターランタイム向けのルートツリーと
//! ナビゲーション用のメニューツリーへコンパイルする。
//!
//! ```
//! use route_tree_compiler::{CompileOptions, PassThroughLoader, RouteSpecNode, compile};
//!
//! let spec = vec![RouteSpecNode::new("/").component("@/components/Layout").children(vec![
//!     RouteSpecNode::new("").component("@/pages/Home").menu_label("Home"),
//!     RouteSpecNode::new("/about").component("@/pages/About").menu_label("About"),
//! ])];
//!
//! let out = compile(&spec, &PassThroughLoader, &CompileOptions::default());
//! assert_eq!(out.routes.len(), 1);
//! assert_eq!(out.menu.len(), 2);
//! assert!(out.diagnostics.is_empty());
//! ```

pub mod compile;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod menu_tree;
pub mod model;
pub mod parser;
pub mod path;
pub mod route_tree;
pub mod source;

pub use compile::{CompileOptions, CompileOutput, Fallback, compile, route_constants};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{PathError, SourceError};
pub use loader::{AliasLoader, ComponentLoader, DeferredHandle, PassThroughLoader};
pub use menu_tree::{build_menu_tree, find_key_by_path, find_path_by_key, open_keys, selected_keys};
pub use model::{MenuInstance, MenuTreeNode, NodeKind, RouteSpecNode, RouteTreeNode};
pub use route_tree::build_route_tree;
