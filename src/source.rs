// src/source.rs
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::SourceError;
use crate::model::RouteSpecNode;
use crate::parser::parse_routes_in_file;

/// TS / JS モジュールから取り出す既定の変数名
pub const DEFAULT_VARIABLE: &str = "routeConfigs";

/// 探索をスキップするディレクトリ
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "build"];

/// ルート定義ファイルを読み込む
///
/// `.json` はそのまま配列としてデシリアライズし、
/// `.ts` / `.tsx` / `.js` / `.jsx` は AST から `variable` の配列を取り出す。
pub fn load_spec(path: &Path, variable: &str) -> Result<Vec<RouteSpecNode>, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let roots = match ext {
        "json" => {
            let src = fs::read_to_string(path).map_err(|e| SourceError::Io(path.to_path_buf(), e))?;
            serde_json::from_str::<Vec<RouteSpecNode>>(&src)
                .map_err(|e| SourceError::Json(path.to_path_buf(), e))?
        }
        "ts" | "tsx" | "js" | "jsx" | "mts" | "mjs" => parse_routes_in_file(path, variable)?
            .into_iter()
            .map(RouteSpecNode::from)
            .collect(),
        _ => return Err(SourceError::UnsupportedExtension(path.to_path_buf())),
    };

    info!(file = ?path, roots = roots.len(), "route spec loaded");
    Ok(roots)
}

/// ファイル名がルート定義ファイルらしいかどうか
fn is_route_file(name: &str) -> bool {
    matches!(
        name,
        "routeData.ts" | "routes.ts" | "routes.tsx" | "routes.json"
    ) || name.ends_with(".routes.ts")
        || name.ends_with(".routes.json")
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

/// プロジェクト配下のルート定義ファイル候補を列挙する (ソート済み)
pub fn discover(project_root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut found: Vec<PathBuf> = WalkDir::new(project_root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(is_route_file))
        .map(|e| e.into_path())
        .collect();

    // 重複を除去
    found.sort();
    found.dedup();

    if found.is_empty() {
        return Err(SourceError::NoRouteFiles(project_root.to_path_buf()));
    }
    for path in &found {
        debug!(file = ?path, "route file candidate");
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn test_is_route_file() {
        assert!(is_route_file("routeData.ts"));
        assert!(is_route_file("admin.routes.json"));
        assert!(!is_route_file("config.ts"));
    }

    #[test]
    fn test_discover_skips_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let router = dir.path().join("src/router");
        fs::create_dir_all(&router).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(router.join("routeData.ts"), "export const routeConfigs = [];").unwrap();
        fs::write(dir.path().join("node_modules/pkg/routes.ts"), "").unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found, vec![router.join("routeData.ts")]);
    }

    #[test]
    fn test_discover_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(discover(dir.path()), Err(SourceError::NoRouteFiles(_))));
    }

    #[test]
    fn test_load_json_and_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("routes.json");
        fs::write(
            &json,
            r#"[ { "path": "/old", "redirect": "/new" },
                 { "path": "/new", "componentRef": "@/pages/New", "label": "New" } ]"#,
        )
        .unwrap();
        let roots = load_spec(&json, DEFAULT_VARIABLE).unwrap();
        assert_eq!(roots.len(), 2);
        assert!(matches!(roots[0].kind, NodeKind::Redirect { .. }));
        assert_eq!(roots[1].display_label(), Some("New"));

        let yaml = dir.path().join("routes.yaml");
        fs::write(&yaml, "").unwrap();
        assert!(matches!(
            load_spec(&yaml, DEFAULT_VARIABLE),
            Err(SourceError::UnsupportedExtension(_))
        ));
    }
}
