// src/loader.rs
use path_absolutize::Absolutize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 遅延ロード用のハンドル
///
/// コンパイラは参照文字列をそのまま渡すだけで、モジュールの読み込みはしない。
/// `module` はローダーが参照を解決できた場合のみ埋まる (ファイルの存在は確認しない)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredHandle {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<PathBuf>,
}

impl DeferredHandle {
    pub fn opaque(reference: impl Into<String>) -> Self {
        DeferredHandle {
            reference: reference.into(),
            module: None,
        }
    }
}

/// コンポーネント参照から遅延ハンドルを作る外部機能
///
/// `Fn(&str) -> DeferredHandle` なクロージャもそのまま使える。
pub trait ComponentLoader {
    fn defer(&self, reference: &str) -> DeferredHandle;
}

impl<F> ComponentLoader for F
where
    F: Fn(&str) -> DeferredHandle,
{
    fn defer(&self, reference: &str) -> DeferredHandle {
        self(reference)
    }
}

/// 参照を一切解釈せずに包むだけのローダー
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughLoader;

impl ComponentLoader for PassThroughLoader {
    fn defer(&self, reference: &str) -> DeferredHandle {
        DeferredHandle::opaque(reference)
    }
}

/// `@/pages/Home` のようなエイリアス付き参照をプロジェクト内のパスへ解決するローダー
///
/// 解決は字句的に行うだけで、ファイルシステムには触れない。
#[derive(Debug, Clone)]
pub struct AliasLoader {
    project_root: PathBuf,
    /// (接頭辞, プロジェクトルートからのディレクトリ)。長い接頭辞が優先
    aliases: Vec<(String, PathBuf)>,
    /// `../pages/Home` のような素の相対参照の基準ディレクトリ
    relative_base: PathBuf,
}

impl AliasLoader {
    /// 既定のエイリアス (`@/` → `src/`, `./` → `src/pages/`) で作る
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        AliasLoader {
            project_root: project_root.into(),
            aliases: Vec::new(),
            relative_base: PathBuf::from("src/router"),
        }
        .with_alias("@/", "src")
        .with_alias("./", "src/pages")
    }

    /// 接頭辞を追加または上書きする
    pub fn with_alias(mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into();
        self.aliases.retain(|(p, _)| *p != prefix);
        self.aliases.push((prefix, dir.into()));
        self.aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    pub fn with_relative_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.relative_base = dir.into();
        self
    }

    /// 参照文字列をモジュールパスへ解決する。解釈できなければ None
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        // 1) エイリアス接頭辞に一致すればそのディレクトリを基準にする
        let candidate = match self
            .aliases
            .iter()
            .find(|(prefix, _)| reference.starts_with(prefix.as_str()))
        {
            Some((prefix, dir)) => self.project_root.join(dir).join(&reference[prefix.len()..]),
            // 2) `../` で始まる素の相対参照はルーター定義のディレクトリが基準
            None if reference.starts_with("../") => {
                self.project_root.join(&self.relative_base).join(reference)
            }
            // 3) それ以外はパッケージ名などとみなして解決しない
            None => return None,
        };

        absolutize(&candidate)
    }
}

fn absolutize(candidate: &Path) -> Option<PathBuf> {
    match candidate.absolutize() {
        Ok(abs) => Some(abs.to_path_buf()),
        Err(e) => {
            warn!("failed to absolutize {:?}: {}", candidate, e);
            None
        }
    }
}

impl ComponentLoader for AliasLoader {
    fn defer(&self, reference: &str) -> DeferredHandle {
        let module = self.resolve(reference);
        debug!(reference, ?module, "deferred component");
        DeferredHandle {
            reference: reference.to_string(),
            module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        let loader = AliasLoader::new("/proj");
        assert_eq!(
            loader.resolve("@/pages/Home"),
            Some(PathBuf::from("/proj/src/pages/Home"))
        );
        assert_eq!(
            loader.resolve("@/components/Layout"),
            Some(PathBuf::from("/proj/src/components/Layout"))
        );
        assert_eq!(
            loader.resolve("./UserDetail"),
            Some(PathBuf::from("/proj/src/pages/UserDetail"))
        );
        assert_eq!(
            loader.resolve("../pages/About"),
            Some(PathBuf::from("/proj/src/pages/About"))
        );
        assert_eq!(loader.resolve("some-package"), None);
    }

    #[test]
    fn test_longest_alias_wins() {
        let loader = AliasLoader::new("/proj").with_alias("@/layouts/", "app/shell");
        assert_eq!(
            loader.resolve("@/layouts/Admin"),
            Some(PathBuf::from("/proj/app/shell/Admin"))
        );
    }

    #[test]
    fn test_handle_keeps_reference_unmodified() {
        let handle = AliasLoader::new("/proj").defer("@/pages/Home");
        assert_eq!(handle.reference, "@/pages/Home");

        let closure = |r: &str| DeferredHandle::opaque(format!("lazy:{r}"));
        assert_eq!(closure.defer("X").reference, "lazy:X");
        assert_eq!(PassThroughLoader.defer("X"), DeferredHandle::opaque("X"));
    }
}
