// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// パスパターンの具体化 (instantiate) で起きるエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// 必須パラメータに値が与えられなかった
    #[error("missing required parameter `{param}` for pattern `{pattern}`")]
    MissingParam { param: String, pattern: String },
}

/// ルート定義ファイルの読み込みで起きるエラー
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid route JSON in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("parse error in `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no route array named `{variable}` found in `{path}`")]
    RoutesNotFound { path: PathBuf, variable: String },

    #[error("unsupported route file extension: `{0}`")]
    UnsupportedExtension(PathBuf),

    #[error("no route definition file found under `{0}`")]
    NoRouteFiles(PathBuf),
}
