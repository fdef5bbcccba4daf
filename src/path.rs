// src/path.rs
//! パスの合成とパラメータ処理。すべて副作用のない純粋関数。

use std::collections::HashMap;

use crate::error::PathError;

pub const SEPARATOR: char = '/';
const PARAM_MARKER: char = ':';
const OPTIONAL_MARKER: char = '?';

/// パスを正規形にする
///
/// 連続する `/` を 1 つにまとめ、先頭に `/` を 1 つだけ付け、末尾の `/` は落とす。
/// 空になった場合はルート `/` を返す。
///
/// ```
/// use route_tree_compiler::path::normalize;
///
/// assert_eq!(normalize("about//team/"), "/about/team");
/// assert_eq!(normalize(""), "/");
/// ```
pub fn normalize(path: &str) -> String {
    let joined = path
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined)
}

/// 親のフルパスと子セグメントを合成する
///
/// 子が空文字ならインデックスルートなので親のパスそのものになる。
/// 子が `/` で始まっていてもルートへは戻らず、常に親からの相対として扱う。
///
/// ```
/// use route_tree_compiler::path::compose;
///
/// assert_eq!(compose("/examples", "users/:id"), "/examples/users/:id");
/// assert_eq!(compose("/", "/about"), "/about");
/// assert_eq!(compose("/examples", ""), "/examples");
/// assert_eq!(compose("", ""), "/");
/// ```
pub fn compose(parent_full_path: &str, child_segment: &str) -> String {
    if child_segment.is_empty() {
        return normalize(parent_full_path);
    }
    normalize(&format!("{}/{}", parent_full_path, child_segment))
}

/// パターン中の 1 セグメント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Static(&'a str),
    Param { name: &'a str, optional: bool },
}

/// 1 セグメントを分類する (`:name` / `:name?` / それ以外)
pub fn classify_segment(segment: &str) -> Segment<'_> {
    match segment.strip_prefix(PARAM_MARKER) {
        Some(rest) => {
            let (name, optional) = match rest.strip_suffix(OPTIONAL_MARKER) {
                Some(name) => (name, true),
                None => (rest, false),
            };
            if name.is_empty() {
                Segment::Static(segment)
            } else {
                Segment::Param { name, optional }
            }
        }
        None => Segment::Static(segment),
    }
}

/// パターンをセグメント列に分解する (空セグメントは捨てる)
pub fn segments(pattern: &str) -> impl Iterator<Item = Segment<'_>> {
    pattern
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(classify_segment)
}

/// パターンに含まれるパラメータ名を左から順に、重複なしで返す
///
/// ```
/// use route_tree_compiler::path::extract_param_names;
///
/// assert_eq!(extract_param_names("/blog/:slug?"), vec!["slug"]);
/// assert_eq!(extract_param_names("/product/:category/:id"), vec!["category", "id"]);
/// ```
pub fn extract_param_names(pattern: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for segment in segments(pattern) {
        if let Segment::Param { name, .. } = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// パターンが動的パラメータを含むかどうか
pub fn has_params(pattern: &str) -> bool {
    segments(pattern).any(|s| matches!(s, Segment::Param { .. }))
}

/// パターンのパラメータを値で置き換えて具体的な URL を作る
///
/// 必須パラメータの値が無い (または空) ならエラー。
/// 省略可能パラメータの値が無ければそのセグメントごと消える。
pub fn instantiate(pattern: &str, values: &HashMap<String, String>) -> Result<String, PathError> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in segments(pattern) {
        match segment {
            Segment::Static(text) => parts.push(text),
            Segment::Param { name, optional } => {
                match values.get(name).map(String::as_str).filter(|v| !v.is_empty()) {
                    Some(value) => parts.push(value),
                    None if optional => {}
                    None => {
                        return Err(PathError::MissingParam {
                            param: name.to_string(),
                            pattern: pattern.to_string(),
                        });
                    }
                }
            }
        }
    }

    let joined = parts.join("/");
    if pattern.starts_with(SEPARATOR) {
        Ok(format!("/{}", joined))
    } else {
        Ok(joined)
    }
}

/// メニュー項目が現在地に対してアクティブかどうか
///
/// ルート `/` は完全一致のみ。それ以外は前方一致。
pub fn is_active(current_path: &str, candidate_path: &str) -> bool {
    if candidate_path == "/" {
        return current_path == "/";
    }
    current_path.starts_with(candidate_path)
}

/// フルパスからメニューキーを導出する (`/` と `:` を `-` に置換)
pub fn derive_menu_key(full_path: &str) -> String {
    full_path.replace([SEPARATOR, PARAM_MARKER], "-")
}

/// フルパスから定数名 (UPPER_SNAKE) を導出する
///
/// `/` は `HOME`、`*` セグメントは `NOT_FOUND` になる。
pub fn constant_name(full_path: &str) -> String {
    let parts: Vec<String> = segments(full_path)
        .map(|segment| match segment {
            Segment::Param { name, .. } => name.to_string(),
            Segment::Static("*") => "NOT_FOUND".to_string(),
            Segment::Static(text) => text.to_string(),
        })
        .map(|part| {
            part.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
                .collect::<String>()
        })
        .collect();

    let name = parts
        .join("_")
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if name.is_empty() {
        "HOME".to_string()
    } else {
        name
    }
}
