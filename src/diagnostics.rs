// src/diagnostics.rs
//! コンパイル中に見つかった設定上の問題。
//!
//! どれもコンパイル全体を止めない。木と一緒に呼び出し側へ返し、
//! 続行するか中断するかは呼び出し側が決める。

use serde::Serialize;
use std::fmt;
use tracing::warn;

/// 診断の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// 診断の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `redirect` と `component` が両方ある (redirect が優先)
    RedirectShadowsComponent,
    /// 同じフルパスを 2 つのノードが主張している (先勝ち)
    DuplicatePath,
    /// インデックスルートが子を持っている (子は親へ付け替え)
    IndexWithChildren,
    /// 最上位にインデックスルートがある
    IndexAtRoot,
    /// component も redirect も子も無い
    DeadLeaf,
    /// メニューキーの重複 (後から来た方に連番を付ける)
    DuplicateMenuKey,
    /// パラメータ付きルートが menuInstances なしでメニューに出る
    ParamRouteInMenu,
    /// ネストした子のパスが `/` で始まっている (相対として扱う)
    AbsoluteChildPath,
    /// `params` の宣言とパターン中のパラメータが食い違う
    ParamsMismatch,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::DuplicatePath
            | DiagnosticKind::IndexWithChildren
            | DiagnosticKind::DuplicateMenuKey => Severity::Error,
            DiagnosticKind::RedirectShadowsComponent
            | DiagnosticKind::IndexAtRoot
            | DiagnosticKind::DeadLeaf => Severity::Warning,
            DiagnosticKind::ParamRouteInMenu
            | DiagnosticKind::AbsoluteChildPath
            | DiagnosticKind::ParamsMismatch => Severity::Info,
        }
    }
}

/// 1 件の診断
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// 問題のノードのフルパス
    pub location: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            severity: kind.severity(),
            location: location.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// 診断の収集先。追加時にログにも流す
#[derive(Debug, Default)]
pub(crate) struct Sink {
    items: Vec<Diagnostic>,
}

impl Sink {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(
            kind = ?diagnostic.kind,
            location = %diagnostic.location,
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
