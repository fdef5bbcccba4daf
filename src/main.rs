// src/main.rs

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use route_tree_compiler::path::instantiate;
use route_tree_compiler::source::{DEFAULT_VARIABLE, discover, load_spec};
use route_tree_compiler::{
    AliasLoader, CompileOptions, Fallback, compile, open_keys, route_constants, selected_keys,
};

/// 出力する内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Routes,
    Menu,
    Constants,
    All,
}

/// CLI 引数定義
#[derive(Parser, Debug)]
#[command(
    name = "route-tree-compiler",
    version,
    about = "宣言的なルート定義をルートツリーとメニューツリーへコンパイルして JSON 出力する CLI ツール"
)]
struct Cli {
    /// ルート定義ファイル (.json / .ts / .tsx / .js)
    #[arg(short = 's', long = "spec", value_name = "FILE", required_unless_present_any = ["project_root", "instantiate"])]
    spec: Option<PathBuf>,

    /// プロジェクトルート。--spec が無ければこの配下からルート定義ファイルを探す。
    /// コンポーネント参照のエイリアス解決の基準にもなる
    #[arg(short = 'r', long = "project-root", value_name = "DIR")]
    project_root: Option<PathBuf>,

    /// TS / JS モジュールから取り出す配列の変数名
    #[arg(long, default_value = DEFAULT_VARIABLE)]
    variable: String,

    /// コンポーネント参照のエイリアス (例: `@/=src/`)。複数指定可
    #[arg(long = "alias", value_name = "PREFIX=DIR", value_parser = parse_key_val)]
    aliases: Vec<(String, String)>,

    /// 未知の URL をこのパスへリダイレクトするキャッチオールを追加する
    #[arg(long, value_name = "PATH")]
    fallback_redirect: Option<String>,

    /// 出力内容
    #[arg(long, value_enum, default_value_t = Emit::All)]
    emit: Emit,

    /// 現在地のパス。メニューの選択キーと展開キーを出力に加える
    #[arg(long, value_name = "PATH")]
    active: Option<String>,

    /// パスパターンを具体化して表示するだけのモード
    #[arg(long, value_name = "PATTERN")]
    instantiate: Option<String>,

    /// --instantiate に渡すパラメータ (例: `id=123`)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// エラー重大度の診断があれば終了コード 1 で終わる
    #[arg(long)]
    strict: bool,

    /// 整形して出力する
    #[arg(long)]
    pretty: bool,

    /// RUST_LOG が無いときのログレベル
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))
}

fn init_logging(level: &str) {
    // 標準出力は JSON 専用なのでログは標準エラーへ
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    // 1) CLI 引数をパースし、ログを初期化
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    // 2) 具体化モードならそれだけ行って終了
    if let Some(pattern) = &cli.instantiate {
        let values: HashMap<String, String> = cli.params.iter().cloned().collect();
        let url = instantiate(pattern, &values)?;
        println!("{}", url);
        return Ok(());
    }

    // 3) ルート定義ファイルを決める
    let spec_path = match (&cli.spec, &cli.project_root) {
        (Some(spec), _) => spec.clone(),
        (None, Some(root)) => {
            let candidates = discover(root)?;
            for skipped in &candidates[1..] {
                warn!(file = ?skipped, "additional route file ignored");
            }
            candidates[0].clone()
        }
        (None, None) => bail!("either --spec or --project-root is required"),
    };
    info!(file = ?spec_path, "using route spec");

    // 4) 読み込み
    let roots = load_spec(&spec_path, &cli.variable)
        .with_context(|| format!("failed to load route spec {:?}", spec_path))?;

    // 5) コンパイル
    let project_root = cli.project_root.clone().unwrap_or_else(|| PathBuf::from("."));
    let loader = cli
        .aliases
        .iter()
        .fold(AliasLoader::new(project_root), |loader, (prefix, dir)| {
            loader.with_alias(prefix.clone(), dir.clone())
        });
    let options = CompileOptions {
        fallback: cli.fallback_redirect.clone().map(Fallback::Redirect),
    };
    let output = compile(&roots, &loader, &options);

    // 6) 必要な部分だけ JSON 化して標準出力
    let mut doc = Map::new();
    if matches!(cli.emit, Emit::Routes | Emit::All) {
        doc.insert("routes".into(), serde_json::to_value(&output.routes)?);
    }
    if matches!(cli.emit, Emit::Menu | Emit::All) {
        doc.insert("menu".into(), serde_json::to_value(&output.menu)?);
    }
    if matches!(cli.emit, Emit::Constants | Emit::All) {
        doc.insert("constants".into(), serde_json::to_value(route_constants(&roots))?);
    }
    if let Some(current) = &cli.active {
        doc.insert(
            "active".into(),
            json!({
                "path": current,
                "selectedKeys": selected_keys(&output.menu, current),
                "openKeys": open_keys(&output.menu, current),
            }),
        );
    }
    doc.insert("diagnostics".into(), serde_json::to_value(&output.diagnostics)?);

    let doc = Value::Object(doc);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    println!("{}", json);

    // 7) strict モードではエラー診断を終了コードに反映
    if cli.strict && output.has_errors() {
        eprintln!("Error: route spec has configuration errors");
        std::process::exit(1);
    }

    Ok(())
}
