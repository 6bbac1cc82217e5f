//! # dlhex CLI
//!
//! DL アトム付き解集合プログラムを実行するコマンドラインツール
//!
//! - `run`: JSON ジョブ (オントロジー・設定・プログラム) の評価
//! - `classify`: オントロジーの分類結果の表示
//! - `check`: ABox の整合性と矛盾の確認

pub mod commands;
pub mod job;
