//! launcher-core
//!
//! Building blocks for running one task of a Grid Engine array job.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（task index, array range, wall-clock, log templates, directives, context, environment, errors）
//! - **ports**: 抽象化レイヤー（ModuleActivator, ProgramRunner, DiagnosticSink, Clock）
//! - **impls**: 実装（shell による module activation, tokio process runner, writer/memory sink）
//! - **app**: アプリケーションロジック（launch sequence, job script, input inventory, submit）
//! - **config**: TOML のジョブ設定

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;
pub mod config;
pub mod shell;
