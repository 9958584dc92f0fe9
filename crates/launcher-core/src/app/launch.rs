//! Launcher - 1 タスク分の起動シーケンス
//!
//! # フロー
//! 1. Started を DiagnosticSink に書く
//! 2. ModuleActivator で modules を読み込む（失敗したらここで終了、プログラムは起動しない）
//! 3. locale 変数を UTF-8 に上書き
//! 4. command + [index] を組み立てる
//! 5. ProgramRunner で実行
//! 6. Finished を書く
//! 7. プログラムの終了コードをそのまま返す
//!
//! リトライもエラー変換もしない。失敗時の再投入は scheduler の仕事。

use std::sync::Arc;

use crate::domain::{ArrayRange, LaunchError, LocaleSetting, TaskContext};
use crate::impls::{InheritActivator, ProcessRunner, WriterSink};
use crate::ports::{
    Clock, Diagnostic, DiagnosticSink, Invocation, ModuleActivator, ModuleSpec, ProgramRunner,
    SystemClock,
};

/// What to run for every task of the array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub job_name: String,
    /// argv prefix; the task index is appended.
    pub command: Vec<String>,
    pub modules: Vec<ModuleSpec>,
    pub locale: LocaleSetting,
    /// Range declared at submission, if known. Only used to warn.
    pub declared_range: Option<ArrayRange>,
}

pub struct Launcher {
    activator: Arc<dyn ModuleActivator>,
    runner: Arc<dyn ProgramRunner>,
    sink: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
}

impl Launcher {
    pub fn builder() -> LauncherBuilder {
        LauncherBuilder::new()
    }

    /// Run one task. `Ok(code)` is the program's exit code, whatever it is.
    pub async fn launch(&self, plan: &LaunchPlan, ctx: &TaskContext) -> Result<i32, LaunchError> {
        let job_name = ctx.job_name_or(&plan.job_name);

        if let Some(range) = &plan.declared_range
            && !range.contains(ctx.task)
        {
            tracing::warn!(
                task = %ctx.task,
                range = %range,
                "task index is outside the declared array range"
            );
        }

        self.sink
            .emit(&Diagnostic::started(ctx, job_name, self.clock.now()))?;

        let mut env = self.activator.activate(&plan.modules).await?;
        plan.locale.apply(&mut env);

        let invocation = Invocation::for_task(&plan.command, ctx.task, env)?;
        tracing::info!(
            job_id = %ctx.job_id,
            task = %ctx.task,
            argv = ?invocation.argv(),
            "starting program"
        );

        let code = self.runner.run(&invocation).await?;
        tracing::info!(job_id = %ctx.job_id, task = %ctx.task, code, "program exited");

        self.sink
            .emit(&Diagnostic::finished(ctx, job_name, code, self.clock.now()))?;
        Ok(code)
    }
}

/// LauncherBuilder は Launcher を構築
///
/// 何も指定しなければ本番用の実装（InheritActivator, ProcessRunner,
/// stdout への WriterSink, SystemClock）になる。
pub struct LauncherBuilder {
    activator: Arc<dyn ModuleActivator>,
    runner: Arc<dyn ProgramRunner>,
    sink: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
}

impl LauncherBuilder {
    pub fn new() -> Self {
        Self {
            activator: Arc::new(InheritActivator),
            runner: Arc::new(ProcessRunner),
            sink: Arc::new(WriterSink::stdout()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn activator(mut self, activator: Arc<dyn ModuleActivator>) -> Self {
        self.activator = activator;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ProgramRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Launcher {
        Launcher {
            activator: self.activator,
            runner: self.runner,
            sink: self.sink,
            clock: self.clock,
        }
    }
}

impl Default for LauncherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
