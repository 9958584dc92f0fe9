//! Subcommand handlers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use launcher_core::app::{JobScript, Launcher};
use launcher_core::config::LauncherConfig;
use launcher_core::domain::{LaunchError, TaskContext, TaskIndex, TemplateVars};
use launcher_core::impls::InheritActivator;
use launcher_core::ports::ModuleActivator;
use launcher_core::shell;

fn load(path: &Path) -> Result<LauncherConfig> {
    LauncherConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

/// Exit status the OS can carry; anything outside 0..=255 becomes 1.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

pub async fn run(config_path: &Path, index: Option<u32>) -> Result<ExitCode> {
    let config = load(config_path)?;
    let index = index.map(TaskIndex::try_from).transpose()?;
    let ctx = TaskContext::from_env(&config.scheduler.task_id_var, index)?;
    let plan = config.launch_plan();

    let activator: Arc<dyn ModuleActivator> = if plan.modules.is_empty() {
        Arc::new(InheritActivator)
    } else {
        Arc::new(config.activator())
    };
    let launcher = Launcher::builder().activator(activator).build();

    let code = launcher
        .launch(&plan, &ctx)
        .await
        .map_err(|err| launch_failure(&ctx, err))?;
    Ok(ExitCode::from(exit_byte(code)))
}

fn launch_failure(ctx: &TaskContext, err: LaunchError) -> anyhow::Error {
    let kind = err.kind();
    tracing::error!(
        %kind,
        job_id = %ctx.job_id,
        task = %ctx.task,
        error = %err,
        "launch failed"
    );
    anyhow::Error::new(err).context(format!("job {} task {} ({kind})", ctx.job_id, ctx.task))
}

fn build_script(config_path: &Path, config: &LauncherConfig, launcher: Option<PathBuf>) -> Result<String> {
    let array = config.resolve_range()?;
    let launcher = match launcher {
        Some(path) => path,
        None => std::env::current_exe().context("locating the launcher binary")?,
    };
    let config_file = std::path::absolute(config_path)
        .with_context(|| format!("resolving {}", config_path.display()))?;

    let script = JobScript {
        directives: config.directives(array),
        shell: config.scheduler.script_shell.clone(),
        launcher,
        config: config_file,
    };
    Ok(script.render())
}

pub fn render(config_path: &Path, launcher: Option<PathBuf>) -> Result<ExitCode> {
    let config = load(config_path)?;
    print!("{}", build_script(config_path, &config, launcher)?);
    Ok(ExitCode::SUCCESS)
}

pub async fn submit(config_path: &Path, launcher: Option<PathBuf>, dry_run: bool) -> Result<ExitCode> {
    let config = load(config_path)?;
    let script = build_script(config_path, &config, launcher)?;

    if dry_run {
        print!("{script}");
        return Ok(ExitCode::SUCCESS);
    }

    let receipt = config.submitter().submit(&script).await?;
    print!("{}", receipt.stdout);
    if let Some(job_id) = &receipt.job_id {
        tracing::info!(%job_id, job = %config.job.name, "array job submitted");
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Serialize)]
struct PlanView {
    job: String,
    queue: Option<String>,
    array: String,
    tasks: usize,
    command: Vec<String>,
    modules: Vec<String>,
    locale: String,
    stdout_first_task: PathBuf,
    stderr_first_task: PathBuf,
    directives: Vec<String>,
}

pub fn plan(config_path: &Path, json: bool) -> Result<ExitCode> {
    let config = load(config_path)?;
    let array = config.resolve_range()?;
    let directives = config.directives(array);

    let preview = TemplateVars {
        job_name: config.job.name.clone(),
        job_id: "<JOB_ID>".to_string(),
        task_id: TaskIndex::new(array.first()),
        user: std::env::var("USER").unwrap_or_default(),
        hostname: "<HOSTNAME>".to_string(),
    };

    let mut command = config.program.command.clone();
    command.push("<TASK_ID>".to_string());

    let view = PlanView {
        job: config.job.name.clone(),
        queue: config.job.queue.clone(),
        array: array.to_string(),
        tasks: array.len(),
        command,
        modules: config
            .runtime
            .modules
            .iter()
            .map(|m| m.to_string())
            .collect(),
        locale: format!("{}={}", config.runtime.locale.var, config.runtime.locale.value),
        stdout_first_task: config.job.stdout.expand(&preview),
        stderr_first_task: config.job.stderr.expand(&preview),
        directives: directives.render_lines(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("job:      {}", view.job);
    if let Some(queue) = &view.queue {
        println!("queue:    {queue}");
    }
    println!("array:    {} ({} tasks)", view.array, view.tasks);
    println!("command:  {}", shell::join(view.command.iter().map(String::as_str)));
    if view.modules.is_empty() {
        println!("modules:  (none)");
    } else {
        println!("modules:  {}", view.modules.join(", "));
    }
    println!("locale:   {}", view.locale);
    println!("stdout:   {}", view.stdout_first_task.display());
    println!("stderr:   {}", view.stderr_first_task.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_fit_a_byte() {
        assert_eq!(exit_byte(0), 0);
        assert_eq!(exit_byte(3), 3);
        assert_eq!(exit_byte(143), 143);
        assert_eq!(exit_byte(-1), 1);
        assert_eq!(exit_byte(300), 1);
    }

    #[test]
    fn launch_failure_names_the_task_and_kind() {
        let ctx = TaskContext {
            job_id: "81234".to_string(),
            job_name: None,
            task: TaskIndex::new(7).unwrap(),
            user: "alice".to_string(),
            hostname: None,
        };
        let err = launch_failure(
            &ctx,
            LaunchError::Activation {
                status: Some(1),
                stderr: "Unable to locate a modulefile for 'essentia/2.0.1'".to_string(),
            },
        );

        assert_eq!(err.to_string(), "job 81234 task 7 (environment_setup)");
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::Activation { .. })
        ));
    }

    #[test]
    fn script_execs_the_given_launcher() {
        let config = LauncherConfig::from_toml_str(
            r#"
            [job]
            name = "makam"

            [array]
            count = 4

            [program]
            command = ["python", "estimate.py"]
            "#,
        )
        .unwrap();

        let script = build_script(
            Path::new("/jobs/launcher.toml"),
            &config,
            Some(PathBuf::from("/opt/bin/launcher")),
        )
        .unwrap();

        assert!(script.contains("#$ -t 1-4:1\n"));
        assert!(script.ends_with("exec /opt/bin/launcher run --config /jobs/launcher.toml\n"));
    }
}
