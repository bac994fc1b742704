use std::path::Path;
use std::time::Duration;

use clap::Parser;
use cmdrun::build_command;
use cmdrun::cli::{CliArgs, RunCommand};
use cmdrun::errors::CmdrunError;
use cmdrun_test_utils::builders::ConfigFileBuilder;

#[test]
fn exec_keeps_hyphenated_arguments() {
    let args = CliArgs::parse_from(["cmdrun", "exec", "ls", "-la", "--color=never"]);

    match args.command {
        RunCommand::Exec { program, args } => {
            assert_eq!(program, "ls");
            assert_eq!(args, ["-la", "--color=never"]);
        }
        other => panic!("expected exec, got: {other:?}"),
    }
}

#[test]
fn shell_takes_optional_shell_and_script_file() {
    let args = CliArgs::parse_from(["cmdrun", "shell", "--script-file", "run.sh", "/bin/bash"]);

    match args.command {
        RunCommand::Shell { shell, script_file } => {
            assert_eq!(shell.as_deref(), Some("/bin/bash"));
            assert_eq!(script_file.as_deref(), Some(Path::new("run.sh")));
        }
        other => panic!("expected shell, got: {other:?}"),
    }
}

#[test]
fn cli_overrides_are_layered_on_config() {
    let cfg = ConfigFileBuilder::new()
        .dir("/from/config")
        .env("A=config")
        .timeout("1h")
        .build();
    let args = CliArgs::parse_from([
        "cmdrun", "--dir", "/from/cli", "--env", "A=cli", "--env", "B=2", "--timeout", "5s",
        "exec", "true",
    ]);

    let cmd = build_command(&cfg, &args).expect("valid overrides");

    assert_eq!(cmd.dir(), Some(Path::new("/from/cli")));
    // Appended, so the command-line value is the last occurrence of `A`.
    assert_eq!(cmd.env(), ["A=config", "A=cli", "B=2"]);
    assert_eq!(cmd.timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn config_values_are_kept_without_overrides() {
    let cfg = ConfigFileBuilder::new().env("A=1").timeout("30s").build();
    let args = CliArgs::parse_from(["cmdrun", "exec", "true"]);

    let cmd = build_command(&cfg, &args).expect("valid config");

    assert!(cmd.dir().is_none());
    assert_eq!(cmd.env(), ["A=1"]);
    assert_eq!(cmd.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn invalid_overrides_are_rejected() {
    let cfg = ConfigFileBuilder::new().build();

    let args = CliArgs::parse_from(["cmdrun", "--env", "BROKEN", "exec", "true"]);
    assert!(matches!(
        build_command(&cfg, &args),
        Err(CmdrunError::ConfigError(_))
    ));

    let args = CliArgs::parse_from(["cmdrun", "--timeout", "forever", "exec", "true"]);
    assert!(matches!(
        build_command(&cfg, &args),
        Err(CmdrunError::ConfigError(_))
    ));
}

#[test]
fn log_level_is_a_global_flag() {
    let args = CliArgs::parse_from(["cmdrun", "--log-level", "debug", "exec", "true"]);
    assert_eq!(args.log_level.map(|l| l.as_directive()), Some("debug"));
}

#[cfg(unix)]
#[test]
fn failed_command_maps_to_its_exit_code() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use cmdrun::exec::ExecError;
    use cmdrun::types::ErrorCategory;

    let err = CmdrunError::from(ExecError::NonZeroExit {
        program: "make".to_string(),
        args: vec!["all".to_string()],
        status: ExitStatus::from_raw(3 << 8),
        category: ErrorCategory::Build,
    });

    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.to_string(), "running command 'make all' failed: exit status: 3");
    assert_eq!(CmdrunError::ConfigError("x".into()).exit_code(), 1);
}
