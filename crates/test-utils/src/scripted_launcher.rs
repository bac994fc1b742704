use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cmdrun::exec::Launcher;
use tokio::process::Command as ProcessCommand;

/// A launcher that never runs the requested program.
///
/// Every program name is routed to `sh -c <script>` with `$0` set to the
/// program name and `$@` to its arguments. Scripts for a few stand-in
/// programs are installed by [`ScriptedLauncher::new`]:
///
/// - `echo`: prints its arguments joined by spaces, and
///   `Stderr: command echo` on stderr.
/// - `/bin/bash`: prints `Stdout: command /bin/bash - Stdin: <stdin>` and
///   `Stderr: command /bin/bash` on stderr.
/// - `env`: prints the environment it received.
///
/// Unknown programs print `Unknown command "<name>"` on stderr and exit 2.
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    scripts: HashMap<String, String>,
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

const UNKNOWN: &str = r#"printf 'Unknown command "%s"\n' "$0" >&2; exit 2"#;

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::empty()
            .with_program(
                "echo",
                r#"printf '%s\n' "$*"; printf 'Stderr: command %s\n' "$0" >&2"#,
            )
            .with_program(
                "/bin/bash",
                r#"input=$(cat); printf 'Stdout: command %s - Stdin: %s\n' "$0" "$input"; printf 'Stderr: command %s\n' "$0" >&2"#,
            )
            .with_program("env", "env")
    }

    pub fn empty() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Route `program` to `script` (run by `sh -c`).
    pub fn with_program(mut self, program: &str, script: &str) -> Self {
        self.scripts.insert(program.to_string(), script.to_string());
        self
    }

    /// Every `(program, args)` this launcher was asked for, in order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for ScriptedLauncher {
    fn command(&self, program: &str, args: &[String]) -> ProcessCommand {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        let script = self
            .scripts
            .get(program)
            .map(String::as_str)
            .unwrap_or(UNKNOWN);

        let mut cmd = ProcessCommand::new("sh");
        cmd.arg("-c").arg(script).arg(program).args(args);
        cmd
    }
}
