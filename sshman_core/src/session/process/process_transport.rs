use std::ffi::OsString;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::session::{errors::SessionError, transport::Transport};
use crate::storage::Identity;

/// Runs the system ssh client with the caller's terminal attached.
///
/// Terminal resize, signals and key handling are all inherited from the
/// operating system, so this is the most complete way to connect.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    program: OsString,
    extra_args: Vec<OsString>,
}

impl Default for ProcessTransport {
    fn default() -> Self {
        Self::new("ssh")
    }
}

impl ProcessTransport {
    /// `program` is looked up on `PATH` unless it is a path itself.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments placed before the port flag and destination.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argument list handed to the client for `identity`.
    pub fn arguments(&self, identity: &Identity) -> Vec<OsString> {
        let mut args = self.extra_args.clone();
        if let Some(port) = identity.endpoint().port {
            args.push("-p".into());
            args.push(port.to_string().into());
        }
        // the destination never parses as an option
        args.push("--".into());
        args.push(identity.destination().into());
        args
    }
}

impl Transport for ProcessTransport {
    fn name(&self) -> &'static str {
        "system"
    }

    fn requires_secret(&self) -> bool {
        false
    }

    fn open_interactive(
        &self,
        identity: &Identity,
        _secret: Option<&str>,
    ) -> Result<(), SessionError> {
        let program = which::which(&self.program).map_err(|e| {
            SessionError::connection(
                &format!("Cannot find ssh client {:?}", self.program),
                e,
            )
        })?;
        let args = self.arguments(identity);
        info!("Launching {:?} {:?}", program, args);

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| SessionError::connection("Failed to start ssh client", e))?;

        debug!("ssh client exited with {}", status);
        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(SessionError::ExitStatus(code)),
            None => Err(SessionError::Connection(format!(
                "ssh client was terminated: {status}"
            ))),
        }
    }
}
