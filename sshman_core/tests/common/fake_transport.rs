//! A deterministic **in‑process stand‑in** for any type that implements
//! `sshman_core::Transport`.
//!
//! It records every identity and secret it is asked to connect with and
//! returns a scripted outcome, so tests can exercise `open_session` without
//! a network or an ssh binary.

use std::cell::RefCell;

use sshman_core::{Identity, SessionError, Transport};

pub struct FakeTransport {
    needs_secret: bool,
    fail_with_status: Option<i32>,
    /// Every `(identity, secret)` pair the transport was opened with.
    pub opened: RefCell<Vec<(Identity, Option<String>)>>,
}

impl FakeTransport {
    pub fn new(needs_secret: bool) -> Self {
        Self {
            needs_secret,
            fail_with_status: None,
            opened: RefCell::new(Vec::new()),
        }
    }

    /// Make every session end as if the remote exited with `status`.
    pub fn failing(mut self, status: i32) -> Self {
        self.fail_with_status = Some(status);
        self
    }
}

impl Transport for FakeTransport {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn requires_secret(&self) -> bool {
        self.needs_secret
    }

    fn open_interactive(
        &self,
        identity: &Identity,
        secret: Option<&str>,
    ) -> Result<(), SessionError> {
        self.opened
            .borrow_mut()
            .push((identity.clone(), secret.map(str::to_string)));
        match self.fail_with_status {
            Some(status) => Err(SessionError::ExitStatus(status)),
            None => Ok(()),
        }
    }
}
