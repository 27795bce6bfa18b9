use std::io::{self, Write};
use std::net::TcpStream;
use std::sync::mpsc::TryRecvError;
use std::thread;

use log::{debug, info, warn};
use ssh2::{Channel, PtyModeOpcode, PtyModes, Session};

use crate::session::errors::SessionError;
use crate::session::host_keys::{verify_host_key, HostKeyPolicy};
use crate::session::terminal::{
    copy_available, spawn_input_reader, write_all_retrying, InterruptForwarder, ResizeWatcher,
    ETX, POLL_INTERVAL,
};
use crate::session::transport::Transport;
use crate::storage::Identity;

/// Size of the PTY requested before the first resize is forwarded.
pub const PTY_COLUMNS: u32 = 80;
pub const PTY_ROWS: u32 = 40;

/// Line speed announced for both directions of the remote PTY.
const PTY_BAUD: u32 = 14_400;

/// An in-process SSH client built on the ssh2 library, authenticating with a
/// password.
///
/// Known gaps: no command execution besides the login shell, and the local
/// terminal stays in cooked mode so some key chords (arrows, clear-screen)
/// are line-buffered before they reach the remote side.
#[derive(Debug, Clone)]
pub struct NativeTransport {
    host_keys: HostKeyPolicy,
    term: String,
}

impl Default for NativeTransport {
    fn default() -> Self {
        Self::new(HostKeyPolicy::default())
    }
}

impl NativeTransport {
    pub fn new(host_keys: HostKeyPolicy) -> Self {
        Self {
            host_keys,
            term: "xterm".into(),
        }
    }

    /// TCP connect, handshake, host key check and password authentication.
    fn establish(
        &self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        info!("Connecting to SSH server at {}:{}", host, port);
        let tcp = TcpStream::connect((host, port))
            .map_err(|e| SessionError::connection("TCP connect error", e))?;

        let mut session =
            Session::new().map_err(|e| SessionError::connection("Failed to create SSH session", e))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| SessionError::connection("Handshake error", e))?;

        verify_host_key(&session, host, port, &self.host_keys)?;

        session
            .userauth_password(username, password)
            .map_err(|e| SessionError::connection("Authentication error", e))?;
        if !session.authenticated() {
            return Err(SessionError::Connection("SSH authentication failed".into()));
        }
        Ok(session)
    }
}

/// Remote echo off, fixed line speeds.
fn terminal_modes() -> PtyModes {
    let mut modes = PtyModes::new();
    modes.set_boolean(PtyModeOpcode::ECHO, false);
    modes.set_u32(PtyModeOpcode::TTY_OP_ISPEED, PTY_BAUD);
    modes.set_u32(PtyModeOpcode::TTY_OP_OSPEED, PTY_BAUD);
    modes
}

impl Transport for NativeTransport {
    fn name(&self) -> &'static str {
        "native"
    }

    fn requires_secret(&self) -> bool {
        true
    }

    fn open_interactive(
        &self,
        identity: &Identity,
        secret: Option<&str>,
    ) -> Result<(), SessionError> {
        let password = secret.ok_or(SessionError::MissingSecret(self.name()))?;
        let endpoint = identity.endpoint();
        let session = self.establish(
            &endpoint.host,
            endpoint.port_or_default(),
            &identity.username,
            password,
        )?;

        // Set up the channel while still in blocking mode.
        let mut channel = session
            .channel_session()
            .map_err(|e| SessionError::connection("Channel session error", e))?;
        channel
            .request_pty(
                &self.term,
                Some(terminal_modes()),
                Some((PTY_COLUMNS, PTY_ROWS, 0, 0)),
            )
            .map_err(|e| SessionError::connection("Request pty error", e))?;
        channel
            .shell()
            .map_err(|e| SessionError::connection("Shell error", e))?;
        info!("SSH connection established and shell channel opened.");

        let pumped = pump(&session, &mut channel);
        session.set_blocking(true);
        pumped?;

        channel
            .wait_close()
            .map_err(|e| SessionError::connection("Wait close error", e))?;
        match channel.exit_status() {
            Ok(code) => debug!("Remote shell exited with status {}", code),
            Err(e) => debug!("Remote exit status unavailable: {}", e),
        }
        Ok(())
    }
}

/// Proxies the local terminal to `channel` until the remote side hangs up.
fn pump(session: &Session, channel: &mut Channel) -> Result<(), SessionError> {
    let input = spawn_input_reader(io::stdin());
    let interrupts = InterruptForwarder::register()?;
    let mut resize = ResizeWatcher::new(PTY_COLUMNS, PTY_ROWS);

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut buf = [0u8; 4096];
    let mut input_open = true;

    session.set_blocking(false);
    loop {
        let mut idle = true;

        // outgoing
        while input_open {
            match input.try_recv() {
                Ok(chunk) => {
                    idle = false;
                    write_all_retrying(channel, &chunk)?;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Local input closed, sending EOF");
                    input_open = false;
                    if let Err(e) = channel.send_eof() {
                        debug!("send_eof failed (ignored): {}", e);
                    }
                }
            }
        }
        if interrupts.take() {
            debug!("Forwarding interrupt");
            write_all_retrying(channel, &[ETX])?;
        }

        // incoming
        if copy_available(channel, &mut stdout, &mut buf)? > 0 {
            idle = false;
        }
        if copy_available(&mut channel.stderr(), &mut stderr, &mut buf)? > 0 {
            idle = false;
        }
        if channel.eof() {
            // pick up anything that arrived with the close
            copy_available(channel, &mut stdout, &mut buf)?;
            copy_available(&mut channel.stderr(), &mut stderr, &mut buf)?;
            stdout.flush()?;
            break;
        }

        if let Some((columns, rows)) = resize.poll() {
            session.set_blocking(true);
            let resized = channel.request_pty_size(columns, rows, None, None);
            session.set_blocking(false);
            match resized {
                Ok(()) => debug!("Forwarded terminal size {}x{}", columns, rows),
                Err(e) => warn!("Failed to forward terminal size: {}", e),
            }
        }

        if idle {
            thread::sleep(POLL_INTERVAL);
        }
    }
    info!("Remote side closed the channel.");
    Ok(())
}
