// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ssh2`-backed implementation of [`Transport`], double-hopping through
//! a bastion to reach the target compute node.

use crate::config::{NodeTarget, ReconnectPolicy, TimeoutPolicy};
use crate::error::TransportError;
use crate::transport::{ExecOutput, RemoteExit, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use ssh2::Session;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing::{debug, warn};

/// Handle to the bastion-hop relay thread (see [`spawn_tunnel`]). Owns
/// the bastion `Session` and its `channel_direct_tcpip` channel for its
/// whole lifetime; dropping it stops the relay and joins the thread.
struct TunnelHandle {
    stop: Arc<AtomicBool>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl Drop for TunnelHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

struct Sessions {
    /// `None` when `allow_direct_fallback` bypassed the bastion hop
    /// entirely. `Some` keeps the relay thread (and the bastion
    /// `Session` it owns) alive for as long as `node` is in use.
    tunnel: Option<TunnelHandle>,
    /// The node session is driven over an ordinary loopback `TcpStream`
    /// fed by the relay thread, not directly over a `channel_direct_tcpip`
    /// channel: ssh2's `Channel<'sess>` borrows the `Session` that
    /// created it, so a second `Session` built from that channel via
    /// `set_tcp_stream` would have to live inside the same struct as
    /// the bastion `Session` it borrows from — a self-referential
    /// struct safe Rust can't express. Relaying the channel's bytes
    /// through a local loopback socket (`spawn_tunnel`) gives `node`
    /// an ordinary owned, `'static` stream instead.
    node: Session,
}

struct Inner {
    sessions: Mutex<Option<Sessions>>,
    consecutive_failures: AtomicU32,
}

/// Resilient bastion-relayed transport (§4.2). Cheap to clone: state is
/// behind an `Arc`, so a worker can hand a handle to a supervision task
/// without losing the underlying connection.
#[derive(Clone)]
pub struct SshTransport {
    target: NodeTarget,
    reconnect: ReconnectPolicy,
    timeouts: TimeoutPolicy,
    inner: Arc<Inner>,
}

impl SshTransport {
    pub fn new(target: NodeTarget, reconnect: ReconnectPolicy, timeouts: TimeoutPolicy) -> Self {
        Self {
            target,
            reconnect,
            timeouts,
            inner: Arc::new(Inner { sessions: Mutex::new(None), consecutive_failures: AtomicU32::new(0) }),
        }
    }

    fn establish(&self) -> Result<Sessions, TransportError> {
        let addr = format!("{}:{}", self.target.bastion_host, self.target.bastion_port);
        let tcp = TcpStream::connect(&addr).map_err(|e| {
            TransportError::BastionUnreachable(format!("{addr}: {e}"))
        })?;
        tcp.set_read_timeout(Some(self.timeouts.handshake)).ok();

        let mut bastion = Session::new().map_err(TransportError::from)?;
        bastion.set_tcp_stream(tcp);
        bastion.set_timeout(self.timeouts.handshake.as_millis() as u32);
        bastion.handshake().map_err(|e| TransportError::BastionUnreachable(e.to_string()))?;
        self.authenticate(&bastion, &self.target.bastion_user, self.target.bastion_key_path.as_deref(), self.target.bastion_password.as_ref())?;

        let tunnel_result =
            spawn_tunnel(bastion, self.target.node_host.clone(), self.target.node_port);

        let (tunnel, mut node) = match tunnel_result {
            Ok((tunnel, local_stream)) => {
                let mut node = Session::new().map_err(TransportError::from)?;
                node.set_tcp_stream(local_stream);
                node.set_timeout(self.timeouts.handshake.as_millis() as u32);
                node.handshake().map_err(|e| TransportError::NodeUnreachable(e.to_string()))?;
                (Some(tunnel), node)
            }
            Err(e) if self.target.allow_direct_fallback => {
                warn!(error = %e, "bastion hop failed, falling back to direct connection");
                let addr = format!("{}:{}", self.target.node_host, self.target.node_port);
                let tcp = TcpStream::connect(&addr).map_err(|e| TransportError::NodeUnreachable(format!("{addr}: {e}")))?;
                let mut node = Session::new().map_err(TransportError::from)?;
                node.set_tcp_stream(tcp);
                node.set_timeout(self.timeouts.handshake.as_millis() as u32);
                node.handshake().map_err(|e| TransportError::NodeUnreachable(e.to_string()))?;
                (None, node)
            }
            Err(e) => return Err(e),
        };
        self.authenticate(&node, &self.target.node_user, self.target.node_key_path.as_deref(), self.target.node_password.as_ref())?;
        node.set_timeout(0);
        node.set_keepalive(true, self.timeouts.keepalive_interval.as_secs() as u32);

        Ok(Sessions { tunnel, node })
    }

    fn authenticate(
        &self,
        session: &Session,
        user: &str,
        key_path: Option<&str>,
        password: Option<&secrecy::SecretString>,
    ) -> Result<(), TransportError> {
        use secrecy::ExposeSecret;
        if let Some(path) = key_path {
            session
                .userauth_pubkey_file(user, None, std::path::Path::new(path), None)
                .map_err(|e| TransportError::AuthFailed(e.to_string()))?;
        } else if let Some(password) = password {
            session
                .userauth_password(user, password.expose_secret())
                .map_err(|e| TransportError::AuthFailed(e.to_string()))?;
        } else {
            return Err(TransportError::AuthFailed("no credential configured".to_string()));
        }
        if !session.authenticated() {
            return Err(TransportError::AuthFailed("server rejected credentials".to_string()));
        }
        Ok(())
    }

    /// Run `f` against a live node session, transparently reconnecting
    /// once on failure (§4.2: "only the second consecutive failure is
    /// reported"). `f` runs on the blocking threadpool since `ssh2` is
    /// synchronous end to end.
    async fn with_session<T, F>(&self, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: Fn(&Session) -> Result<T, TransportError> + Clone + Send + 'static,
    {
        let this = self.clone();
        let f1 = f.clone();
        let first = tokio::task::spawn_blocking(move || this.run_once(&f1))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        match first {
            Ok(v) => {
                self.inner.consecutive_failures.store(0, Ordering::SeqCst);
                Ok(v)
            }
            Err(e) => {
                debug!(error = %e, "transport op failed, reconnecting and retrying once");
                self.reconnect_blocking().await?;
                let this = self.clone();
                let second = tokio::task::spawn_blocking(move || this.run_once(&f))
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                match second {
                    Ok(v) => {
                        self.inner.consecutive_failures.store(0, Ordering::SeqCst);
                        Ok(v)
                    }
                    Err(e) => {
                        self.inner.consecutive_failures.fetch_add(1, Ordering::SeqCst);
                        Err(TransportError::ChannelDead(e.to_string()))
                    }
                }
            }
        }
    }

    fn run_once<T>(&self, f: &impl Fn(&Session) -> Result<T, TransportError>) -> Result<T, TransportError> {
        let guard = self.inner.sessions.lock();
        match guard.as_ref() {
            Some(sessions) => f(&sessions.node),
            None => Err(TransportError::ChannelDead("not connected".to_string())),
        }
    }

    async fn reconnect_blocking(&self) -> Result<(), TransportError> {
        let mut attempt = 0;
        loop {
            let this = self.clone();
            let result = tokio::task::spawn_blocking(move || this.establish())
                .await
                .map_err(|e| TransportError::Io(e.to_string()))?;
            match result {
                Ok(sessions) => {
                    *self.inner.sessions.lock() = Some(sessions);
                    return Ok(());
                }
                Err(e) if attempt + 1 >= self.reconnect.max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.reconnect.delay_for_attempt(attempt);
                    debug!(attempt, delay = ?delay, error = %e, "reconnect attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Opens `bastion`'s `channel_direct_tcpip` hop to `(host, port)` and
/// relays it through a loopback `TcpStream`, returning that stream as
/// an ordinary owned, `'static` handle the node `Session` can use with
/// `set_tcp_stream`. Both `bastion` and the channel it opens live only
/// inside the spawned relay thread's stack — they never have to coexist
/// in a struct the caller holds, which is what the borrow checker
/// forbids when a `Channel<'sess>` and its parent `Session` are stored
/// together. Blocks until the bastion hop either opens or fails, so the
/// caller's direct-fallback decision stays synchronous.
fn spawn_tunnel(
    bastion: Session,
    node_host: String,
    node_port: u16,
) -> Result<(TunnelHandle, TcpStream), TransportError> {
    let listener =
        TcpListener::bind(("127.0.0.1", 0)).map_err(|e| TransportError::Io(e.to_string()))?;
    let local_addr = listener.local_addr().map_err(|e| TransportError::Io(e.to_string()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_thread = stop.clone();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    let join = std::thread::spawn(move || {
        run_tunnel(bastion, listener, node_host, node_port, stop_thread, ready_tx);
    });

    match ready_rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(TransportError::NodeUnreachable(e)),
        Err(_) => {
            return Err(TransportError::NodeUnreachable(
                "bastion relay thread exited before the tunnel came up".to_string(),
            ))
        }
    }

    let local = TcpStream::connect(local_addr).map_err(|e| TransportError::Io(e.to_string()))?;
    Ok((TunnelHandle { stop, join: Some(join) }, local))
}

/// Body of the relay thread spawned by [`spawn_tunnel`]: open the
/// bastion-side channel, accept the loopback connection `spawn_tunnel`
/// is about to make, then copy bytes both directions until `stop` is
/// set or either side closes.
fn run_tunnel(
    bastion: Session,
    listener: TcpListener,
    node_host: String,
    node_port: u16,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), String>>,
) {
    let mut channel = match bastion.channel_direct_tcpip(&node_host, node_port, None) {
        Ok(channel) => channel,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let (mut local, _) = match listener.accept() {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "bastion relay never received its loopback connection");
            return;
        }
    };
    if let Err(e) = local.set_read_timeout(Some(Duration::from_millis(50))) {
        warn!(error = %e, "could not set bastion relay read timeout");
        return;
    }
    bastion.set_blocking(false);

    let mut buf = [0u8; 16 * 1024];
    while !stop.load(Ordering::SeqCst) {
        let mut progressed = false;

        match channel.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if local.write_all(&buf[..n]).is_err() {
                    break;
                }
                progressed = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => {
                debug!(error = %e, "bastion tunnel channel read failed");
                break;
            }
        }

        match local.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if channel.write_all(&buf[..n]).is_err() {
                    break;
                }
                progressed = true;
            }
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {}
            Err(e) => {
                debug!(error = %e, "bastion relay loopback read failed");
                break;
            }
        }

        if !progressed {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    let _ = channel.close();
    let _ = channel.wait_close();
}

#[async_trait]
impl Transport for SshTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.reconnect_blocking().await
    }

    async fn exec(&self, cmd: &str, timeout: Duration) -> Result<ExecOutput, TransportError> {
        let cmd = cmd.to_string();
        let effective_timeout = if timeout.is_zero() { self.timeouts.exec_default } else { timeout };
        let result = self
            .with_session(move |session| -> Result<ExecOutput, TransportError> {
                session.set_timeout(effective_timeout.as_millis() as u32);
                let mut channel = session.channel_session()?;
                channel.exec(&cmd)?;
                let mut stdout = String::new();
                channel.read_to_string(&mut stdout)?;
                let mut stderr = String::new();
                channel.stderr().read_to_string(&mut stderr)?;
                channel.wait_close()?;
                let code = channel.exit_status()?;
                let signal = channel.exit_signal().ok().and_then(|s| s.exit_signal);
                let exit = match signal {
                    Some(name) => RemoteExit::Signal(signal_number(&name)),
                    None => RemoteExit::Code(code),
                };
                session.set_timeout(0);
                Ok(ExecOutput { stdout, stderr, exit })
            })
            .await;
        result
    }

    async fn put_file(&self, local_bytes: &[u8], remote_path: &str) -> Result<(), TransportError> {
        let bytes = local_bytes.to_vec();
        let remote_path = remote_path.to_string();
        self.with_session(move |session| -> Result<(), TransportError> {
            let sftp = session.sftp()?;
            let mut file = sftp.create(std::path::Path::new(&remote_path))?;
            file.write_all(&bytes)?;
            Ok(())
        })
        .await
    }

    async fn read_file(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        let remote_path = remote_path.to_string();
        self.with_session(move |session| -> Result<Vec<u8>, TransportError> {
            let sftp = session.sftp()?;
            let mut file = sftp.open(std::path::Path::new(&remote_path))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
    }

    async fn is_alive_pid(&self, pid: u64) -> Result<bool, TransportError> {
        let out = self.exec(&format!("kill -0 {pid}"), Duration::from_secs(5)).await?;
        Ok(matches!(out.exit, RemoteExit::Code(0)))
    }

    async fn kill_pid(&self, pid: u64) -> Result<(), TransportError> {
        for signal in ["-TERM", "-KILL"] {
            let _ = self.exec(&format!("kill {signal} {pid}"), Duration::from_secs(5)).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            if !self.is_alive_pid(pid).await.unwrap_or(false) {
                return Ok(());
            }
        }
        if self.is_alive_pid(pid).await.unwrap_or(true) {
            Err(TransportError::Io(format!("pid {pid} survived SIGTERM and SIGKILL")))
        } else {
            Ok(())
        }
    }

    async fn is_channel_alive(&self) -> bool {
        self.inner.sessions.lock().is_some() && self.inner.consecutive_failures.load(Ordering::SeqCst) == 0
    }
}

/// `ssh2` returns signal names without the `SIG` prefix (`"TERM"`,
/// `"KILL"`, ...); map the common ones back to their POSIX numbers for
/// the wire `ExitStatus`.
pub(crate) fn signal_number(name: &str) -> i32 {
    match name {
        "HUP" => 1,
        "INT" => 2,
        "QUIT" => 3,
        "KILL" => 9,
        "SEGV" => 11,
        "TERM" => 15,
        _ => -1,
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
