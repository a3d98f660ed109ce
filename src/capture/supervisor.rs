use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::liveness::{self, PidRecord};
use super::{proctab, Channel, SEGMENT_EXT};
use crate::store::{ConfigPatch, ConfigStore};

/// Resolved launch parameters for one channel.
#[derive(Debug, Clone)]
struct ChannelParams {
    stream_url: String,
    save_path: PathBuf,
    segment_time: u32,
}

/// Per-channel session slot. The intended flag is advisory only; external
/// reporting always goes through `channel_recording`, which re-derives the
/// truth and writes it back here.
struct ChannelSlot {
    intended: Arc<AtomicBool>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl ChannelSlot {
    fn new() -> Self {
        Self {
            intended: Arc::new(AtomicBool::new(false)),
            monitor: Mutex::new(None),
            stop_tx: Mutex::new(None),
        }
    }
}

/// Owns zero, one, or two concurrent capture sessions and the external
/// segmenter processes behind them.
pub struct CaptureSupervisor {
    store: Arc<ConfigStore>,
    program: String,
    pid_dir: PathBuf,
    slots: [ChannelSlot; 2],
}

impl CaptureSupervisor {
    pub fn new(
        store: Arc<ConfigStore>,
        program: impl Into<String>,
        pid_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            program: program.into(),
            pid_dir: pid_dir.into(),
            slots: [ChannelSlot::new(), ChannelSlot::new()],
        }
    }

    pub fn pid_dir(&self) -> &Path {
        &self.pid_dir
    }

    fn slot(&self, channel: Channel) -> &ChannelSlot {
        &self.slots[channel.index()]
    }

    /// Single source of truth for external reporting: recording state is
    /// re-derived from the pid record and process table on every call, and
    /// the result republished into the in-memory flag. Self-healing after a
    /// daemon restart, where the flags are lost but a record may remain.
    pub fn channel_recording(&self, channel: Channel) -> bool {
        let live = liveness::channel_alive(&self.pid_dir, channel);
        self.slot(channel).intended.store(live, Ordering::SeqCst);
        live
    }

    /// Start capture on every enabled channel. Overrides are merged through
    /// the config store first, so the catalog, media server, and reconciler
    /// all observe the same paths this session records into.
    pub async fn start(&self, overrides: &ConfigPatch) -> Result<()> {
        let config = if overrides.is_empty() {
            self.store.snapshot().await
        } else {
            self.store.update(overrides).await?
        };

        for channel in Channel::ALL {
            if channel == Channel::Two && !config.dual_stream_enabled {
                // a disabled second channel must never report recording
                self.slot(Channel::Two).intended.store(false, Ordering::SeqCst);
                info!("dual stream disabled, channel 2 not started");
                continue;
            }

            let params = ChannelParams {
                stream_url: config.stream_url(channel).to_string(),
                save_path: config.save_path(channel).to_path_buf(),
                segment_time: config.segment_time,
            };
            self.start_channel(channel, params).await?;
        }

        Ok(())
    }

    async fn start_channel(&self, channel: Channel, params: ChannelParams) -> Result<()> {
        if self.channel_recording(channel) {
            warn!(
                "channel {} is already recording, ignoring start",
                channel.number()
            );
            return Ok(());
        }

        fs::create_dir_all(&params.save_path).with_context(|| {
            format!(
                "failed to create save directory {}",
                params.save_path.display()
            )
        })?;

        let record = PidRecord::for_channel(&self.pid_dir, channel);
        let command = segmenter_command(&self.program, &params);

        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let intended = Arc::clone(&self.slot(channel).intended);

        let monitor = tokio::spawn(run_capture(
            channel, command, record, intended, ready_tx, stop_rx,
        ));

        // The monitor reports the spawn outcome before blocking on the
        // child, so a launch failure is a synchronous error here rather
        // than a silent log line.
        match ready_rx.await {
            Ok(Ok(pid)) => {
                info!(
                    "channel {} capture started: {} (pid {})",
                    channel.number(),
                    params.stream_url,
                    pid
                );
            }
            Ok(Err(e)) => {
                let _ = monitor.await;
                return Err(anyhow::Error::new(e)).with_context(|| {
                    format!("failed to launch segmenter for channel {}", channel.number())
                });
            }
            Err(_) => bail!(
                "capture monitor for channel {} exited before reporting",
                channel.number()
            ),
        }

        self.slot(channel).intended.store(true, Ordering::SeqCst);
        *self.slot(channel).stop_tx.lock().await = Some(stop_tx);
        *self.slot(channel).monitor.lock().await = Some(monitor);

        Ok(())
    }

    /// Stop every capture session: owned monitor tasks first, then any pid
    /// still named by a record (orphans from a previous daemon run). Both
    /// records are deleted and both flags cleared. Unrelated processes are
    /// never touched.
    pub async fn stop(&self) -> Result<()> {
        for channel in Channel::ALL {
            let slot = self.slot(channel);

            if let Some(stop_tx) = slot.stop_tx.lock().await.take() {
                // the monitor may already be gone if the child exited
                let _ = stop_tx.send(());
            }
            if let Some(monitor) = slot.monitor.lock().await.take() {
                if let Err(e) = monitor.await {
                    error!(
                        "capture monitor for channel {} panicked: {}",
                        channel.number(),
                        e
                    );
                }
            }

            let record = PidRecord::for_channel(&self.pid_dir, channel);
            if let Some(pid) = record.read() {
                if proctab::pid_alive(pid) && proctab::kill_pid(pid) {
                    info!(
                        "terminated orphaned capture process {} for channel {}",
                        pid,
                        channel.number()
                    );
                }
            }
            record.clear();
            slot.intended.store(false, Ordering::SeqCst);
        }

        info!("all capture sessions stopped");
        Ok(())
    }
}

/// Monitor task for one capture session: spawns the segmenter, records its
/// pid, reports the spawn outcome, then blocks until the child exits or a
/// stop signal arrives. The intended flag is cleared on the way out either
/// way.
async fn run_capture(
    channel: Channel,
    mut command: Command,
    record: PidRecord,
    intended: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<std::io::Result<u32>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            intended.store(false, Ordering::SeqCst);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let pid = child.id().unwrap_or(0);
    if pid != 0 {
        if let Err(e) = record.write(pid) {
            warn!(
                "failed to write pid record {}: {}",
                record.path().display(),
                e
            );
        }
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(log_segmenter_stderr(channel, stderr));
    }

    let _ = ready_tx.send(Ok(pid));

    tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => info!(
                    "channel {} segmenter exited: {}",
                    channel.number(),
                    status
                ),
                Err(e) => error!(
                    "channel {} segmenter wait failed: {}",
                    channel.number(),
                    e
                ),
            }
        }
        _ = &mut stop_rx => {
            if pid == 0 || !proctab::kill_pid(pid) {
                let _ = child.start_kill();
            }
            if let Err(e) = child.wait().await {
                error!(
                    "channel {} segmenter did not exit cleanly: {}",
                    channel.number(),
                    e
                );
            }
        }
    }

    intended.store(false, Ordering::SeqCst);
}

async fn log_segmenter_stderr(channel: Channel, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("segmenter[{}]: {}", channel.number(), line);
    }
}

/// Fixed-duration segmentation with timestamp-based filenames, stream copied
/// as-is. Stderr is piped so the monitor can drain it into the logs.
fn segmenter_command(program: &str, params: &ChannelParams) -> Command {
    let output_pattern = params
        .save_path
        .join(format!("%Y-%m-%d_%H-%M-%S.{SEGMENT_EXT}"));

    let mut command = Command::new(program);
    command
        .arg("-rtsp_transport")
        .arg("tcp")
        .arg("-i")
        .arg(&params.stream_url)
        .arg("-c:v")
        .arg("copy")
        .arg("-c:a")
        .arg("aac")
        .arg("-strict")
        .arg("experimental")
        .arg("-f")
        .arg("segment")
        .arg("-segment_time")
        .arg(params.segment_time.to_string())
        .arg("-reset_timestamps")
        .arg("1")
        .arg("-strftime")
        .arg("1")
        .arg("-segment_format")
        .arg(SEGMENT_EXT)
        .arg(output_pattern)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    command
}
