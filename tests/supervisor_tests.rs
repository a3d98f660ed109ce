// Integration tests for the capture supervisor lifecycle. The segmenter
// program is swapped for stand-ins from coreutils so no real capture tool is
// needed: spawn success/failure and the stop cleanup contract are what is
// under test, not ffmpeg itself.

use anyhow::Result;
use camrec::capture::PidRecord;
use camrec::{CaptureSupervisor, Channel, ConfigPatch, ConfigStore};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    supervisor: CaptureSupervisor,
    _work: TempDir,
    pid_dir: std::path::PathBuf,
    videos1: std::path::PathBuf,
    videos2: std::path::PathBuf,
}

async fn fixture(program: &str) -> Result<Fixture> {
    let work = TempDir::new()?;
    let pid_dir = work.path().join("pids");
    std::fs::create_dir_all(&pid_dir)?;

    let videos1 = work.path().join("videos1");
    let videos2 = work.path().join("videos2");

    let store = Arc::new(ConfigStore::load(work.path().join("config.json")));
    store
        .update(&ConfigPatch {
            save_path1: Some(videos1.clone()),
            save_path2: Some(videos2.clone()),
            segment_time: Some(10),
            ..ConfigPatch::default()
        })
        .await?;

    let supervisor = CaptureSupervisor::new(store, program, &pid_dir);
    Ok(Fixture {
        supervisor,
        _work: work,
        pid_dir,
        videos1,
        videos2,
    })
}

#[tokio::test]
async fn start_then_stop_leaves_no_records_and_no_recording() -> Result<()> {
    let fx = fixture("true").await?;

    fx.supervisor.start(&ConfigPatch::default()).await?;

    // start created both save directories and recorded both pids
    assert!(fx.videos1.is_dir());
    assert!(fx.videos2.is_dir());
    assert!(PidRecord::for_channel(&fx.pid_dir, Channel::One)
        .read()
        .is_some());
    assert!(PidRecord::for_channel(&fx.pid_dir, Channel::Two)
        .read()
        .is_some());

    fx.supervisor.stop().await?;

    for channel in Channel::ALL {
        let record = PidRecord::for_channel(&fx.pid_dir, channel);
        assert!(
            !record.path().exists(),
            "record for channel {} must be gone after stop",
            channel.number()
        );
        assert!(!fx.supervisor.channel_recording(channel));
    }

    Ok(())
}

#[tokio::test]
async fn disabled_second_channel_is_never_started() -> Result<()> {
    let fx = fixture("true").await?;

    // channel 2 parameters are supplied, but dual stream stays off
    fx.supervisor
        .start(&ConfigPatch {
            dual_stream_enabled: Some(false),
            rtsp_url2: Some("rtsp://10.0.0.9:554/media/video2".to_string()),
            ..ConfigPatch::default()
        })
        .await?;

    let record2 = PidRecord::for_channel(&fx.pid_dir, Channel::Two);
    assert!(!record2.path().exists());
    assert!(!fx.supervisor.channel_recording(Channel::Two));
    assert!(!fx.videos2.exists(), "no directory for a disabled channel");

    fx.supervisor.stop().await?;
    Ok(())
}

#[tokio::test]
async fn launch_failure_is_a_synchronous_error() -> Result<()> {
    let fx = fixture("/nonexistent/segmenter-binary").await?;

    let result = fx.supervisor.start(&ConfigPatch::default()).await;
    assert!(result.is_err());
    assert!(!fx.supervisor.channel_recording(Channel::One));

    Ok(())
}

#[tokio::test]
async fn stop_kills_an_orphan_named_by_a_stale_record() -> Result<()> {
    let fx = fixture("true").await?;

    // simulate a record left behind by a previous daemon run whose process
    // is already gone: stop must clean it up without error
    let record = PidRecord::for_channel(&fx.pid_dir, Channel::One);
    record.write(4_900_000)?;

    fx.supervisor.stop().await?;
    assert!(!record.path().exists());
    assert!(!fx.supervisor.channel_recording(Channel::One));

    Ok(())
}

#[tokio::test]
async fn stop_without_start_is_a_no_op() -> Result<()> {
    let fx = fixture("true").await?;
    fx.supervisor.stop().await?;
    assert!(!fx.supervisor.channel_recording(Channel::One));
    assert!(!fx.supervisor.channel_recording(Channel::Two));
    Ok(())
}
