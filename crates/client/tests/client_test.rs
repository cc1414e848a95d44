use progress_bootstrap::{ClientConfig, SchedulerBuilder};
use progress_client::Client;
use progress_client::cli::{Command, PlayArgs};
use tempfile::TempDir;

fn client(dir: &TempDir) -> Client {
    let config = ClientConfig {
        user_id: Some("learner-1".into()),
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let setup = SchedulerBuilder::new(config).build().unwrap();
    Client::builder().scheduler(setup.scheduler).build().unwrap()
}

async fn run(dir: &TempDir, command: Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    client(dir).run(command, &mut out).await?;
    let text = String::from_utf8(out).unwrap();
    Ok(console::strip_ansi_codes(&text).into_owned())
}

#[tokio::test]
async fn play_then_status_reflects_the_session() {
    let dir = TempDir::new().unwrap();

    let played = run(
        &dir,
        Command::Play(PlayArgs {
            xp: Some(146.0),
            correct: Some(9.0),
            wrong: Some(1.0),
            ..PlayArgs::default()
        }),
    )
    .await
    .unwrap();
    assert!(played.contains("+146 XP"));
    assert!(played.contains("Level 1 → 2"));
    assert!(played.contains("1 write(s) waiting"));

    let status = run(&dir, Command::Status).await.unwrap();
    assert!(status.contains("learner-1"));
    assert!(status.contains("Level 2"));
    assert!(status.contains("XP        146"));
    assert!(status.contains("offline, 1 pending"));
}

#[tokio::test]
async fn wipe_needs_confirmation() {
    let dir = TempDir::new().unwrap();
    run(&dir, Command::Play(PlayArgs { xp: Some(10.0), ..PlayArgs::default() }))
        .await
        .unwrap();

    assert!(run(&dir, Command::Wipe { yes: false }).await.is_err());
    assert!(dir.path().join("stats_learner-1.json").exists());

    run(&dir, Command::Wipe { yes: true }).await.unwrap();
    let status = run(&dir, Command::Status).await.unwrap();
    assert!(status.contains("XP        0"));
    assert!(status.contains("0 pending"));
}

#[tokio::test]
async fn sync_reports_offline_when_local_only() {
    let dir = TempDir::new().unwrap();
    let report = run(&dir, Command::Sync).await.unwrap();
    assert_eq!(report.trim(), "offline pushed 0, 0 pending");
}
