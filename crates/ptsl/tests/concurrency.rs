mod support;

use std::sync::Arc;
use std::time::Duration;

use ptsl::{CommandId, ConnectionState, Error, Value};
use serde_json::json;
use support::{FakeHost, HostScript, connected};

#[tokio::test]
async fn concurrent_callers_each_get_their_own_response() {
    let host = FakeHost::new(HostScript {
        jitter: Some(Duration::from_millis(30)),
        ..HostScript::default()
    });
    let client = Arc::new(connected(&host).await);
    client
        .run_command(
            CommandId::CreateSession,
            json!({"session_name": "Demux", "session_location": "/tmp"}),
        )
        .await
        .unwrap();

    let callers: Vec<_> = (1..=24i64)
        .map(|n| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let payload = client
                    .run_command(
                        CommandId::CreateNewTracks,
                        json!({"number_of_tracks": n, "track_name": format!("caller{n}")}),
                    )
                    .await
                    .unwrap();
                (n, payload)
            })
        })
        .collect();

    for caller in callers {
        let (n, payload) = caller.await.unwrap();
        assert_eq!(payload.get("number_of_tracks").and_then(Value::as_i64), Some(n));
        let names = payload
            .get("created_track_names")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(names.len() as i64, n);
        assert_eq!(
            names[0].as_str(),
            Some(format!("caller{n} 1").as_str())
        );
    }
}

#[tokio::test]
async fn slow_response_times_out_and_late_reply_is_discarded() {
    let host = FakeHost::new(
        HostScript::default().delay(CommandId::GetPTSLVersion, Duration::from_millis(150)),
    );
    let client = connected(&host).await;

    let err = client
        .run_command_with_timeout(
            CommandId::GetPTSLVersion,
            Value::empty(),
            Duration::from_millis(30),
        )
        .await
        .unwrap_err();
    match err {
        Error::RequestTimeout {
            command, timeout, ..
        } => {
            assert_eq!(command, CommandId::GetPTSLVersion);
            assert_eq!(timeout, Duration::from_millis(30));
        }
        other => panic!("expected timeout, got {other}"),
    }

    // Let the late reply arrive, then make sure the next caller gets its own.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let payload = client
        .run_command(CommandId::HostReadyCheck, Value::empty())
        .await
        .unwrap();
    assert_eq!(payload.get("is_host_ready").and_then(Value::as_bool), Some(true));
    assert_eq!(client.state(), ConnectionState::Registered);
}

#[tokio::test]
async fn out_of_order_replies_reach_the_right_callers() {
    let host = FakeHost::new(
        HostScript::default().delay(CommandId::GetPTSLVersion, Duration::from_millis(80)),
    );
    let client = Arc::new(connected(&host).await);

    let slow = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .run_command(CommandId::GetPTSLVersion, Value::empty())
                .await
        })
    };
    host.wait_for(CommandId::GetPTSLVersion).await;

    let fast = client
        .run_command(CommandId::HostReadyCheck, Value::empty())
        .await
        .unwrap();
    assert!(!slow.is_finished(), "slow reply should still be in flight");
    assert_eq!(fast.get("is_host_ready").and_then(Value::as_bool), Some(true));

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.get("version").and_then(Value::as_i64), Some(3));
}
