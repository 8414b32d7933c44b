//! WebSocket end-to-end tests: handshake, subscription and fan-out delivery.

mod fixtures;
use fixtures::{TestServer, connect_client, next_text, send_json, token};

use tokio_tungstenite::{connect_async, tungstenite};

#[tokio::test]
async fn test_handshake_without_token_is_refused() {
    // テスト項目: token なしのハンドシェイクは 401 で拒否される
    // given (前提条件):
    let server = TestServer::start(19090).await;

    // when (操作):
    let result = connect_async(server.ws_url(None)).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP 401, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_with_invalid_token_is_refused() {
    // テスト項目: 不正な token のハンドシェイクは 401 で拒否される
    // given (前提条件):
    let server = TestServer::start(19091).await;

    // when (操作):
    let result = connect_async(server.ws_url(Some("not-a-jwt"))).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP 401, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connected_ack_reflects_identity_and_role_channel() {
    // テスト項目: connected ack が検証済み identity と自動 join した
    //             ロールチャンネルを返す
    // given (前提条件):
    let server = TestServer::start(19092).await;

    // when (操作):
    let (_ws, ack) = connect_client(&server, &token(5, "student", None)).await;

    // then (期待する結果):
    assert_eq!(ack["user_id"], 5);
    assert_eq!(ack["role"], "student");
    assert_eq!(ack["channels"], serde_json::json!(["role:student"]));
    assert!(ack["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_private_channel_delivery() {
    // テスト項目: 個人チャンネルに subscribe した学生に、その学生宛の
    //             entry:statusChanged が届く
    // given (前提条件):
    let server = TestServer::start(19093).await;
    let (mut ws, _) = connect_client(&server, &token(5, "student", None)).await;

    send_json(&mut ws, serde_json::json!({"type": "subscribe:student", "student_id": 5})).await;
    let ack: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
    assert_eq!(ack["type"], "subscribed");
    assert_eq!(ack["channel"], "user:5");

    // when (操作): REST 層がコミット後にイベントを発行
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/emit", server.base_url()))
        .json(&serde_json::json!({
            "type": "entry:statusChanged",
            "context": { "actor": 3, "owner": 5 },
            "payload": { "entry_id": 42, "status": "approved" }
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // then (期待する結果):
    let event: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
    assert_eq!(event["type"], "entry:statusChanged");
    assert_eq!(event["payload"]["entry_id"], 42);
}

#[tokio::test]
async fn test_event_reaches_both_tabs_of_one_mentor() {
    // テスト項目: 同一メンターの 2 タブ（2 接続）両方に role:mentor 宛の
    //             doubt:created が届く
    // given (前提条件):
    let server = TestServer::start(19094).await;
    let mentor_token = token(3, "mentor", None);
    let (mut tab1, _) = connect_client(&server, &mentor_token).await;
    let (mut tab2, _) = connect_client(&server, &mentor_token).await;

    // when (操作):
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/emit", server.base_url()))
        .json(&serde_json::json!({
            "type": "doubt:created",
            "context": { "actor": 5 },
            "payload": { "doubt_id": 12 }
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["delivered"], 2);

    // then (期待する結果): 両タブに独立に届く
    let event1: serde_json::Value = serde_json::from_str(&next_text(&mut tab1).await).unwrap();
    let event2: serde_json::Value = serde_json::from_str(&next_text(&mut tab2).await).unwrap();
    assert_eq!(event1["type"], "doubt:created");
    assert_eq!(event2["type"], "doubt:created");
}

#[tokio::test]
async fn test_unauthorized_subscribe_is_silently_ignored() {
    // テスト項目: 学生 5 が他人の個人チャンネル（mentor 7）に subscribe
    //             してもメンバーにならず、エラーフレームも返らない
    // given (前提条件):
    let server = TestServer::start(19095).await;
    let (mut ws, _) = connect_client(&server, &token(5, "student", None)).await;

    // when (操作): 不正 subscribe のあとに正当な subscribe を送る
    send_json(&mut ws, serde_json::json!({"type": "subscribe:mentor", "mentor_id": 7})).await;
    send_json(&mut ws, serde_json::json!({"type": "subscribe:student", "student_id": 5})).await;

    // then (期待する結果): 次に届くフレームは正当な方の ack だけ
    //（コントロールメッセージは順番に処理される）
    let ack: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
    assert_eq!(ack["type"], "subscribed");
    assert_eq!(ack["channel"], "user:5");

    // registry にも user:7 のメンバーシップは存在しない
    let client = reqwest::Client::new();
    let snapshot: serde_json::Value = client
        .get(format!("{}/api/registry", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    let channel_names: Vec<&str> = snapshot["channels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(channel_names.contains(&"user:5"));
    assert!(!channel_names.contains(&"user:7"));
}

#[tokio::test]
async fn test_cohort_subscribe_and_delivery() {
    // テスト項目: cohort チャンネルへの subscribe と cohort 宛イベントの配信
    // given (前提条件):
    let server = TestServer::start(19096).await;
    let (mut ws, _) = connect_client(&server, &token(5, "student", Some(2))).await;

    send_json(&mut ws, serde_json::json!({"type": "subscribe:cohort", "cohort_id": 2})).await;
    let ack: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
    assert_eq!(ack["channel"], "cohort:2");

    // when (操作): cohort 2 に向けたスケジュール変更
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/emit", server.base_url()))
        .json(&serde_json::json!({
            "type": "schedule:updated",
            "context": { "actor": 3, "cohort": 2 },
            "payload": { "schedule_id": 8 }
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // then (期待する結果):
    let event: serde_json::Value = serde_json::from_str(&next_text(&mut ws).await).unwrap();
    assert_eq!(event["type"], "schedule:updated");
    assert_eq!(event["payload"]["schedule_id"], 8);
}

#[tokio::test]
async fn test_disconnect_removes_connection_from_registry() {
    // テスト項目: クライアント切断後、registry から接続が取り除かれる
    // given (前提条件):
    let server = TestServer::start(19097).await;
    let (ws, _) = connect_client(&server, &token(5, "student", None)).await;

    // when (操作):
    drop(ws);

    // then (期待する結果): 切断処理は非同期なのでリトライしながら確認
    let client = reqwest::Client::new();
    for _ in 0..50 {
        let snapshot: serde_json::Value = client
            .get(format!("{}/api/registry", server.base_url()))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        if snapshot["connections"] == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("connection was not removed from the registry");
}
