// common/tests/protocol.rs
use serde_json::json;
use sledrun_common::{
    ClientMessage, Cosmetics, CosmeticsPatch, GameMode, ServerMessage, CosmeticCategory,
};

#[test]
fn test_client_message_wire_format() {
    let raw = json!({
        "type": "createRoom",
        "payload": { "mode": "endless", "name": "Host", "isSolo": true }
    });

    let parsed: ClientMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(
        parsed,
        ClientMessage::CreateRoom {
            mode: GameMode::Endless,
            name: Some("Host".to_string()),
            is_solo: true,
        }
    );
}

#[test]
fn test_create_room_defaults() {
    // Older clients omit everything but the mode
    let parsed: ClientMessage =
        serde_json::from_str(r#"{"type":"createRoom","payload":{}}"#).unwrap();
    assert_eq!(
        parsed,
        ClientMessage::CreateRoom {
            mode: GameMode::Race,
            name: None,
            is_solo: false,
        }
    );
}

#[test]
fn test_player_state_payload_is_opaque() {
    let raw = r#"{"type":"playerState","payload":{"code":"AB12","state":{"x":10,"y":20,"angle":0.5,"extra":[1,2]}}}"#;
    let parsed: ClientMessage = serde_json::from_str(raw).unwrap();
    let ClientMessage::PlayerState { code, state } = parsed else {
        panic!("Expected PlayerState");
    };
    assert_eq!(code, "AB12");
    assert_eq!(state["extra"], json!([1, 2]));
}

#[test]
fn test_unknown_message_type_is_rejected() {
    let raw = r#"{"type":"teleport","payload":{"code":"AB12"}}"#;
    assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
}

#[test]
fn test_server_message_wire_format() {
    let msg = ServerMessage::PlayerStateUpdate {
        id: "abc".to_string(),
        state: json!({"x": 10, "y": 20, "angle": 0.5}),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "playerStateUpdate");
    assert_eq!(value["payload"]["id"], "abc");
    assert_eq!(value["payload"]["state"]["angle"], 0.5);

    let err = serde_json::to_value(ServerMessage::RoomError("Room full".to_string())).unwrap();
    assert_eq!(err, json!({"type": "roomError", "payload": "Room full"}));
}

#[test]
fn test_player_left_uses_camel_case() {
    let msg = ServerMessage::PlayerLeft {
        id: "a".to_string(),
        host_id: "b".to_string(),
        players: Default::default(),
    };
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["payload"]["hostId"], "b");
}

#[test]
fn test_cosmetics_partial_merge() {
    let mut cosmetics = Cosmetics::default();
    let patch: CosmeticsPatch = serde_json::from_str(r#"{"sled":"X"}"#).unwrap();
    cosmetics.apply(&patch);

    assert_eq!(cosmetics.sled, "X");
    assert_eq!(cosmetics.character, Cosmetics::default().character);
    assert_eq!(cosmetics.hat, Cosmetics::default().hat);
}

#[test]
fn test_category_parse() {
    assert_eq!(CosmeticCategory::parse("sleds"), Some(CosmeticCategory::Sleds));
    assert_eq!(CosmeticCategory::parse("Sleds"), None);
    assert_eq!(CosmeticCategory::parse("boots"), None);
}

#[test]
fn test_player_finished_keeps_explicit_null() {
    let raw = r#"{"type":"playerFinished","payload":{"code":"AB12","time":null,"score":5}}"#;
    let ClientMessage::PlayerFinished { time, score, .. } = serde_json::from_str(raw).unwrap()
    else {
        panic!("Expected PlayerFinished");
    };

    let relayed = serde_json::to_value(ServerMessage::PlayerFinished {
        id: "c".to_string(),
        time,
        score,
    })
    .unwrap();
    assert_eq!(
        relayed,
        json!({"type": "playerFinished", "payload": {"id": "c", "time": null, "score": 5}})
    );
}
