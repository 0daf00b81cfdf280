use vantage_console_lib::config::SessionConfig;
use vantage_console_lib::serial::{ScriptedChannel, SerialError};
use vantage_console_lib::station::{Command, Completed, Outcome, StationSession};

fn config_with_offset(model_offset: usize) -> SessionConfig {
    SessionConfig {
        wake_settle_ms: 1,
        reply_settle_ms: 1,
        reply_timeout_ms: 200,
        quiet_window_ms: 20,
        model_offset,
        ..SessionConfig::default()
    }
}

async fn query_model(reply: &[u8], model_offset: usize) -> Result<Completed, SerialError> {
    let channel = ScriptedChannel::new();
    channel.push_chunk(reply.to_vec());
    let completed = StationSession::new(channel.clone(), config_with_offset(model_offset))
        .execute(Some(Command::GetModel))
        .await;
    if completed.is_ok() {
        assert_eq!(channel.written(), vec![vec![0x0D], b"WRD\x12\x4D\n".to_vec()]);
    }
    completed
}

fn model_name(completed: &Completed) -> &'static str {
    match &completed.outcome {
        Outcome::Model(model) => model.name,
        other => panic!("expected a model reply, got {:?}", other),
    }
}

#[tokio::test]
async fn four_byte_record_at_offset_three() {
    let completed = query_model(&[0x00, 0x00, 0x00, 0x10], 3).await.unwrap();
    assert_eq!(model_name(&completed), "Vantage Pro");
}

#[tokio::test]
async fn single_byte_at_offset_zero() {
    let completed = query_model(&[0x10], 0).await.unwrap();
    assert_eq!(model_name(&completed), "Vantage Pro");
}

#[tokio::test]
async fn padded_zero_code_is_wizard_iii() {
    let completed = query_model(&[0x00, 0x00, 0x00, 0x00], 0).await.unwrap();
    assert_eq!(model_name(&completed), "Wizard III");
}

#[tokio::test]
async fn unmapped_code_degrades_to_unknown() {
    let completed = query_model(&[99], 0).await.unwrap();
    assert_eq!(model_name(&completed), "Unknown model");
}

#[tokio::test]
async fn offset_three_on_a_short_reply_is_an_error() {
    let err = query_model(&[0x10], 3).await.unwrap_err();
    assert!(matches!(err, SerialError::ShortReply { offset: 3, received: 1 }));
}

#[tokio::test]
async fn offset_zero_on_a_four_byte_record_reads_the_first_byte() {
    // The wrong convention is visible in the decoded code rather than hidden
    let completed = query_model(&[0x00, 0x00, 0x00, 0x10], 0).await.unwrap();
    match completed.outcome {
        Outcome::Model(model) => {
            assert_eq!(model.code, 0);
            assert_eq!(model.name, "Wizard III");
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}
