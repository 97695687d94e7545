use crate::recorder::{
    default_recorder, format_record, get_recorder_type, install, recorder_factory,
    RecorderType,
};

#[test]
fn test_get_recorder_type() {
    assert_eq!(RecorderType::None, get_recorder_type("none"));
    assert_eq!(RecorderType::Console, get_recorder_type("CONSOLE"));
    assert_eq!(RecorderType::Log, get_recorder_type("log"));
}

#[test]
fn test_unknown_recorder_falls_back_to_log() {
    assert_eq!(RecorderType::Log, get_recorder_type("syslog"));
    assert_eq!(RecorderType::Log, get_recorder_type(""));
}

#[test]
fn test_format_record() {
    assert_eq!(
        "BossError - Status: 404 - Code: 4000 - Message: x",
        format_record(404, 4000, "x")
    );
}

#[test]
fn test_recorders_accept_records() {
    for kind in &[RecorderType::None, RecorderType::Console, RecorderType::Log] {
        recorder_factory(*kind).record(400, 1001, "bad cutout");
    }
}

#[test]
fn test_install_only_once() {
    // Other tests may already have built errors and set the default.
    let _ = install(RecorderType::None);
    assert!(!install(RecorderType::Console));
    default_recorder().record(404, 4000, "still usable");
}
