//! Playback through a Session

use looptrace::{Session, SessionStatus, SimConfig, SimError, StepEvent};

const PROGRAM: &str = "function a() {} setTimeout(function t() { a(); }, 10); a();";

fn running_session() -> Session {
    let mut session = Session::new();
    session.set_code(PROGRAM);
    session.run().unwrap();
    session
}

#[test]
fn test_run_starts_at_first_step() {
    let session = running_session();
    assert_eq!(session.status(), SessionStatus::Running);
    assert!(session.is_running());
    assert_eq!(session.step_index(), 0);
    assert_eq!(session.current_step().map(|s| &s.event), Some(&StepEvent::Start));
}

#[test]
fn test_stepping_walks_the_trace_then_completes() {
    let mut session = running_session();
    let total = session.trace().unwrap().len();

    let mut indices = vec![session.step_index()];
    while session.step() {
        indices.push(session.step_index());
    }
    assert_eq!(indices, (0..total).collect::<Vec<_>>());
    assert_eq!(session.status(), SessionStatus::Completed);

    // Stepping past the end keeps the index on the last step
    assert!(!session.step());
    assert_eq!(session.step_index(), total - 1);
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[test]
fn test_pause_keeps_position() {
    let mut session = running_session();
    session.step();
    session.step();
    session.pause();

    assert_eq!(session.status(), SessionStatus::Paused);
    assert_eq!(session.step_index(), 2);
    assert!(session.trace().is_some());
}

#[test]
fn test_reset_equals_fresh_session() {
    let mut session = running_session();
    session.step();
    session.pause();
    session.reset();
    assert_eq!(session, Session::new());

    let config = SimConfig::default().with_max_steps(20);
    let mut limited = Session::with_config(config.clone());
    limited.set_code(PROGRAM);
    limited.run().unwrap();
    limited.reset();
    assert_eq!(limited, Session::with_config(config));
}

#[test]
fn test_rerun_restarts_from_zero() {
    let mut session = running_session();
    session.seek(4);
    session.run().unwrap();
    assert_eq!(session.step_index(), 0);
    assert_eq!(session.status(), SessionStatus::Running);
}

#[test]
fn test_seek_is_clamped() {
    let mut session = running_session();
    let last = session.trace().unwrap().len() - 1;
    assert_eq!(session.seek(3), 3);
    assert_eq!(session.seek(10_000), last);
}

#[test]
fn test_parse_failure_leaves_session_idle() {
    let mut session = running_session();
    session.set_code("function (");

    let err = session.run().unwrap_err();
    assert!(matches!(err, SimError::SyntaxError { .. }));
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(session.trace().is_none());
    assert!(session.current_step().is_none());
    assert!(session.diagnostics().is_empty());
}

#[test]
fn test_session_exposes_diagnostics_and_console() {
    let mut session = Session::new();
    session.set_code("missing(); console.log('ok');");
    session.run().unwrap();

    assert_eq!(session.diagnostics().len(), 1);
    assert_eq!(session.console().len(), 1);
}

#[test]
fn test_view_serializes_for_ui() {
    let mut session = running_session();
    session.step();

    let json = serde_json::to_value(session.view()).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["running"], true);
    assert_eq!(json["step"], 1);
    assert_eq!(json["current"]["event"]["type"], "TaskEnqueued");
    assert_eq!(json["current"]["tasks"][0]["name"], "t");
    assert_eq!(json["current"]["tasks"][0]["delay"], 10.0);
}

#[test]
fn test_idle_view() {
    let session = Session::new();
    let view = session.view();
    assert_eq!(view.status, SessionStatus::Idle);
    assert!(!view.running);
    assert_eq!(view.total_steps, 0);
    assert!(view.current.is_none());
}
