//! Integrationstests für die EditingSession gegen das Loopback-Backend.

use approx::assert_relative_eq;
use motion_spline_editor::{
    scale, Curve, CurveSetMessage, EditingSession, EditorError, LoopbackBackend, NullRenderer,
    PositionHint, SessionEvent, SessionOptions, TelemetryFrame, TransportState,
};

/// Kubische Kurve mit Knoten [0,1,2,3] (Dauer 3), Werte innerhalb des
/// Loopback-Verfahrwegs von 100 mm.
fn demo_curve() -> Curve {
    Curve::new(
        vec![0.0, 1.0, 2.0, 3.0],
        vec![
            0.00, 0.03, 0.06, //
            0.01, 0.04, 0.07, //
            0.02, 0.05, 0.08, //
            0.03, 0.06, 0.09,
        ],
        4,
        1,
    )
    .expect("gültige Kurve")
}

fn frame(timestamp: f64, value: f64) -> TelemetryFrame {
    TelemetryFrame {
        timestamp,
        values: vec![value, value],
    }
}

/// Stellt alle eingereihten Backend-Antworten der Session zu.
fn pump(session: &mut EditingSession<LoopbackBackend, NullRenderer>) {
    // Zweimal drainen: Antwort-Handler dürfen Folge-Anfragen absetzen
    // (Player-Wahl fordert Kanal-Indizes an)
    for _ in 0..2 {
        let replies = session.backend_mut().drain_replies();
        for reply in replies {
            session.on_backend_reply(reply);
        }
    }
}

/// Session mit gestartetem Backend, gewähltem Motion-Player und
/// angezeigter Demo-Kurve.
fn make_session() -> EditingSession<LoopbackBackend, NullRenderer> {
    let mut session = EditingSession::new(
        LoopbackBackend::new(),
        NullRenderer,
        SessionOptions::default(),
    );
    session.startup();
    pump(&mut session);
    session
        .display_curve("demo", demo_curve())
        .expect("Demo-Kurve sollte anzeigbar sein");
    pump(&mut session);
    session.drain_events();
    session
}

// ── Playback ────────────────────────────────────────────────────────

#[test]
fn playback_anchors_position_to_server_start_time() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;

    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);
    assert_eq!(session.transport().state(), TransportState::Playing);

    session
        .on_telemetry(&frame(101.0, 0.05))
        .expect("Frame sollte verarbeitet werden");
    assert_relative_eq!(session.transport().position(), 1.0);
    assert_eq!(session.transport().state(), TransportState::Playing);
}

#[test]
fn playback_overrun_without_looping_terminates_naturally() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);

    session
        .on_telemetry(&frame(104.0, 0.05))
        .expect("Frame sollte verarbeitet werden");

    assert_eq!(session.transport().state(), TransportState::Paused);
    assert_relative_eq!(session.transport().position(), 0.0);
    assert!(session.drain_events().contains(&SessionEvent::TransportChanged {
        state: TransportState::Paused
    }));
}

#[test]
fn playback_overrun_with_looping_wraps_position() {
    let mut session = make_session();
    session.set_looping(true);
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);

    session
        .on_telemetry(&frame(104.0, 0.05))
        .expect("Frame sollte verarbeitet werden");

    assert_eq!(session.transport().state(), TransportState::Playing);
    assert_relative_eq!(session.transport().position(), 1.0);
}

#[test]
fn playback_resumes_at_paused_position() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);
    session
        .on_telemetry(&frame(102.0, 0.05))
        .expect("Frame sollte verarbeitet werden");
    session.pause();
    assert_relative_eq!(session.transport().position(), 2.0);

    // Wiedereinstieg: Server-Start 200, Position 2 bleibt der Offset
    session.backend_mut().clock = 200.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);
    session
        .on_telemetry(&frame(200.5, 0.05))
        .expect("Frame sollte verarbeitet werden");
    assert_relative_eq!(session.transport().position(), 2.5);
}

#[test]
fn stale_play_reply_after_stop_is_discarded() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    // stop() vor Eintreffen der Antwort erhöht die Epoche
    session.stop();
    pump(&mut session);

    assert_eq!(session.transport().state(), TransportState::Paused);
    session.drain_events();
    session
        .on_telemetry(&frame(101.0, 0.05))
        .expect("Frame sollte verarbeitet werden");
    // Paused: Frames werden ignoriert, Position kriecht nicht
    assert_relative_eq!(session.transport().position(), 0.0);
}

#[test]
fn telemetry_while_paused_is_ignored() {
    let mut session = make_session();
    session
        .on_telemetry(&frame(55.0, 0.05))
        .expect("Frame sollte verarbeitet werden");
    assert_eq!(session.transport().state(), TransportState::Paused);
    assert_relative_eq!(session.transport().position(), 0.0);
}

// ── Zweiphasiges Edit-Protokoll ─────────────────────────────────────

#[test]
fn commit_without_begin_is_rejected() {
    let mut session = make_session();
    let result = session.commit_change(demo_curve());
    assert_eq!(result.unwrap_err(), EditorError::NotEditing);
}

#[test]
fn begin_change_pauses_playback_and_requests_live_preview() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);
    assert_eq!(session.transport().state(), TransportState::Playing);

    session.begin_change(Some(PositionHint {
        channel: 0,
        value: 0.04,
    }));

    assert_eq!(session.transport().state(), TransportState::Paused);
    let calls = session.backend_mut().calls();
    assert!(calls.contains(&"stop_spline_playback"));
    assert!(calls.contains(&"live_preview"));
}

#[test]
fn commit_clips_candidate_to_motion_limit() {
    let mut session = make_session();
    session.begin_change(None);

    // Faktor 10 treibt die Kurve weit über den Verfahrweg von 0.1 m
    let candidate =
        scale(session.active_curve().expect("aktive Kurve"), 10.0).expect("gültiger Faktor");
    session
        .commit_change(candidate)
        .expect("Commit sollte gelingen");

    let committed = session.active_curve().expect("aktive Kurve");
    for i in 0..=30 {
        let t = 3.0 * i as f64 / 30.0;
        assert!(
            committed.sample(t, 0) <= 0.1 + 1e-12,
            "Wert bei t={} über dem Limit",
            t
        );
    }
}

#[test]
fn failed_persistence_keeps_local_snapshot_and_notifies() {
    let mut session = make_session();
    session.backend_mut().fail_saves = true;
    session.begin_change(None);
    let candidate =
        scale(session.active_curve().expect("aktive Kurve"), 0.5).expect("gültiger Faktor");
    session
        .commit_change(candidate.clone())
        .expect("Commit sollte lokal gelingen");
    pump(&mut session);

    // Lokaler Snapshot bleibt autoritativ, keine Rollbacks
    assert_eq!(session.active_curve().expect("aktive Kurve"), &candidate);
    assert!(session.can_save());
    let events = session.drain_events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Notification { .. })),
        "fehlgeschlagener Save sollte benachrichtigen"
    );
}

#[test]
fn successful_persistence_marks_history_saved() {
    let mut session = make_session();
    session.begin_change(None);
    let candidate =
        scale(session.active_curve().expect("aktive Kurve"), 0.5).expect("gültiger Faktor");
    session
        .commit_change(candidate)
        .expect("Commit sollte gelingen");
    assert!(session.can_save());

    pump(&mut session);
    assert!(!session.can_save());
}

#[test]
fn commit_consumes_the_edit_phase() {
    let mut session = make_session();
    session.begin_change(None);
    session
        .commit_change(demo_curve())
        .expect("erster Commit sollte gelingen");

    // Jeder Commit braucht genau ein begin_change
    let second = session.commit_change(demo_curve());
    assert_eq!(second.unwrap_err(), EditorError::NotEditing);
}

#[test]
fn repeated_begin_change_just_repauses() {
    let mut session = make_session();
    session.begin_change(None);
    session.begin_change(Some(PositionHint {
        channel: 1,
        value: 0.02,
    }));

    // Kein Edit-Lock: der zweite begin_change previewt erneut,
    // der anschließende Commit gelingt
    session
        .commit_change(demo_curve())
        .expect("Commit sollte gelingen");
}

#[test]
fn undo_redo_roundtrip_restores_snapshots() {
    let mut session = make_session();
    let original = session.active_curve().expect("aktive Kurve").clone();

    session.begin_change(None);
    let candidate = scale(&original, 0.5).expect("gültiger Faktor");
    session
        .commit_change(candidate.clone())
        .expect("Commit sollte gelingen");

    assert!(session.can_undo());
    session.undo_edit().expect("Undo sollte gelingen");
    assert_eq!(session.active_curve().expect("aktive Kurve"), &original);

    assert!(session.can_redo());
    session.redo_edit().expect("Redo sollte gelingen");
    assert_eq!(session.active_curve().expect("aktive Kurve"), &candidate);
}

#[test]
fn undo_persists_now_current_snapshot() {
    let mut session = make_session();
    session.begin_change(None);
    let candidate =
        scale(session.active_curve().expect("aktive Kurve"), 0.5).expect("gültiger Faktor");
    session
        .commit_change(candidate)
        .expect("Commit sollte gelingen");
    let updates_before = count_calls(&mut session, "update_curve");

    session.undo_edit().expect("Undo sollte gelingen");
    assert_eq!(count_calls(&mut session, "update_curve"), updates_before + 1);
}

fn count_calls(
    session: &mut EditingSession<LoopbackBackend, NullRenderer>,
    name: &str,
) -> usize {
    session
        .backend_mut()
        .calls()
        .iter()
        .filter(|c| **c == name)
        .count()
}

// ── Aufnahme und Fit ────────────────────────────────────────────────

#[test]
fn recording_fits_and_captures_into_active_history() {
    let mut session = make_session();
    let history_len_before = session
        .workspace()
        .get("demo")
        .expect("History vorhanden")
        .len();

    session.record().expect("record sollte gelingen");
    assert_eq!(session.transport().state(), TransportState::Recording);
    for i in 1..=5 {
        let t = 0.1 * i as f64;
        session
            .on_telemetry(&frame(t, 0.02 * i as f64))
            .expect("Frame sollte verarbeitet werden");
    }
    session.finish_record();
    pump(&mut session);

    let history = session.workspace().get("demo").expect("History vorhanden");
    assert_eq!(history.len(), history_len_before + 1);
    let fitted = session.active_curve().expect("aktive Kurve");
    // Fünf Messzeilen über 0.4 s, Start auf Null geschnappt
    assert_relative_eq!(fitted.start(), 0.0);
    assert_relative_eq!(fitted.duration(), 0.4, epsilon = 1e-9);
    assert_eq!(fitted.ndim(), 2);
}

#[test]
fn finishing_an_empty_recording_requests_no_fit() {
    let mut session = make_session();
    session.record().expect("record sollte gelingen");
    session.finish_record();

    assert_eq!(session.transport().state(), TransportState::Paused);
    assert_eq!(count_calls(&mut session, "fit_spline"), 0);
}

#[test]
fn failed_fit_discards_recording_without_retry() {
    let mut session = make_session();
    let history_len_before = session
        .workspace()
        .get("demo")
        .expect("History vorhanden")
        .len();

    session.record().expect("record sollte gelingen");
    // Eine einzelne Messzeile reicht dem Backend nicht für einen Fit
    session
        .on_telemetry(&frame(0.1, 0.05))
        .expect("Frame sollte verarbeitet werden");
    session.finish_record();
    pump(&mut session);

    assert_eq!(count_calls(&mut session, "fit_spline"), 1);
    let history = session.workspace().get("demo").expect("History vorhanden");
    assert_eq!(history.len(), history_len_before);
    let events = session.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Notification { .. })));
}

#[test]
fn record_requires_active_curve() {
    let mut session = EditingSession::new(
        LoopbackBackend::new(),
        NullRenderer,
        SessionOptions::default(),
    );
    session.startup();
    pump(&mut session);

    assert_eq!(session.record().unwrap_err(), EditorError::NoCurveSelected);
}

// ── Workspace-Abgleich ──────────────────────────────────────────────

#[test]
fn curve_set_message_reconciles_workspace() {
    let mut session = make_session();
    session
        .display_curve("a", demo_curve())
        .expect("anzeigbar");
    session
        .display_curve("b", demo_curve())
        .expect("anzeigbar");
    session.drain_events();

    // Backend kennt nur noch "demo" und "a"; "neu" kommt hinzu
    let message = CurveSetMessage {
        curves: vec![
            ("demo".to_string(), demo_curve()),
            ("a".to_string(), demo_curve()),
            ("neu".to_string(), Curve::zero(1)),
        ],
    };
    session.on_curve_set_message(&message);

    let names: Vec<&str> = session.workspace().names().collect();
    assert_eq!(names, vec!["demo", "a", "neu"]);
    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::CurveChanged {
        name: "b".to_string()
    }));
}

#[test]
fn evicting_the_active_curve_stops_the_transport() {
    let mut session = make_session();
    session.backend_mut().clock = 100.0;
    session.play().expect("play sollte abgesetzt werden");
    pump(&mut session);
    assert_eq!(session.transport().state(), TransportState::Playing);

    let message = CurveSetMessage {
        curves: vec![("andere".to_string(), Curve::zero(1))],
    };
    session.on_curve_set_message(&message);

    assert_eq!(session.transport().state(), TransportState::Paused);
    assert!(session.workspace().contains("andere"));
    assert!(!session.workspace().contains("demo"));
    // Die neu angezeigte Kurve wird aktiv, die alte ist restlos verschwunden
    assert_eq!(session.active_curve_name(), Some("andere"));
}

#[test]
fn create_curve_displays_zero_curve_and_persists() {
    let mut session = make_session();
    session
        .create_curve("frisch", 2)
        .expect("Anlegen sollte gelingen");

    assert!(session.workspace().contains("frisch"));
    assert_eq!(count_calls(&mut session, "create_curve"), 1);
    // Neu angelegte Kurven sind die kubische Null-Kurve über [0, 1]
    let history = session.workspace().get("frisch").expect("History vorhanden");
    let curve = history.retrieve().expect("Snapshot vorhanden");
    assert_eq!(curve.ndim(), 2);
    assert_relative_eq!(curve.duration(), 1.0);
    assert_relative_eq!(curve.sample(0.5, 1), 0.0);
}

#[test]
fn delete_curve_defers_eviction_to_reconciliation() {
    let mut session = make_session();
    session.delete_curve("demo");

    // Lokal bleibt die History bis zum nächsten Mengenabgleich bestehen
    assert_eq!(count_calls(&mut session, "delete_curve"), 1);
    assert!(session.workspace().contains("demo"));

    session.on_curve_set_message(&CurveSetMessage { curves: vec![] });
    assert!(!session.workspace().contains("demo"));
}

// ── Viewport ────────────────────────────────────────────────────────

#[test]
fn zoom_view_narrows_span_around_midpoint() {
    let mut session = make_session();
    // Viewport ist an der Demo-Kurve ausgerichtet: [0,3] x Hülle
    let before = session.viewport();
    assert_relative_eq!(before.left, 0.0);
    assert_relative_eq!(before.right, 3.0);

    session.zoom_view(2.0).expect("gültiger Faktor");
    let after = session.viewport();
    assert_relative_eq!(after.left, 0.75);
    assert_relative_eq!(after.right, 2.25);
    assert_relative_eq!(after.bottom, before.bottom);
    assert_relative_eq!(after.top, before.top);

    assert!(session.zoom_view(0.0).is_err());
}

// ── Motion-Player ───────────────────────────────────────────────────

#[test]
fn startup_selects_first_player_and_collects_channels() {
    let session = make_session();
    assert_eq!(session.selected_player(), Some(0));
    assert_eq!(session.channels(), &[0, 1]);
    let limit = session.motion_limit().expect("Limit vorhanden");
    assert_relative_eq!(limit.top, 0.1);
    assert_relative_eq!(limit.bottom, 0.0);
}
