//! Motion Spline Editor (Headless-Demo).
//!
//! Fährt die Session-Engine gegen das Loopback-Backend: Kurve anzeigen,
//! editieren, abspielen, aufnehmen und fitten. Telemetrie wird mit einer
//! simulierten Server-Uhr eingespeist.

use motion_spline_editor::{
    scale, Curve, EditingSession, LoopbackBackend, NullRenderer, PositionHint, SessionOptions,
    TelemetryFrame, TransportState,
};

/// Takt der simulierten Telemetrie in Sekunden.
const INTERVAL: f64 = 0.010;

fn main() -> anyhow::Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!(
        "Motion Spline Editor v{} startet...",
        env!("CARGO_PKG_VERSION")
    );

    // Optionen aus TOML laden (oder Standardwerte)
    let config_path = SessionOptions::config_path();
    let options = SessionOptions::load_from_file(&config_path);

    let mut session = EditingSession::new(LoopbackBackend::new(), NullRenderer, options);
    session.startup();
    pump(&mut session);

    // Demo-Kurve: kubische Rampe von 0 auf 80 mm über eine Sekunde
    let ramp = Curve::new(vec![0.0, 1.0], vec![0.0, 0.02, 0.06, 0.08], 4, 1)?;
    session.display_curve("demo", ramp)?;

    // Edit über das Bewegungslimit hinaus; der Commit klemmt auf den
    // Verfahrweg des gewählten Motion-Players
    session.begin_change(Some(PositionHint {
        channel: 0,
        value: 0.04,
    }));
    let candidate = scale(session.active_curve()?, 2.0)?;
    session.commit_change(candidate)?;
    pump(&mut session);

    // Playback bis zum natürlichen Ende
    let mut now = 10.0;
    session.backend_mut().clock = now;
    session.play()?;
    pump(&mut session);
    while session.transport().state() == TransportState::Playing {
        now += INTERVAL;
        session.on_telemetry(&frame(now, &session))?;
    }
    log::info!("Playback natürlich beendet bei t = {:.2}s", now);

    // Eine halbe Sekunde Telemetrie aufzeichnen und fitten lassen
    session.record()?;
    for _ in 0..50 {
        now += INTERVAL;
        session.on_telemetry(&frame(now, &session))?;
    }
    session.finish_record();
    pump(&mut session);

    for event in session.drain_events() {
        log::info!("Event: {:?}", event);
    }

    // Persistierter Stand der aktiven Kurve im Wire-Format
    let json = serde_json::to_string_pretty(session.active_curve()?)?;
    println!("{json}");

    Ok(())
}

/// Telemetrie-Frame der simulierten Aktuatoren: eine langsame Sinuswelle
/// auf beiden Kanälen.
fn frame(now: f64, session: &EditingSession<LoopbackBackend, NullRenderer>) -> TelemetryFrame {
    let value = 0.05 + 0.03 * (now * std::f64::consts::TAU * 0.5).sin();
    let outputs = session.channels().len().max(2);
    TelemetryFrame {
        timestamp: now,
        values: vec![value; outputs],
    }
}

/// Stellt alle eingereihten Backend-Antworten der Session zu.
fn pump(session: &mut EditingSession<LoopbackBackend, NullRenderer>) {
    let replies = session.backend_mut().drain_replies();
    for reply in replies {
        session.on_backend_reply(reply);
    }
}
