//! Backend-Kollaborateur: Abgabevertrag und Antworttypen.

pub mod loopback;

pub use loopback::LoopbackBackend;

use serde::{Deserialize, Serialize};

use crate::app::transport::TimedSample;
use crate::core::Curve;

/// Ein einzelner Motor eines Motion-Players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorInfo {
    /// Backend-Id des Motors
    pub id: u32,
    /// Anzeigename
    pub name: String,
    /// Verfahrweg in Metern
    pub length: f64,
}

/// Ein ansteuerbarer Aktuator-Verbund (Satz von Motoren).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPlayerInfo {
    /// Backend-Id des Motion-Players
    pub id: u32,
    /// Anzeigename
    pub name: String,
    /// Zugehörige Motoren in Kanalreihenfolge
    pub motors: Vec<MotorInfo>,
}

/// Abgabeseite des Backend-Vertrags.
///
/// Alle Aufrufe sind nicht blockierend (fire and forget) und dürfen den
/// Telemetrie-Pfad nie aufhalten. Ergebnisse kommen als [`BackendReply`]
/// zurück, die der Host der Session über `on_backend_reply` zustellt.
/// Aufrufe mit `epoch` tragen die Transport-Epoche des Abschickens, damit
/// verspätete Antworten verworfen werden können.
pub trait Backend {
    /// Fordert die Liste der Motion-Player an.
    fn get_motion_player_infos(&mut self);

    /// Fordert die globalen Wertausgangs-Indizes eines Motors an.
    fn get_index_of_value_outputs(&mut self, motor_id: u32);

    /// Startet das Playback von `curve` auf dem Motion-Player.
    /// Die Antwort (`PlayStarted`) liefert die Server-Startzeit.
    fn play_spline(
        &mut self,
        curve: &Curve,
        motion_player_id: u32,
        looping: bool,
        offset: f64,
        epoch: u64,
    );

    /// Stoppt jedes laufende Playback.
    fn stop_spline_playback(&mut self);

    /// Aktiviert alle Motoren.
    fn enable_motors(&mut self);

    /// Deaktiviert alle Motoren.
    fn disable_motors(&mut self);

    /// Fittet eine Kurve durch die aufgenommenen Messzeilen.
    fn fit_spline(&mut self, samples: &[TimedSample], epoch: u64);

    /// Legt eine Kurve im Backend an.
    fn create_curve(&mut self, name: &str, curve: &Curve);

    /// Persistiert den aktuellen Stand einer Kurve.
    fn update_curve(&mut self, name: &str, curve: &Curve);

    /// Löscht eine Kurve im Backend.
    fn delete_curve(&mut self, name: &str);

    /// Reicht einen editierten Wert zur sofortigen physischen Rückmeldung
    /// an den Aktuator weiter (fire and forget, kein Retry).
    fn live_preview(&mut self, value: f64, motion_player_id: u32, channel: usize);
}

/// Abschlussseite: asynchrone Antworten des Backends.
///
/// Jeder Handler prüft vor dem Anwenden den aktuellen Transportzustand und
/// die Epoche; verspätete Antworten werden stillschweigend verworfen.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// Antwort auf `get_motion_player_infos`
    MotionPlayerInfos {
        /// Verfügbare Motion-Player
        infos: Vec<MotionPlayerInfo>,
    },
    /// Antwort auf `get_index_of_value_outputs`
    ValueOutputIndices {
        /// Angefragter Motor
        motor_id: u32,
        /// Globale Wertausgangs-Indizes des Motors
        indices: Vec<usize>,
    },
    /// Playback läuft; `start_time` ist die Server-Startzeit
    PlayStarted {
        /// Server-Startzeit in Sekunden
        start_time: f64,
        /// Epoche der zugehörigen Anfrage
        epoch: u64,
    },
    /// Fit-Anfrage erfolgreich
    SplineFitted {
        /// Gefittete Kurve
        curve: Curve,
        /// Epoche der zugehörigen Anfrage
        epoch: u64,
    },
    /// create/update einer Kurve bestätigt
    CurveSaved {
        /// Name der gesicherten Kurve
        name: String,
    },
    /// Anfrage fehlgeschlagen (Nicht-Erfolgs-Antwort oder Transportfehler)
    RequestFailed {
        /// Name des fehlgeschlagenen Aufrufs
        call: &'static str,
        /// Fehlerbeschreibung
        reason: String,
        /// Epoche der zugehörigen Anfrage (0 wenn nicht epochengebunden)
        epoch: u64,
    },
}
