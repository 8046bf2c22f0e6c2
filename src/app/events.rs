//! Eingehende Nachrichten und ausgehende Domänen-Events der Session.

use serde::{Deserialize, Serialize};

use crate::app::transport::TransportState;
use crate::core::Curve;

/// Telemetrie-Frame des Backends, einer pro Echtzeit-Takt.
///
/// `values` ist über den globalen Ausgangs-Index adressiert; die Session
/// pickt die Kanäle des gewählten Motion-Players heraus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Zeitstempel der Server-Uhr in Sekunden
    pub timestamp: f64,
    /// Aktuelle Werte aller Wertausgänge
    pub values: Vec<f64>,
}

/// Autoritative Kurvenliste des Backends; treibt den Workspace-Abgleich.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSetMessage {
    /// Paare aus Kurvenname und aktuellem Backend-Stand
    pub curves: Vec<(String, Curve)>,
}

/// Ausgehende Domänen-Events für die Präsentationsschicht.
///
/// Die Engine fasst UI-Zustand nie direkt an; Hosts leeren die Queue über
/// `drain_events` und reagieren selbst.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Kurve `name` hat sich lokal geändert (Commit, Undo/Redo, Eviction)
    CurveChanged {
        /// Name der betroffenen Kurve
        name: String,
    },
    /// Transportzustand hat gewechselt
    TransportChanged {
        /// Neuer Zustand
        state: TransportState,
    },
    /// Transiente Benachrichtigung an den Benutzer (z.B. fehlgeschlagener Save)
    Notification {
        /// Anzeigetext
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_frame_parses_from_wire_json() {
        let json = r#"{"timestamp": 1.25, "values": [0.04, 0.07]}"#;
        let frame: TelemetryFrame = serde_json::from_str(json).expect("gültiges Frame-JSON");
        assert_eq!(frame.values.len(), 2);
        assert!((frame.timestamp - 1.25).abs() < 1e-12);
    }

    #[test]
    fn curve_set_message_roundtrips() {
        let message = CurveSetMessage {
            curves: vec![("demo".to_string(), Curve::zero(1))],
        };
        let json = serde_json::to_string(&message).expect("Serialisierung");
        let back: CurveSetMessage = serde_json::from_str(&json).expect("Deserialisierung");
        assert_eq!(back, message);
    }
}
