//! Playback/Record-Transport, getrieben von Echtzeit-Telemetrie.

use crate::error::EditorError;

/// Geschlossene Zustandsmenge des Transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Ausgangs- und Ruhezustand
    Paused,
    /// Playback läuft, Position folgt der Telemetrie
    Playing,
    /// Aufnahme läuft, Messzeilen werden unbegrenzt gepuffert
    Recording,
}

/// Eine zeitgestempelte Messzeile (Zeit plus Kanalwerte).
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSample {
    /// Zeitstempel in der Zeitachse der aktiven Kurve
    pub timestamp: f64,
    /// Kanalwerte in Kanalreihenfolge
    pub values: Vec<f64>,
}

/// Positions-Tracking für Playback und Aufnahme.
///
/// `position = timestamp - start_time`. Bei aktivem Looping wird die
/// gespeicherte Position modulo `duration` gewickelt; der rohe Wert wird
/// trotzdem zurückgegeben, damit Aufrufer Überläufe auch dann erkennen,
/// wenn das Looping sie lokal unterdrückt.
///
/// Jede extern ausgelöste Transition erhöht die Epoche, auch wenn der
/// Zielzustand dem alten gleicht. Asynchrone Backend-Antworten tragen die
/// Epoche ihrer Anfrage und verfallen bei Abweichung.
#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    position: f64,
    duration: f64,
    looping: bool,
    start_time: f64,
    epoch: u64,
    buffer: Vec<TimedSample>,
    trace_capacity: usize,
}

impl Transport {
    /// Erstellt einen pausierten Transport ohne aktive Kurve.
    ///
    /// `trace_capacity` begrenzt die Playback-Spur; während einer Aufnahme
    /// ist der Puffer unbeschränkt.
    pub fn new(trace_capacity: usize) -> Self {
        Self {
            state: TransportState::Paused,
            position: 0.0,
            duration: 0.0,
            looping: false,
            start_time: 0.0,
            epoch: 0,
            buffer: Vec::new(),
            trace_capacity,
        }
    }

    /// Aktueller Zustand.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Aktuelle Position in der Zeitachse der aktiven Kurve.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Dauer der aktiven Kurve (letzter Knoten); 0 = keine Kurve.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Setzt die Dauer der aktiven Kurve.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    /// Looping aktiv?
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Schaltet das Looping um; wirkt ab dem nächsten Telemetrie-Frame.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Aktuelle Epoche für die Verfallsprüfung asynchroner Antworten.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Paused → Playing.
    ///
    /// `start_time` ist vom Aufrufer so verankert, dass
    /// `timestamp - start_time` den gewünschten Wiedereinstiegs-Offset
    /// ergibt (`start_time = Server-Startzeit - aktuelle Position`).
    pub fn play(&mut self, start_time: f64) {
        if self.state != TransportState::Paused {
            log::warn!("Transport: play() im Zustand {:?} ignoriert", self.state);
            return;
        }
        self.start_time = start_time;
        self.set_state(TransportState::Playing);
    }

    /// Beliebiger Zustand → Paused, Position unverändert.
    pub fn pause(&mut self) {
        self.set_state(TransportState::Paused);
    }

    /// Beliebiger Zustand → Paused, Position auf 0 zurückgesetzt.
    pub fn stop(&mut self) {
        self.position = 0.0;
        self.set_state(TransportState::Paused);
    }

    /// Paused → Recording. Leert den Puffer; die Kapazität ist während der
    /// Aufnahme unbeschränkt und übersteuert das Playback-Stutzen.
    pub fn record(&mut self) {
        if self.state != TransportState::Paused {
            log::warn!("Transport: record() im Zustand {:?} ignoriert", self.state);
            return;
        }
        self.buffer.clear();
        self.set_state(TransportState::Recording);
    }

    /// Recording → Paused. Entleert den Aufnahmepuffer und gibt ihn zurück;
    /// außerhalb einer Aufnahme bleibt der Puffer unangetastet.
    pub fn finish_record(&mut self) -> Vec<TimedSample> {
        if self.state != TransportState::Recording {
            log::warn!(
                "Transport: finish_record() im Zustand {:?} ignoriert",
                self.state
            );
            return Vec::new();
        }
        self.set_state(TransportState::Paused);
        std::mem::take(&mut self.buffer)
    }

    /// Verarbeitet einen Telemetrie-Zeitstempel.
    ///
    /// Speichert die (bei Looping gewickelte) Position und gibt immer den
    /// rohen Wert `timestamp - start_time` zurück. Läuft ein nicht loopendes
    /// Playback über `duration` hinaus, wechselt der Transport selbst nach
    /// Paused mit Position 0 (natürliches Ende, unterschieden vom expliziten
    /// `stop()`). Ohne aktive Kurve ist der Aufruf eine
    /// Vorbedingungsverletzung.
    pub fn advance(&mut self, timestamp: f64) -> Result<f64, EditorError> {
        if self.duration <= 0.0 {
            return Err(EditorError::NoCurveSelected);
        }
        let raw = timestamp - self.start_time;
        if self.state == TransportState::Playing && !self.looping && raw > self.duration {
            self.position = 0.0;
            self.set_state(TransportState::Paused);
            return Ok(raw);
        }
        self.position = if self.looping {
            raw.rem_euclid(self.duration)
        } else {
            raw
        };
        Ok(raw)
    }

    /// Hängt eine Messzeile an den Puffer an.
    ///
    /// Außerhalb einer Aufnahme wird auf `trace_capacity` gestutzt (älteste
    /// Zeilen zuerst), während der Aufnahme nicht.
    pub fn push_sample(&mut self, sample: TimedSample) {
        self.buffer.push(sample);
        if self.state != TransportState::Recording && self.buffer.len() > self.trace_capacity {
            let excess = self.buffer.len() - self.trace_capacity;
            self.buffer.drain(..excess);
        }
    }

    /// Gepufferte Messzeilen in Ankunftsreihenfolge.
    pub fn samples(&self) -> &[TimedSample] {
        &self.buffer
    }

    fn set_state(&mut self, next: TransportState) {
        if self.state != next {
            log::debug!("Transport: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.epoch += 1;
    }
}
