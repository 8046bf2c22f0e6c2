//! Lokales Backend-Double für Demo-Binary und Integrationstests.

use std::collections::VecDeque;

use crate::app::transport::TimedSample;
use crate::core::{transform, Curve};

use super::{Backend, BackendReply, MotionPlayerInfo, MotorInfo};

/// Beantwortet jede Abgabe lokal durch Einreihen einer Antwort.
///
/// Die simulierte Server-Uhr (`clock`) ist dieselbe Zeitbasis, mit der der
/// Host seine Telemetrie-Frames stempelt. Save-Fehler lassen sich für Tests
/// injizieren; alle abgesetzten Aufrufe werden in Reihenfolge protokolliert.
pub struct LoopbackBackend {
    replies: VecDeque<BackendReply>,
    calls: Vec<&'static str>,
    players: Vec<MotionPlayerInfo>,
    /// Simulierte Server-Uhr in Sekunden
    pub clock: f64,
    /// Jede create/update-Anfrage schlägt fehl, solange gesetzt
    pub fail_saves: bool,
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackBackend {
    /// Erstellt ein Loopback-Backend mit einem Motion-Player aus zwei
    /// Linearmotoren (Verfahrweg je 100 mm).
    pub fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            calls: Vec::new(),
            players: vec![MotionPlayerInfo {
                id: 0,
                name: "Motion Player 0".to_string(),
                motors: vec![
                    MotorInfo {
                        id: 0,
                        name: "Linear Motor 0".to_string(),
                        length: 0.100,
                    },
                    MotorInfo {
                        id: 1,
                        name: "Linear Motor 1".to_string(),
                        length: 0.100,
                    },
                ],
            }],
            clock: 0.0,
            fail_saves: false,
        }
    }

    /// Ersetzt die angebotenen Motion-Player.
    pub fn set_players(&mut self, players: Vec<MotionPlayerInfo>) {
        self.players = players;
    }

    /// Entnimmt alle eingereihten Antworten (Host-Pumpe).
    pub fn drain_replies(&mut self) -> Vec<BackendReply> {
        self.replies.drain(..).collect()
    }

    /// Alle abgesetzten Aufrufe in Reihenfolge.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    fn fail(&mut self, call: &'static str, reason: &str, epoch: u64) {
        self.replies.push_back(BackendReply::RequestFailed {
            call,
            reason: reason.to_string(),
            epoch,
        });
    }

    /// Linearer Bernstein-Fit durch die Messzeilen, Start auf Null geschnappt.
    fn fit(samples: &[TimedSample]) -> Result<Curve, &'static str> {
        // Nur streng monoton steigende Zeitstempel bilden Knoten
        let mut rows: Vec<&TimedSample> = Vec::new();
        for sample in samples {
            if rows
                .last()
                .is_none_or(|last| sample.timestamp > last.timestamp)
            {
                rows.push(sample);
            }
        }
        if rows.len() < 2 {
            return Err("zu wenige Messzeilen für einen Fit");
        }
        let ndim = rows[0].values.len();
        if ndim == 0 || rows.iter().any(|r| r.values.len() != ndim) {
            return Err("Messzeilen haben uneinheitliche Kanalzahl");
        }

        let knots: Vec<f64> = rows.iter().map(|r| r.timestamp).collect();
        let segments = knots.len() - 1;
        let mut coefficients = vec![0.0; 2 * segments * ndim];
        for seg in 0..segments {
            for dim in 0..ndim {
                coefficients[seg * ndim + dim] = rows[seg].values[dim];
                coefficients[(segments + seg) * ndim + dim] = rows[seg + 1].values[dim];
            }
        }
        let curve =
            Curve::new(knots, coefficients, 2, ndim).map_err(|_| "degenerierte Messzeilen")?;
        transform::shift(&curve, f64::NEG_INFINITY).map_err(|_| "degenerierte Messzeilen")
    }
}

impl Backend for LoopbackBackend {
    fn get_motion_player_infos(&mut self) {
        self.calls.push("get_motion_player_infos");
        self.replies.push_back(BackendReply::MotionPlayerInfos {
            infos: self.players.clone(),
        });
    }

    fn get_index_of_value_outputs(&mut self, motor_id: u32) {
        self.calls.push("get_index_of_value_outputs");
        // Globaler Index = Position des Motors über alle Player hinweg
        let index = self
            .players
            .iter()
            .flat_map(|p| p.motors.iter())
            .position(|m| m.id == motor_id);
        match index {
            Some(index) => self.replies.push_back(BackendReply::ValueOutputIndices {
                motor_id,
                indices: vec![index],
            }),
            None => self.fail("get_index_of_value_outputs", "unbekannter Motor", 0),
        }
    }

    fn play_spline(
        &mut self,
        _curve: &Curve,
        motion_player_id: u32,
        _looping: bool,
        _offset: f64,
        epoch: u64,
    ) {
        self.calls.push("play_spline");
        if !self.players.iter().any(|p| p.id == motion_player_id) {
            self.fail("play_spline", "unbekannter Motion-Player", epoch);
            return;
        }
        self.replies.push_back(BackendReply::PlayStarted {
            start_time: self.clock,
            epoch,
        });
    }

    fn stop_spline_playback(&mut self) {
        self.calls.push("stop_spline_playback");
    }

    fn enable_motors(&mut self) {
        self.calls.push("enable_motors");
    }

    fn disable_motors(&mut self) {
        self.calls.push("disable_motors");
    }

    fn fit_spline(&mut self, samples: &[TimedSample], epoch: u64) {
        self.calls.push("fit_spline");
        match Self::fit(samples) {
            Ok(curve) => self
                .replies
                .push_back(BackendReply::SplineFitted { curve, epoch }),
            Err(reason) => self.fail("fit_spline", reason, epoch),
        }
    }

    fn create_curve(&mut self, name: &str, _curve: &Curve) {
        self.calls.push("create_curve");
        if self.fail_saves {
            self.fail("create_curve", "Speichern abgelehnt (injizierter Fehler)", 0);
            return;
        }
        self.replies.push_back(BackendReply::CurveSaved {
            name: name.to_string(),
        });
    }

    fn update_curve(&mut self, name: &str, _curve: &Curve) {
        self.calls.push("update_curve");
        if self.fail_saves {
            self.fail("update_curve", "Speichern abgelehnt (injizierter Fehler)", 0);
            return;
        }
        self.replies.push_back(BackendReply::CurveSaved {
            name: name.to_string(),
        });
    }

    fn delete_curve(&mut self, _name: &str) {
        self.calls.push("delete_curve");
    }

    fn live_preview(&mut self, _value: f64, _motion_player_id: u32, _channel: usize) {
        self.calls.push("live_preview");
    }
}
