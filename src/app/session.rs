//! EditingSession: Orchestrierung von Workspace, Transport und Kollaborateuren.

use crate::app::events::{CurveSetMessage, SessionEvent, TelemetryFrame};
use crate::app::history::CurveHistory;
use crate::app::transport::{TimedSample, Transport, TransportState};
use crate::app::workspace::Workspace;
use crate::backend::{Backend, BackendReply, MotionPlayerInfo};
use crate::core::{BoundingBox, Curve};
use crate::error::EditorError;
use crate::render::Renderer;
use crate::shared::SessionOptions;

/// Phase des zweiphasigen Edit-Protokolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// Kein Edit aktiv
    Idle,
    /// `begin_change` ausgeführt, `commit_change` steht aus
    Editing,
}

/// Wert-Hinweis beim Edit-Beginn; wird bei aktiver Live-Vorschau an den
/// Aktuator weitergereicht.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionHint {
    /// Kanal innerhalb des gewählten Motion-Players
    pub channel: usize,
    /// Editierter Wert
    pub value: f64,
}

/// Orchestriert einen Arbeitsbereich von Kurven gegen Backend und Renderer.
///
/// Die Session läuft auf einem logischen Thread. Backend-Aufrufe sind fire
/// and forget; ihre Antworten pumpt der Host über
/// [`on_backend_reply`](Self::on_backend_reply) zurück. Jeder
/// Antwort-Handler prüft den aktuellen Transportzustand und die Epoche
/// erneut, bevor er Seiteneffekte anwendet, damit verspätete Antworten den
/// neueren Zustand nicht korrumpieren.
pub struct EditingSession<B: Backend, R: Renderer> {
    backend: B,
    renderer: R,
    options: SessionOptions,
    workspace: Workspace,
    transport: Transport,
    motion_players: Vec<MotionPlayerInfo>,
    selected_player: Option<u32>,
    /// Globale Wertausgangs-Indizes der Kanäle des gewählten Players
    channels: Vec<usize>,
    motion_limit: Option<BoundingBox>,
    active_curve: Option<String>,
    phase: EditPhase,
    viewport: BoundingBox,
    events: Vec<SessionEvent>,
}

impl<B: Backend, R: Renderer> EditingSession<B, R> {
    /// Erstellt eine Session mit injizierten Kollaborateuren.
    pub fn new(backend: B, renderer: R, options: SessionOptions) -> Self {
        let mut transport = Transport::new(options.playback_trace_capacity);
        transport.set_looping(options.default_looping);
        Self {
            backend,
            renderer,
            options,
            workspace: Workspace::new(),
            transport,
            motion_players: Vec::new(),
            selected_player: None,
            channels: Vec::new(),
            motion_limit: None,
            active_curve: None,
            phase: EditPhase::Idle,
            viewport: BoundingBox::new(0.0, 1.0, 0.0, 1.0),
            events: Vec::new(),
        }
    }

    /// Fordert die Motion-Player-Liste an und aktiviert auf Wunsch die
    /// Motoren.
    pub fn startup(&mut self) {
        log::info!("Session startet, fordere Motion-Player an");
        self.backend.get_motion_player_infos();
        if self.options.enable_motors_on_startup {
            self.backend.enable_motors();
        }
    }

    // ── Zugriffe ────────────────────────────────────────────────────────

    /// Aktueller Transport (read-only).
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Aktueller Arbeitsbereich (read-only).
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Laufzeit-Optionen.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Injiziertes Backend; der Host pumpt hierüber Antworten ab.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Phase des Edit-Protokolls.
    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// Bekannte Motion-Player.
    pub fn motion_players(&self) -> &[MotionPlayerInfo] {
        &self.motion_players
    }

    /// Id des gewählten Motion-Players.
    pub fn selected_player(&self) -> Option<u32> {
        self.selected_player
    }

    /// Globale Kanal-Indizes des gewählten Players.
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Aktives Bewegungslimit (Klemmband), falls ein Player gewählt ist.
    pub fn motion_limit(&self) -> Option<BoundingBox> {
        self.motion_limit
    }

    /// Sichtbarer Plot-Ausschnitt.
    pub fn viewport(&self) -> BoundingBox {
        self.viewport
    }

    /// Name der aktiven Kurve.
    pub fn active_curve_name(&self) -> Option<&str> {
        self.active_curve.as_deref()
    }

    /// Aktive Kurve (Snapshot unter dem History-Cursor).
    pub fn active_curve(&self) -> Result<&Curve, EditorError> {
        self.active_history()
            .ok_or(EditorError::NoCurveSelected)?
            .retrieve()
    }

    /// Undo möglich für die aktive Kurve?
    pub fn can_undo(&self) -> bool {
        self.active_history().is_some_and(CurveHistory::can_undo)
    }

    /// Redo möglich für die aktive Kurve?
    pub fn can_redo(&self) -> bool {
        self.active_history().is_some_and(CurveHistory::can_redo)
    }

    /// Ungesicherte Änderungen an der aktiven Kurve?
    pub fn can_save(&self) -> bool {
        self.active_history().is_some_and(CurveHistory::can_save)
    }

    /// Entnimmt alle aufgelaufenen Domänen-Events.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn active_history(&self) -> Option<&CurveHistory> {
        self.workspace.get(self.active_curve.as_deref()?)
    }

    // ── Kurvenverwaltung ────────────────────────────────────────────────

    /// Zeigt eine Kurve an: legt die History lazy an und erfasst den
    /// Snapshot als gesicherte Baseline. Die erste angezeigte Kurve wird
    /// automatisch aktiv.
    pub fn display_curve(&mut self, name: &str, curve: Curve) -> Result<(), EditorError> {
        curve.validate()?;
        let history = self.workspace.entry(name);
        history.capture(curve);
        history.mark_saved();
        self.events.push(SessionEvent::CurveChanged {
            name: name.to_string(),
        });
        if self.active_curve.is_none() {
            self.select_curve(name)?;
        } else if self.active_curve.as_deref() == Some(name) {
            self.refresh_active()?;
        }
        Ok(())
    }

    /// Macht `name` zur aktiven Kurve und richtet Transportdauer sowie
    /// Viewport daran aus.
    pub fn select_curve(&mut self, name: &str) -> Result<(), EditorError> {
        let (duration, bounds) = {
            let history = self.workspace.get(name).ok_or(EditorError::NoCurveSelected)?;
            let curve = history.retrieve()?;
            (curve.duration(), curve.hull_bounds())
        };
        self.active_curve = Some(name.to_string());
        self.transport.set_duration(duration);
        self.viewport = bounds;
        self.renderer.change_viewport(&bounds);
        self.redraw_active()
    }

    /// Legt eine neue, leere Kurve an (lokal und im Backend).
    pub fn create_curve(&mut self, name: &str, ndim: usize) -> Result<(), EditorError> {
        if ndim == 0 {
            return Err(EditorError::InvalidArgument(
                "Kurve benötigt mindestens eine Dimension",
            ));
        }
        let curve = Curve::zero(ndim);
        self.backend.create_curve(name, &curve);
        self.display_curve(name, curve)
    }

    /// Löscht eine Kurve im Backend. Die lokale History fällt erst mit dem
    /// nächsten Mengenabgleich, nie hier.
    pub fn delete_curve(&mut self, name: &str) {
        self.backend.delete_curve(name);
    }

    // ── Zweiphasiges Edit-Protokoll ─────────────────────────────────────

    /// Erste Phase des Edit-Protokolls.
    ///
    /// Pausiert ein laufendes Playback (best effort, nicht blockierend),
    /// verwirft transiente Vorschau-Überlagerungen und reicht den
    /// Wert-Hinweis bei aktiver Live-Vorschau an den Aktuator weiter. Ein
    /// erneuter Aufruf während einer offenen Edit-Phase pausiert und
    /// previewt einfach erneut; Edits werden nicht gequeued.
    pub fn begin_change(&mut self, hint: Option<PositionHint>) {
        if self.transport.state() != TransportState::Paused {
            self.transport.pause();
            self.backend.stop_spline_playback();
            self.events.push(SessionEvent::TransportChanged {
                state: TransportState::Paused,
            });
        }
        self.renderer.clear();
        if let (Some(hint), Some(player)) = (hint, self.selected_player) {
            if self.options.live_preview {
                self.backend.live_preview(hint.value, player, hint.channel);
            }
        }
        self.phase = EditPhase::Editing;
    }

    /// Zweite Phase: erfasst die Kandidatenkurve in der aktiven History.
    ///
    /// Nur aus der Edit-Phase heraus zulässig. Die Kurve wird vor jeder
    /// Zustandsänderung validiert und gegen das Bewegungslimit des gewählten
    /// Players geklemmt. Die Persistenz läuft asynchron; ein Fehlschlag
    /// rollt die lokale History nicht zurück, der lokale Snapshot bleibt bis
    /// zum nächsten Mengenabgleich autoritativ.
    pub fn commit_change(&mut self, candidate: Curve) -> Result<(), EditorError> {
        if self.phase != EditPhase::Editing {
            return Err(EditorError::NotEditing);
        }
        let name = self.active_curve.clone().ok_or(EditorError::NoCurveSelected)?;
        candidate.validate()?;
        self.phase = EditPhase::Idle;
        self.capture_into_active(&name, candidate)
    }

    /// Bewegt den History-Cursor zurück und persistiert den nun aktuellen
    /// Snapshot, damit das Backend gegen den angezeigten Stand konvergiert.
    pub fn undo_edit(&mut self) -> Result<(), EditorError> {
        self.step_history(true)
    }

    /// Gegenstück zu [`undo_edit`](Self::undo_edit).
    pub fn redo_edit(&mut self) -> Result<(), EditorError> {
        self.step_history(false)
    }

    fn step_history(&mut self, back: bool) -> Result<(), EditorError> {
        let name = self.active_curve.clone().ok_or(EditorError::NoCurveSelected)?;
        let history = self
            .workspace
            .get_mut(&name)
            .ok_or(EditorError::NoCurveSelected)?;
        if back {
            if !history.can_undo() {
                return Ok(());
            }
            history.undo();
        } else {
            if !history.can_redo() {
                return Ok(());
            }
            history.redo();
        }
        let current = history.retrieve()?.clone();
        self.transport.set_duration(current.duration());
        self.backend.update_curve(&name, &current);
        self.events.push(SessionEvent::CurveChanged { name });
        self.redraw_active()
    }

    /// Klemmt, erfasst und persistiert `curve` als neuen Snapshot von `name`.
    fn capture_into_active(&mut self, name: &str, curve: Curve) -> Result<(), EditorError> {
        curve.validate()?;
        let committed = match &self.motion_limit {
            Some(limit) => curve.clipped(limit),
            None => curve,
        };
        self.transport.set_duration(committed.duration());
        self.workspace.entry(name).capture(committed.clone());
        self.backend.update_curve(name, &committed);
        self.events.push(SessionEvent::CurveChanged {
            name: name.to_string(),
        });
        self.redraw_active()
    }

    // ── Playback und Aufnahme ───────────────────────────────────────────

    /// Startet das Playback der aktiven Kurve auf dem gewählten
    /// Motion-Player.
    ///
    /// Nur aus Paused; der Transport wechselt erst mit der Backend-Antwort
    /// (`PlayStarted`) nach Playing. Der Zustand selbst ist der Schutz
    /// gegen doppelte Anfragen.
    pub fn play(&mut self) -> Result<(), EditorError> {
        if self.transport.state() != TransportState::Paused {
            log::warn!("play() im Zustand {:?} ignoriert", self.transport.state());
            return Ok(());
        }
        let player = self.selected_player.ok_or(EditorError::NoPlayerSelected)?;
        let curve = self.active_curve()?.clone();
        self.backend.play_spline(
            &curve,
            player,
            self.transport.looping(),
            self.transport.position(),
            self.transport.epoch(),
        );
        Ok(())
    }

    /// Pausiert das Playback; die Position bleibt stehen.
    pub fn pause(&mut self) {
        let was = self.transport.state();
        self.transport.pause();
        self.backend.stop_spline_playback();
        if was != TransportState::Paused {
            self.events.push(SessionEvent::TransportChanged {
                state: TransportState::Paused,
            });
        }
    }

    /// Stoppt das Playback und setzt die Position auf 0 zurück.
    pub fn stop(&mut self) {
        let was = self.transport.state();
        self.transport.stop();
        self.backend.stop_spline_playback();
        self.renderer.draw_cursor(0.0);
        if was != TransportState::Paused {
            self.events.push(SessionEvent::TransportChanged {
                state: TransportState::Paused,
            });
        }
    }

    /// Startet eine Aufnahme (nur aus Paused); der Aufnahmepuffer wird
    /// geleert.
    pub fn record(&mut self) -> Result<(), EditorError> {
        if self.transport.state() != TransportState::Paused {
            log::warn!("record() im Zustand {:?} ignoriert", self.transport.state());
            return Ok(());
        }
        if self.active_curve.is_none() {
            return Err(EditorError::NoCurveSelected);
        }
        if self.selected_player.is_none() {
            return Err(EditorError::NoPlayerSelected);
        }
        self.transport.record();
        self.events.push(SessionEvent::TransportChanged {
            state: TransportState::Recording,
        });
        Ok(())
    }

    /// Beendet die Aufnahme.
    ///
    /// Ein nicht leerer Puffer geht als Fit-Anfrage an das Backend; die
    /// gefittete Kurve landet bei Erfolg in der aktiven History. Der Puffer
    /// ist danach in jedem Fall leer, auch wenn der Fit fehlschlägt.
    pub fn finish_record(&mut self) {
        if self.transport.state() != TransportState::Recording {
            return;
        }
        let samples = self.transport.finish_record();
        self.events.push(SessionEvent::TransportChanged {
            state: TransportState::Paused,
        });
        if samples.is_empty() {
            log::info!("Aufnahme ohne Messzeilen beendet, kein Fit angefordert");
            return;
        }
        log::info!(
            "Aufnahme beendet, {} Messzeilen zum Fit ans Backend",
            samples.len()
        );
        self.backend.fit_spline(&samples, self.transport.epoch());
    }

    /// Schaltet das Looping um; wirkt ab dem nächsten Telemetrie-Frame.
    pub fn set_looping(&mut self, looping: bool) {
        self.transport.set_looping(looping);
    }

    // ── Eingehende Nachrichten ──────────────────────────────────────────

    /// Verarbeitet einen eingehenden Telemetrie-Frame.
    ///
    /// Synchron und in strikter Ankunftsreihenfolge aufzurufen; überlappende
    /// Zustellung muss der Host vorher serialisieren. Im Zustand Paused wird
    /// der Frame ignoriert, damit die Position nicht kriecht.
    pub fn on_telemetry(&mut self, frame: &TelemetryFrame) -> Result<(), EditorError> {
        let state = self.transport.state();
        if state == TransportState::Paused {
            return Ok(());
        }
        let raw = self.transport.advance(frame.timestamp)?;
        if self.transport.state() == TransportState::Paused {
            // Der Transport hat das natürliche Ende selbst erkannt
            self.renderer.draw_cursor(0.0);
            self.events.push(SessionEvent::TransportChanged {
                state: TransportState::Paused,
            });
            return Ok(());
        }
        // Zweite Überlaufprüfung am rohen Rückgabewert; greift nur, falls
        // der Transport den Überlauf nicht selbst behandelt hat
        if state == TransportState::Playing
            && !self.transport.looping()
            && raw > self.transport.duration()
        {
            self.transport.stop();
            self.renderer.draw_cursor(0.0);
            self.events.push(SessionEvent::TransportChanged {
                state: TransportState::Paused,
            });
            return Ok(());
        }

        let position = self.transport.position();
        self.renderer.draw_cursor(position);
        let row: Vec<f64> = self
            .channels
            .iter()
            .map(|&channel| frame.values.get(channel).copied().unwrap_or(0.0))
            .collect();
        for (index, value) in row.iter().enumerate() {
            self.renderer.plot_value(position, *value, index);
        }
        self.transport.push_sample(TimedSample {
            timestamp: position,
            values: row,
        });
        Ok(())
    }

    /// Verarbeitet die autoritative Kurvenliste des Backends.
    ///
    /// Vollständiger Mengenabgleich: lokale Einträge ohne Gegenstück werden
    /// samt History entfernt, unbekannte Namen werden neu angezeigt. Lokal
    /// bereits bekannte Kurven bleiben bis zu ihrer Eviction autoritativ.
    pub fn on_curve_set_message(&mut self, message: &CurveSetMessage) {
        let names: Vec<&str> = message.curves.iter().map(|(name, _)| name.as_str()).collect();
        let evicted = self.workspace.reconcile(&names);
        for name in evicted {
            if self.active_curve.as_deref() == Some(name.as_str()) {
                self.active_curve = None;
                self.transport.stop();
                self.transport.set_duration(0.0);
                self.renderer.clear();
            }
            self.events.push(SessionEvent::CurveChanged { name });
        }
        for (name, curve) in &message.curves {
            if !self.workspace.contains(name) {
                if let Err(e) = self.display_curve(name, curve.clone()) {
                    log::warn!("Kurve '{name}' aus Backend-Liste verworfen: {e}");
                }
            }
        }
    }

    /// Stellt eine asynchrone Backend-Antwort zu.
    ///
    /// Jeder Zweig prüft den aktuellen Transportzustand und die Epoche,
    /// bevor er Seiteneffekte anwendet; verspätete Antworten werden mit
    /// Debug-Log verworfen statt den neueren Zustand zu korrumpieren.
    pub fn on_backend_reply(&mut self, reply: BackendReply) {
        match reply {
            BackendReply::MotionPlayerInfos { infos } => self.apply_motion_players(infos),
            BackendReply::ValueOutputIndices { motor_id, indices } => {
                self.apply_output_indices(motor_id, indices)
            }
            BackendReply::PlayStarted { start_time, epoch } => {
                self.apply_play_started(start_time, epoch)
            }
            BackendReply::SplineFitted { curve, epoch } => self.apply_fitted(curve, epoch),
            BackendReply::CurveSaved { name } => {
                if let Some(history) = self.workspace.get_mut(&name) {
                    history.mark_saved();
                    log::debug!("Kurve '{name}' vom Backend bestätigt");
                }
            }
            BackendReply::RequestFailed { call, reason, .. } => {
                let error = EditorError::BackendRequest { call, reason };
                log::warn!("{error}");
                self.events.push(SessionEvent::Notification {
                    message: error.to_string(),
                });
            }
        }
    }

    // ── Motion-Player und Motoren ───────────────────────────────────────

    /// Wählt den Motion-Player und fordert dessen Kanal-Indizes an.
    ///
    /// Das Bewegungslimit ergibt sich aus dem kleinsten Verfahrweg der
    /// beteiligten Motoren.
    pub fn select_motion_player(&mut self, id: u32) -> Result<(), EditorError> {
        let player = self
            .motion_players
            .iter()
            .find(|p| p.id == id)
            .ok_or(EditorError::InvalidArgument("unbekannte Motion-Player-Id"))?
            .clone();
        self.selected_player = Some(id);
        self.channels.clear();
        let min_length = player
            .motors
            .iter()
            .map(|m| m.length)
            .fold(f64::INFINITY, f64::min);
        self.motion_limit = min_length
            .is_finite()
            .then(|| BoundingBox::motion_limit(min_length));
        for motor in &player.motors {
            self.backend.get_index_of_value_outputs(motor.id);
        }
        log::info!("Motion-Player {} ('{}') gewählt", id, player.name);
        Ok(())
    }

    /// Aktiviert alle Motoren.
    pub fn enable_motors(&mut self) {
        self.backend.enable_motors();
    }

    /// Deaktiviert alle Motoren.
    pub fn disable_motors(&mut self) {
        self.backend.disable_motors();
    }

    // ── Viewport ────────────────────────────────────────────────────────

    /// Zoomt den sichtbaren Ausschnitt um seinen horizontalen Mittelpunkt.
    pub fn zoom_view(&mut self, factor: f64) -> Result<(), EditorError> {
        self.viewport = self.viewport.zoomed(factor)?;
        self.renderer.change_viewport(&self.viewport);
        Ok(())
    }

    // ── Interne Antwort-Handler ─────────────────────────────────────────

    fn apply_motion_players(&mut self, infos: Vec<MotionPlayerInfo>) {
        log::info!("{} Motion-Player empfangen", infos.len());
        self.motion_players = infos;
        if let Some(selected) = self.selected_player {
            if !self.motion_players.iter().any(|p| p.id == selected) {
                log::warn!("Gewählter Motion-Player {selected} nicht mehr vorhanden");
                self.selected_player = None;
                self.channels.clear();
                self.motion_limit = None;
            }
        }
        if self.selected_player.is_none() {
            if let Some(id) = self.motion_players.first().map(|p| p.id) {
                if let Err(e) = self.select_motion_player(id) {
                    log::warn!("Automatische Player-Wahl fehlgeschlagen: {e}");
                }
            }
        }
    }

    fn apply_output_indices(&mut self, motor_id: u32, indices: Vec<usize>) {
        let owns = self
            .selected_player
            .and_then(|id| self.motion_players.iter().find(|p| p.id == id))
            .is_some_and(|p| p.motors.iter().any(|m| m.id == motor_id));
        if !owns {
            log::debug!("Kanal-Indizes für fremden Motor {motor_id} verworfen");
            return;
        }
        for index in indices {
            if !self.channels.contains(&index) {
                self.channels.push(index);
            }
        }
    }

    fn apply_play_started(&mut self, start_time: f64, epoch: u64) {
        if epoch != self.transport.epoch() || self.transport.state() != TransportState::Paused {
            log::debug!("Verspätete PlayStarted-Antwort (Epoche {epoch}) verworfen");
            return;
        }
        // Anker so setzen, dass der erste Frame den Wiedereinstiegs-Offset
        // ergibt: position = timestamp - (Server-Start - aktuelle Position)
        self.transport.play(start_time - self.transport.position());
        self.events.push(SessionEvent::TransportChanged {
            state: TransportState::Playing,
        });
    }

    fn apply_fitted(&mut self, curve: Curve, epoch: u64) {
        if epoch != self.transport.epoch() || self.transport.state() != TransportState::Paused {
            log::debug!("Verspätete Fit-Antwort (Epoche {epoch}) verworfen");
            return;
        }
        let Some(name) = self.active_curve.clone() else {
            log::warn!("Fit-Antwort ohne aktive Kurve verworfen");
            return;
        };
        if let Err(e) = self.capture_into_active(&name, curve) {
            log::warn!("Gefittete Kurve verworfen: {e}");
            self.events.push(SessionEvent::Notification {
                message: format!("Fit verworfen: {e}"),
            });
        }
    }

    // ── Zeichnen ────────────────────────────────────────────────────────

    /// Zeichnet die aktive Kurve neu: Abtastpunkte pro Dimension plus
    /// Cursor an der aktuellen Position.
    fn redraw_active(&mut self) -> Result<(), EditorError> {
        let Some(name) = self.active_curve.as_deref() else {
            return Ok(());
        };
        let Some(history) = self.workspace.get(name) else {
            return Ok(());
        };
        let curve = history.retrieve()?;
        self.renderer.clear();
        let samples = self.options.curve_render_samples.max(2);
        let span = curve.duration() - curve.start();
        for dim in 0..curve.ndim() {
            for i in 0..=samples {
                let t = curve.start() + span * i as f64 / samples as f64;
                self.renderer.plot_value(t, curve.sample(t, dim), dim);
            }
        }
        self.renderer.draw_cursor(self.transport.position());
        Ok(())
    }

    fn refresh_active(&mut self) -> Result<(), EditorError> {
        let duration = {
            let history = self
                .active_history()
                .ok_or(EditorError::NoCurveSelected)?;
            history.retrieve()?.duration()
        };
        self.transport.set_duration(duration);
        self.redraw_active()
    }
}
