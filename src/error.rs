//! Fehlertypen der Session-Engine.

use thiserror::Error;

/// Alle Fehler, die die Session-Engine an Aufrufer meldet.
///
/// Vorbedingungsverletzungen (`EmptyHistory`, `NoCurveSelected`,
/// `NoPlayerSelected`, `NotEditing`) brechen den jeweiligen Aufruf ab und
/// werden sofort gemeldet. `InvalidArgument` weist degenerierte Eingaben ab,
/// bevor irgendein Zustand verändert wurde. `BackendRequest` wird lokal
/// behandelt: Benachrichtigung an den Benutzer, kein Retry, kein Rollback
/// bereits erfasster Snapshots.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// Zugriff auf eine History, in der noch nie ein Snapshot erfasst wurde
    #[error("History ist leer, noch kein Snapshot erfasst")]
    EmptyHistory,

    /// Operation benötigt eine aktive Kurve
    #[error("keine aktive Kurve ausgewählt")]
    NoCurveSelected,

    /// Operation benötigt einen gewählten Motion-Player
    #[error("kein Motion-Player ausgewählt")]
    NoPlayerSelected,

    /// `commit_change` ohne vorheriges `begin_change`
    #[error("kein Edit aktiv, commit_change erfordert begin_change")]
    NotEditing,

    /// Degenerierte Eingabe (Faktor 0, fehlerhafte Kurvengeometrie)
    #[error("ungültiges Argument: {0}")]
    InvalidArgument(&'static str),

    /// Backend-Aufruf fehlgeschlagen (Transport oder Nicht-Erfolgs-Antwort)
    #[error("Backend-Anfrage '{call}' fehlgeschlagen: {reason}")]
    BackendRequest {
        /// Name des Backend-Aufrufs
        call: &'static str,
        /// Fehlerbeschreibung des Backends
        reason: String,
    },
}
