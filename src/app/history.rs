//! Undo/Redo-History einer einzelnen Kurve.

use crate::core::Curve;
use crate::error::EditorError;

/// Cursor-basierter Snapshot-Stapel einer Kurve.
///
/// Invarianten: sobald nicht leer, gilt `0 <= cursor < len`;
/// `can_undo ⇔ cursor > 0`; `can_redo ⇔ cursor < len - 1`;
/// `can_save ⇔ cursor != Baseline-Index`. `capture` fügt unmittelbar nach
/// dem Cursor ein und verwirft einen vorhandenen Redo-Schwanz.
///
/// Die Tiefe ist unbegrenzt: ein Ringpuffer würde den Baseline-Index
/// verschieben und die Save-Invariante brechen.
#[derive(Debug, Clone, Default)]
pub struct CurveHistory {
    snapshots: Vec<Curve>,
    cursor: usize,
    baseline: Option<usize>,
}

impl CurveHistory {
    /// Erstellt eine leere History.
    pub fn new() -> Self {
        Self::default()
    }

    /// Erfasst einen neuen Snapshot unmittelbar hinter dem Cursor.
    ///
    /// Ein vorhandener Redo-Schwanz wird verworfen; lag die Baseline im
    /// verworfenen Bereich, gilt die History anschließend als ungesichert.
    pub fn capture(&mut self, curve: Curve) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        if let Some(baseline) = self.baseline {
            if baseline >= self.snapshots.len() {
                self.baseline = None;
            }
        }
        self.snapshots.push(curve);
        self.cursor = self.snapshots.len() - 1;
    }

    /// Liefert den Snapshot unter dem Cursor.
    pub fn retrieve(&self) -> Result<&Curve, EditorError> {
        self.snapshots.get(self.cursor).ok_or(EditorError::EmptyHistory)
    }

    /// Bewegt den Cursor einen Schritt zurück.
    /// No-op wenn nicht möglich; Aufrufer prüfen `can_undo` vorab.
    pub fn undo(&mut self) {
        if self.can_undo() {
            self.cursor -= 1;
        }
    }

    /// Bewegt den Cursor einen Schritt vor.
    /// No-op wenn nicht möglich; Aufrufer prüfen `can_redo` vorab.
    pub fn redo(&mut self) {
        if self.can_redo() {
            self.cursor += 1;
        }
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor < self.snapshots.len() - 1
    }

    /// Ungesicherte Änderungen vorhanden (Cursor steht nicht auf der Baseline).
    pub fn can_save(&self) -> bool {
        !self.snapshots.is_empty() && self.baseline != Some(self.cursor)
    }

    /// Markiert den Snapshot unter dem Cursor als gesicherte Baseline.
    pub fn mark_saved(&mut self) {
        if !self.snapshots.is_empty() {
            self.baseline = Some(self.cursor);
        }
    }

    /// Anzahl erfasster Snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// `true`, wenn noch nie ein Snapshot erfasst wurde.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
