//! Render-Kollaborateur: Zeichenvertrag und Headless-Implementierung.

use crate::core::BoundingBox;

/// Zeichenvertrag, den die Engine aufruft, aber nicht implementiert.
///
/// Wird bei der Session-Konstruktion injiziert; eine Präsentationsschicht
/// setzt die Aufrufe in SVG/Canvas/GPU um.
pub trait Renderer {
    /// Zeichnet den Zeit-Cursor an Position `x`.
    fn draw_cursor(&mut self, x: f64);

    /// Entfernt alle gezeichneten Punkte und transienten Überlagerungen.
    fn clear(&mut self);

    /// Trägt einen Wert in den Plot ein; `index` ist die Kanalnummer.
    fn plot_value(&mut self, t: f64, value: f64, index: usize);

    /// Stellt den sichtbaren Ausschnitt um.
    fn change_viewport(&mut self, bbox: &BoundingBox);
}

/// No-op-Renderer für Headless-Betrieb (Demo-Binary, Tests).
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_cursor(&mut self, _x: f64) {}

    fn clear(&mut self) {}

    fn plot_value(&mut self, _t: f64, _value: f64, _index: usize) {}

    fn change_viewport(&mut self, _bbox: &BoundingBox) {}
}
