//! Begrenzungsrahmen über der Zeit/Wert-Ebene.

use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Achsenparalleler Rahmen über der Zeit/Wert-Ebene.
///
/// Dient sowohl als sichtbarer Plot-Ausschnitt (Viewport) als auch als
/// Bewegungslimit beim Erfassen einer Kurve (Klemmband des Aktuators).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Linke Grenze (Zeitachse)
    pub left: f64,
    /// Rechte Grenze (Zeitachse)
    pub right: f64,
    /// Untere Grenze (Werteachse)
    pub bottom: f64,
    /// Obere Grenze (Werteachse)
    pub top: f64,
}

impl BoundingBox {
    /// Erstellt einen Rahmen aus den vier Grenzen.
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Bewegungslimit eines Aktuators mit Verfahrweg `length`.
    ///
    /// Werte werden in `[0, length]` geklemmt, die Zeitachse bleibt offen.
    pub fn motion_limit(length: f64) -> Self {
        Self {
            left: 0.0,
            right: f64::INFINITY,
            bottom: 0.0,
            top: length,
        }
    }

    /// Horizontale Spannweite.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Vertikale Spannweite.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Horizontaler Mittelpunkt.
    pub fn center_x(&self) -> f64 {
        0.5 * (self.left + self.right)
    }

    /// Zoomt den horizontalen Ausschnitt um den eigenen Mittelpunkt.
    ///
    /// `factor > 1` zoomt hinein (schmalere Spanne), die vertikalen Grenzen
    /// bleiben unverändert. Kanonische, wertliefernde Form.
    pub fn zoomed(&self, factor: f64) -> Result<Self, EditorError> {
        if factor == 0.0 {
            return Err(EditorError::InvalidArgument(
                "Zoom-Faktor 0 ergibt eine degenerierte Spanne",
            ));
        }
        let mid = self.center_x();
        let half = 0.5 * self.width() / factor;
        Ok(Self {
            left: mid - half,
            right: mid + half,
            bottom: self.bottom,
            top: self.top,
        })
    }

    /// In-place-Variante von [`zoomed`](Self::zoomed) für einen
    /// aufrufer-eigenen Scratch-Puffer. Niemals auf einen geteilten Rahmen
    /// anwenden. Das Ergebnis ist numerisch identisch zur reinen Form.
    pub fn zoom_in_place(&mut self, factor: f64) -> Result<(), EditorError> {
        *self = self.zoomed(factor)?;
        Ok(())
    }
}

/// Klemmt `value` in das geschlossene Intervall [`lower`, `upper`].
/// Vertauschte Grenzen werden akzeptiert.
pub fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    let (lo, hi) = if lower > upper {
        (upper, lower)
    } else {
        (lower, upper)
    };
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zoom_with_factor_one_is_identity() {
        let bbox = BoundingBox::new(1.0, 5.0, -2.0, 2.0);
        let zoomed = bbox.zoomed(1.0).expect("Faktor 1 ist gültig");
        assert_relative_eq!(zoomed.left, bbox.left);
        assert_relative_eq!(zoomed.right, bbox.right);
        assert_relative_eq!(zoomed.bottom, bbox.bottom);
        assert_relative_eq!(zoomed.top, bbox.top);
    }

    #[test]
    fn zoom_in_halves_horizontal_span_around_midpoint() {
        let bbox = BoundingBox::new(0.0, 4.0, 0.0, 1.0);
        let zoomed = bbox.zoomed(2.0).expect("Faktor 2 ist gültig");
        assert_relative_eq!(zoomed.left, 1.0);
        assert_relative_eq!(zoomed.right, 3.0);
        // Vertikale Grenzen unangetastet
        assert_relative_eq!(zoomed.bottom, 0.0);
        assert_relative_eq!(zoomed.top, 1.0);
    }

    #[test]
    fn zoom_in_place_matches_pure_form() {
        let bbox = BoundingBox::new(-3.0, 7.0, 0.5, 1.5);
        let pure = bbox.zoomed(1.7).expect("gültiger Faktor");
        let mut scratch = bbox;
        scratch.zoom_in_place(1.7).expect("gültiger Faktor");
        assert_relative_eq!(scratch.left, pure.left);
        assert_relative_eq!(scratch.right, pure.right);
        assert_relative_eq!(scratch.bottom, pure.bottom);
        assert_relative_eq!(scratch.top, pure.top);
    }

    #[test]
    fn zoom_with_factor_zero_is_rejected() {
        let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        assert!(bbox.zoomed(0.0).is_err());
        let mut scratch = bbox;
        assert!(scratch.zoom_in_place(0.0).is_err());
        // Scratch-Puffer bleibt bei Fehler unverändert
        assert_relative_eq!(scratch.left, bbox.left);
        assert_relative_eq!(scratch.right, bbox.right);
    }

    #[test]
    fn clip_clamps_into_interval() {
        assert_relative_eq!(clip(0.5, 0.0, 1.0), 0.5);
        assert_relative_eq!(clip(-1.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(clip(2.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn clip_accepts_swapped_bounds() {
        assert_relative_eq!(clip(2.0, 1.0, 0.0), 1.0);
        assert_relative_eq!(clip(-2.0, 1.0, 0.0), 0.0);
    }

    #[test]
    fn motion_limit_spans_actuator_travel() {
        let limit = BoundingBox::motion_limit(0.1);
        assert_relative_eq!(limit.bottom, 0.0);
        assert_relative_eq!(limit.top, 0.1);
        assert!(limit.right.is_infinite());
    }
}
