//! Reine Kurventransformationen: Skalieren, Strecken, Verschieben.
//!
//! Alle Funktionen sind frei von Seiteneffekten und liefern eine neue Kurve;
//! die Eingabekurve bleibt unangetastet.

use crate::core::curve::Curve;
use crate::error::EditorError;

/// Multipliziert jeden Koeffizienten mit `factor`; der Knotenvektor bleibt
/// unverändert. `factor == 0` wird abgewiesen (degenerierte Kurve).
pub fn scale(curve: &Curve, factor: f64) -> Result<Curve, EditorError> {
    if factor == 0.0 {
        return Err(EditorError::InvalidArgument(
            "Skalierungsfaktor 0 erzeugt eine degenerierte Kurve",
        ));
    }
    Curve::new(
        curve.knots().to_vec(),
        curve.coefficients().iter().map(|c| c * factor).collect(),
        curve.order(),
        curve.ndim(),
    )
}

/// Multipliziert jeden Knoten mit `factor`; die Koeffizienten bleiben
/// unverändert, die Dauer skaliert mit. `factor == 0` wird abgewiesen,
/// negative Faktoren ebenfalls (sie würden die Knotenordnung umkehren).
pub fn stretch(curve: &Curve, factor: f64) -> Result<Curve, EditorError> {
    if factor == 0.0 {
        return Err(EditorError::InvalidArgument(
            "Streckfaktor 0 erzeugt eine degenerierte Kurve",
        ));
    }
    if factor < 0.0 {
        return Err(EditorError::InvalidArgument(
            "negativer Streckfaktor kehrt die Knotenordnung um",
        ));
    }
    Curve::new(
        curve.knots().iter().map(|k| k * factor).collect(),
        curve.coefficients().to_vec(),
        curve.order(),
        curve.ndim(),
    )
}

/// Verschiebt alle Knoten um `offset`, geklemmt, sodass der erste Knoten nie
/// unter Null fällt: effektiver Offset = `max(offset, -erster Knoten)`.
/// `offset = -∞` ist das Idiom für "Start auf Null schnappen".
pub fn shift(curve: &Curve, offset: f64) -> Result<Curve, EditorError> {
    let effective = offset.max(-curve.start());
    Curve::new(
        curve.knots().iter().map(|k| k + effective).collect(),
        curve.coefficients().to_vec(),
        curve.order(),
        curve.ndim(),
    )
}
