//! Stückweise polynomiale Bewegungskurve in Bernstein-Basis.

use serde::{Deserialize, Serialize};

use crate::core::bbox::{clip, BoundingBox};
use crate::error::EditorError;

/// Stückweise polynomiale Kurve über der Zeit.
///
/// Knotenvektor (streng monoton steigend, Länge = Segmente + 1) plus
/// Koeffiziententensor der Form `(order, segments, ndim)`, flach abgelegt.
/// Die Koeffizienten sind Bernstein-Kontrollpunkte des jeweiligen Segments.
/// Einmal erfasste Kurven sind unveränderlich; Transformationen liefern
/// stets eine neue Kurve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
    order: usize,
    ndim: usize,
}

impl Curve {
    /// Erstellt eine validierte Kurve.
    pub fn new(
        knots: Vec<f64>,
        coefficients: Vec<f64>,
        order: usize,
        ndim: usize,
    ) -> Result<Self, EditorError> {
        let curve = Self {
            knots,
            coefficients,
            order,
            ndim,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Kubische Null-Kurve über `[0, 1]` mit `ndim` Dimensionen.
    /// Ausgangsform jeder neu angelegten Kurve.
    pub fn zero(ndim: usize) -> Self {
        Self {
            knots: vec![0.0, 1.0],
            coefficients: vec![0.0; 4 * ndim],
            order: 4,
            ndim,
        }
    }

    /// Prüft die Geometrie-Invarianten.
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.ndim == 0 {
            return Err(EditorError::InvalidArgument(
                "Kurve benötigt mindestens eine Dimension",
            ));
        }
        if self.order == 0 {
            return Err(EditorError::InvalidArgument(
                "Polynomordnung muss mindestens 1 sein",
            ));
        }
        if self.knots.len() < 2 {
            return Err(EditorError::InvalidArgument(
                "Knotenvektor benötigt mindestens zwei Knoten",
            ));
        }
        if self.knots.iter().any(|k| !k.is_finite()) {
            return Err(EditorError::InvalidArgument("Knoten müssen endlich sein"));
        }
        if self.knots.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EditorError::InvalidArgument(
                "Knoten müssen streng monoton steigen",
            ));
        }
        if self.coefficients.len() != self.order * self.segments() * self.ndim {
            return Err(EditorError::InvalidArgument(
                "Koeffiziententensor passt nicht zu order * segments * ndim",
            ));
        }
        Ok(())
    }

    /// Anzahl der Segmente (Knoten - 1).
    pub fn segments(&self) -> usize {
        self.knots.len() - 1
    }

    /// Anzahl der Dimensionen.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Polynomordnung (Kontrollpunkte pro Segment).
    pub fn order(&self) -> usize {
        self.order
    }

    /// Erster Knoten (Startzeit).
    pub fn start(&self) -> f64 {
        self.knots[0]
    }

    /// Letzter Knoten (Dauer der Kurve).
    pub fn duration(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Knotenvektor.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Flacher Koeffiziententensor in `(order, segments, ndim)`-Reihenfolge.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn coefficient(&self, k: usize, segment: usize, dim: usize) -> f64 {
        self.coefficients[(k * self.segments() + segment) * self.ndim + dim]
    }

    /// Wertet Dimension `dim` an der Zeit `t` aus (de Casteljau).
    ///
    /// `t` wird in `[start, duration]` geklemmt; das passende Segment wird
    /// über den Knotenvektor gesucht.
    pub fn sample(&self, t: f64, dim: usize) -> f64 {
        let t = clip(t, self.start(), self.duration());
        let segment = self
            .knots
            .partition_point(|k| *k <= t)
            .saturating_sub(1)
            .min(self.segments() - 1);
        let span = self.knots[segment + 1] - self.knots[segment];
        let u = (t - self.knots[segment]) / span;

        let mut points: Vec<f64> = (0..self.order)
            .map(|k| self.coefficient(k, segment, dim))
            .collect();
        for r in 1..self.order {
            for i in 0..self.order - r {
                points[i] = (1.0 - u) * points[i] + u * points[i + 1];
            }
        }
        points[0]
    }

    /// Klemmt alle Kontrollpunkte in das vertikale Band des Limits.
    ///
    /// Die Konvexe-Hülle-Eigenschaft der Bernstein-Basis garantiert, dass die
    /// resultierende Kurve vollständig im Band `[bottom, top]` verläuft.
    /// Der Knotenvektor bleibt unverändert.
    pub fn clipped(&self, limit: &BoundingBox) -> Self {
        Self {
            knots: self.knots.clone(),
            coefficients: self
                .coefficients
                .iter()
                .map(|c| clip(*c, limit.bottom, limit.top))
                .collect(),
            order: self.order,
            ndim: self.ndim,
        }
    }

    /// Umschließender Rahmen: Zeitspanne mal Kontrollpunkt-Hülle.
    ///
    /// Die Kontrollpunkt-Extrema überdecken die Kurve (konvexe Hülle);
    /// geeignet als Viewport beim Anzeigen.
    pub fn hull_bounds(&self) -> BoundingBox {
        let mut bottom = f64::INFINITY;
        let mut top = f64::NEG_INFINITY;
        for c in &self.coefficients {
            bottom = bottom.min(*c);
            top = top.max(*c);
        }
        BoundingBox::new(self.start(), self.duration(), bottom, top)
    }
}
