//! Arbeitsbereich: Zuordnung Kurvenname → History.

use indexmap::IndexMap;

use crate::app::history::CurveHistory;

/// Alle lokal bekannten Kurven mit ihren Undo/Redo-Histories.
///
/// Einträge entstehen lazy beim ersten Anzeigen einer Kurve und werden
/// ausschließlich über den Mengenabgleich mit dem Backend entfernt, nie
/// implizit (kein LRU). Die Einfügereihenfolge bleibt deterministisch
/// erhalten.
#[derive(Default)]
pub struct Workspace {
    histories: IndexMap<String, CurveHistory>,
}

impl Workspace {
    /// Erstellt einen leeren Arbeitsbereich.
    pub fn new() -> Self {
        Self::default()
    }

    /// History zu `name`; legt bei Bedarf eine leere an.
    pub fn entry(&mut self, name: &str) -> &mut CurveHistory {
        self.histories
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Workspace: neue History für '{name}'");
                CurveHistory::new()
            })
    }

    /// History zu `name`, falls vorhanden.
    pub fn get(&self, name: &str) -> Option<&CurveHistory> {
        self.histories.get(name)
    }

    /// Veränderliche History zu `name`, falls vorhanden.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut CurveHistory> {
        self.histories.get_mut(name)
    }

    /// Prüft ob `name` lokal bekannt ist.
    pub fn contains(&self, name: &str) -> bool {
        self.histories.contains_key(name)
    }

    /// Alle bekannten Kurvennamen in Einfügereihenfolge.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histories.keys().map(String::as_str)
    }

    /// Anzahl der Einträge.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// `true`, wenn keine Kurve bekannt ist.
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Vollständiger Mengenabgleich mit der autoritativen Namensliste des
    /// Backends. Jeder Eintrag, dessen Name in der Liste fehlt, wird samt
    /// History entfernt. Liefert die entfernten Namen.
    ///
    /// Bewusst als Voll-Abgleich statt inkrementellem Add/Remove, damit der
    /// Arbeitsbereich nicht dauerhaft vom Backend-Zustand abweichen kann.
    pub fn reconcile(&mut self, authoritative: &[&str]) -> Vec<String> {
        let evicted: Vec<String> = self
            .histories
            .keys()
            .filter(|name| !authoritative.contains(&name.as_str()))
            .cloned()
            .collect();
        for name in &evicted {
            self.histories.shift_remove(name);
            log::info!("Workspace: '{name}' nicht mehr im Backend, History verworfen");
        }
        evicted
    }
}
