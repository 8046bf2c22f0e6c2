//! Geteilte Infrastruktur: Laufzeit-Optionen.

pub mod options;

pub use options::SessionOptions;
