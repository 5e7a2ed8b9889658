//! Canvas rendering module
//!
//! Uses the 2D canvas context; the label overlay is plain DOM on top.

pub mod canvas;

pub use canvas::CanvasRenderer;
