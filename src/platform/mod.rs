//! Browser platform layer
//!
//! Handles the DOM side of the sandbox:
//! - Element lookup with typed errors
//! - Label overlay elements (`DomLabels`)
//! - Project modal (`DomDisclosure`)
//! - Cursor dot and ring (`DomCursor`)

pub mod dom;

pub use dom::{DomCursor, DomDisclosure, DomLabels};

use snafu::Snafu;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Window};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum SetupError {
    #[snafu(display("No global window"))]
    NoWindow,

    #[snafu(display("Window has no document"))]
    NoDocument,

    #[snafu(display("Missing element #{id}"))]
    MissingElement { id: String },

    #[snafu(display("Element #{id} is not a {expected}"))]
    WrongElementType { id: String, expected: &'static str },

    #[snafu(display("Canvas has no 2d context"))]
    NoContext,

    #[snafu(display("DOM call failed: {message}"))]
    Js { message: String },
}

impl From<JsValue> for SetupError {
    fn from(value: JsValue) -> Self {
        SetupError::Js {
            message: value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        }
    }
}

pub fn window() -> Result<Window, SetupError> {
    web_sys::window().ok_or(SetupError::NoWindow)
}

pub fn document() -> Result<Document, SetupError> {
    window()?.document().ok_or(SetupError::NoDocument)
}

/// Look up `#id` and cast it to `T`
pub fn element_by_id<T: JsCast>(
    document: &Document,
    id: &str,
    expected: &'static str,
) -> Result<T, SetupError> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| SetupError::MissingElement { id: id.to_string() })?;
    element
        .dyn_into::<T>()
        .map_err(|_| SetupError::WrongElementType {
            id: id.to_string(),
            expected,
        })
}
