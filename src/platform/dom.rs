//! DOM-backed label overlay, project modal and custom cursor

use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, HtmlAnchorElement, HtmlElement};

use super::{SetupError, element_by_id, window};
use crate::cursor::CursorStyle;
use crate::disclosure::Disclosure;
use crate::overlay::{LabelSink, LabelTransform};
use crate::projects::{LabelContent, ProjectRecord};

fn create_div(document: &Document) -> Result<HtmlElement, SetupError> {
    document
        .create_element("div")?
        .dyn_into::<HtmlElement>()
        .map_err(|_| SetupError::WrongElementType {
            id: "div".to_string(),
            expected: "HtmlElement",
        })
}

/// One absolutely positioned label per block inside `#block-labels`
pub struct DomLabels {
    labels: Vec<HtmlElement>,
}

impl DomLabels {
    pub const CONTAINER_ID: &'static str = "block-labels";

    /// Create label `i` for `projects[i]`, appended in order
    pub fn create(document: &Document, projects: &[Rc<ProjectRecord>]) -> Result<Self, SetupError> {
        let container: HtmlElement = element_by_id(document, Self::CONTAINER_ID, "HtmlElement")?;

        let mut labels = Vec::with_capacity(projects.len());
        for project in projects {
            let content = LabelContent::from_record(project);
            let label = create_div(document)?;
            label.set_class_name("block-label");
            let style = label.style();
            style.set_property("position", "absolute")?;
            style.set_property("pointer-events", "none")?;

            let title = create_div(document)?;
            title.set_class_name("block-label-title");
            title.set_text_content(Some(&content.title));
            title.style().set_property("color", &content.color)?;
            title
                .style()
                .set_property("text-shadow", &format!("0 0 12px {}", content.glow))?;

            let subtitle = create_div(document)?;
            subtitle.set_class_name("block-label-tag");
            subtitle.set_text_content(Some(&content.subtitle));

            label.append_child(&title)?;
            label.append_child(&subtitle)?;
            container.append_child(&label)?;
            labels.push(label);
        }

        log::info!("Created {} block labels", labels.len());
        Ok(Self { labels })
    }
}

impl LabelSink for DomLabels {
    fn apply(&mut self, index: usize, transform: &LabelTransform) -> bool {
        let Some(label) = self.labels.get(index) else {
            return false;
        };
        if !label.is_connected() {
            return false;
        }
        let style = label.style();
        style.set_property("left", &transform.css_left()).is_ok()
            && style.set_property("top", &transform.css_top()).is_ok()
            && style
                .set_property("transform", &transform.css_transform())
                .is_ok()
    }
}

/// The `#project-modal` dialog
pub struct DomDisclosure {
    document: Document,
    modal: HtmlElement,
    title: HtmlElement,
    description: HtmlElement,
    link: HtmlAnchorElement,
    tags: HtmlElement,
}

impl DomDisclosure {
    pub const MODAL_ID: &'static str = "project-modal";
    pub const CLOSE_ID: &'static str = "closeModal";
    const VISIBLE_CLASS: &'static str = "visible";

    pub fn find(document: &Document) -> Result<Self, SetupError> {
        Ok(Self {
            document: document.clone(),
            modal: element_by_id(document, Self::MODAL_ID, "HtmlElement")?,
            title: element_by_id(document, "modal-title", "HtmlElement")?,
            description: element_by_id(document, "modal-desc", "HtmlElement")?,
            link: element_by_id(document, "modal-link", "HtmlAnchorElement")?,
            tags: element_by_id(document, "modal-tags", "HtmlElement")?,
        })
    }

    pub fn modal(&self) -> &HtmlElement {
        &self.modal
    }

    fn fill(&self, record: &ProjectRecord) -> Result<(), SetupError> {
        self.title.set_inner_text(&record.name);
        self.description.set_inner_text(&record.description);
        self.link.set_href(&record.link);

        self.tags.set_text_content(None);
        for tag in &record.tags {
            let span = self.document.create_element("span")?;
            span.set_class_name("tag");
            span.set_text_content(Some(tag));
            self.tags.append_child(&span)?;
        }

        self.modal.style().set_property("display", "block")?;

        // Let the display change land before the fade-in class
        let modal = self.modal.clone();
        let reveal = Closure::once_into_js(move || {
            let _ = modal.class_list().add_1(DomDisclosure::VISIBLE_CLASS);
        });
        window()?.set_timeout_with_callback_and_timeout_and_arguments_0(
            reveal.unchecked_ref(),
            10,
        )?;
        Ok(())
    }
}

impl Disclosure for DomDisclosure {
    fn show(&mut self, record: Rc<ProjectRecord>) {
        if let Err(e) = self.fill(&record) {
            log::warn!("Could not open project '{}': {e}", record.name);
        }
    }

    fn hide(&mut self) {
        let _ = self.modal.style().set_property("display", "none");
        let _ = self.modal.class_list().remove_1(Self::VISIBLE_CLASS);
    }
}

/// `#cursor` dot and `#cursor-ring`
pub struct DomCursor {
    dot: HtmlElement,
    ring: HtmlElement,
}

impl DomCursor {
    pub fn find(document: &Document) -> Result<Self, SetupError> {
        Ok(Self {
            dot: element_by_id(document, "cursor", "HtmlElement")?,
            ring: element_by_id(document, "cursor-ring", "HtmlElement")?,
        })
    }

    pub fn place_dot(&self, pos: Vec2) {
        place(&self.dot, pos);
    }

    pub fn place_ring(&self, pos: Vec2) {
        place(&self.ring, pos);
    }

    pub fn apply_style(&self, style: CursorStyle) {
        let look = style.appearance();
        let dot = self.dot.style();
        let _ = dot.set_property("width", look.dot_size);
        let _ = dot.set_property("height", look.dot_size);
        let _ = dot.set_property("background", look.dot_background);
        let ring = self.ring.style();
        let _ = ring.set_property("transform", look.ring_transform);
        let _ = ring.set_property("border-color", look.ring_border);
    }
}

fn place(element: &HtmlElement, pos: Vec2) {
    let style = element.style();
    let _ = style.set_property("left", &format!("{}px", pos.x));
    let _ = style.set_property("top", &format!("{}px", pos.y));
}
