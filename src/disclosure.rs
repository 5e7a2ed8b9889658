//! Project detail view
//!
//! The scene only ever says "show this record" or "hide". How the detail view
//! looks is up to the implementation (the DOM modal in the browser build).

use std::rc::Rc;

use crate::projects::ProjectRecord;

pub trait Disclosure {
    fn show(&mut self, record: Rc<ProjectRecord>);
    fn hide(&mut self);
}

/// Disclosure that only logs, used when the page has no modal markup
#[derive(Debug, Default)]
pub struct LogDisclosure {
    current: Option<Rc<ProjectRecord>>,
}

impl LogDisclosure {
    pub fn current(&self) -> Option<&ProjectRecord> {
        self.current.as_deref()
    }
}

impl Disclosure for LogDisclosure {
    fn show(&mut self, record: Rc<ProjectRecord>) {
        log::info!("Selected project: {} ({})", record.name, record.link);
        self.current = Some(record);
    }

    fn hide(&mut self) {
        if let Some(record) = self.current.take() {
            log::info!("Closed project: {}", record.name);
        }
    }
}
