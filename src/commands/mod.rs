pub mod general;
pub mod permissions;
pub mod templates;

pub use general::{help, ping};
pub use permissions::{set, undo};
pub use templates::{template_apply, template_list, template_save};
