//! Playground view layer
//!
//! [`project`] turns a store snapshot into a [`PlaygroundView`] without side
//! effects; [`render_html`] turns that view into the page served by the web
//! shell. Re-rendering on change is a matter of projecting the latest
//! snapshot received from `PlaygroundStore::subscribe`.

pub mod html;
pub mod projection;

pub use html::{escape, render_html};
pub use projection::{
    project, CategoryGroup, ComposerView, EnvWarning, FieldView, ModelRow, PlaygroundView,
    ProviderGroup, ResultCard, SidebarView,
};
