//! Front end for an OpenGL ES style shading language: source handling,
//! tokenizer, preprocessor and the type model used by the parser.

pub mod diagnostic;
pub mod driver;
pub mod lang_options;
pub mod pp;
pub mod source_manager;
pub mod types;
