pub mod console;
pub mod cucumber_json;
pub mod html;
pub mod report_model;
pub mod viewer;
