pub mod assessment;
pub mod template;
