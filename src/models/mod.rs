pub mod document;
pub mod folder;
pub mod qtree;
pub mod tree;
pub mod user;
pub mod work;

pub use document::*;
pub use folder::*;
pub use qtree::*;
pub use tree::*;
pub use user::*;
pub use work::*;

use validator::ValidationError;

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("cannot be empty".into());
        return Err(error);
    }
    Ok(())
}
