mod admin;
mod assets;
mod entries;

use crate::api::response::ApiError;
use crate::library::LibraryError;

pub use admin::{catalog_status, health};
pub use assets::serve_asset;
pub use entries::{create_entry, list_entries, list_keywords, list_typed_entries};

/// Map a LibraryError to an ApiError
fn library_error(e: LibraryError) -> ApiError {
    match e {
        LibraryError::Validation(msg) => ApiError::bad_request(msg),
        LibraryError::Schema(_) => ApiError::bad_request(e.to_string()),
        LibraryError::Auth(_) => ApiError::unavailable(e.to_string()),
        LibraryError::Read(_) | LibraryError::Upload(_) | LibraryError::Append(_) => {
            ApiError::bad_gateway(e.to_string())
        }
    }
}
