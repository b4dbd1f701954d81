pub mod attachment;
pub mod filters;

pub use attachment::{AttachmentError, AttachmentService, EncodedFile};
pub use filters::ConversationFilter;
