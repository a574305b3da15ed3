pub mod admin_helpers;
pub mod input_helpers;
pub mod public_helpers;
pub mod slug_helpers;
