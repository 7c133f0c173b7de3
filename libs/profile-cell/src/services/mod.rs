pub mod photo;
pub mod profile;
pub mod validation;

pub use photo::{encode_photo, load_photo};
pub use profile::{ProfileGateway, ProfileService};
pub use validation::ProfileValidator;
