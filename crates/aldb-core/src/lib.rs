pub mod activity;
pub mod errors;
pub mod ids;
pub mod lang;
pub mod mediatype;
pub mod participation;
pub mod sample;
pub mod validation;
pub mod version;

pub use activity::{ActivityVersion, AttributeSet, AttributeSetManifest, Blob, BlobManifest, Period};
pub use errors::{LocalizeError, MediaTypeError, ValidationError};
pub use ids::ActivityKey;
pub use participation::{Group, Participation, Participator, Person};
pub use validation::{ValidationReport, ValidationWarning};
