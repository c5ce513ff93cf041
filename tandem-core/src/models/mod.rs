pub mod alignment;
pub mod read;
pub mod strand;

// re-export for cleaner imports
pub use self::alignment::{AlignmentKind, AlignmentRecord};
pub use self::read::Read;
pub use self::strand::Strand;
