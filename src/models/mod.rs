pub mod attachment;
pub mod guide;
pub mod loaders;
pub mod outcome;

pub use attachment::{AttachmentRef, AttachmentSet};
pub use guide::GuideRecord;
pub use loaders::{load_batch_folder, BatchFolder, XmlDocument};
pub use outcome::{BatchReport, Pairing, SubmissionOutcome, UnmatchedAttachment, GUIDE_NOT_FOUND};
