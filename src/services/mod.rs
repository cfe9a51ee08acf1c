pub mod attachment_matcher;
pub mod guide_extractor;
pub mod submitter;

pub use attachment_matcher::{find_guide, match_attachments, MatchReport};
pub use guide_extractor::{extract_guides, local_name};
pub use submitter::{SubmitResponse, Submitter};
