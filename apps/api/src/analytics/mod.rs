// Read-only views over the job collection: aggregate analytics and the
// derived activity timeline.

pub mod aggregation;
pub mod handlers;
pub mod timeline;
