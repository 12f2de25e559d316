pub mod document;

pub(crate) use document::DocumentRecord;
