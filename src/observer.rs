use std::{error::Error, sync::Arc};

/// Defines how a consumer reacts to values pushed by a source.
///
/// `next` delivers an item, `complete` signals that no further items will
/// arrive and `error` signals a terminal failure. After `complete` or
/// `error`, a well-behaved source stops calling `next`.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: Arc<dyn Error + Send + Sync>);
}
