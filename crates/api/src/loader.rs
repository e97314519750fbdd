use crate::error::ApiResult;
use crate::models::ProgramSnapshot;

/// Front end that turns package arguments into a program snapshot.
///
/// Loading is all-or-nothing: an implementation either returns a snapshot
/// holding every package transitively required by `package_args`, or an
/// error. A partially populated snapshot is never returned.
pub trait ProgramLoader: Send + Sync {
    fn load(&self, package_args: &[String], build_tags: &[String]) -> ApiResult<ProgramSnapshot>;
}
