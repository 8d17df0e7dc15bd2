mod rule_source;
mod sync;

pub use self::rule_source::{InMemoryRuleSource, PgRuleSource, RuleSource, SourceError};
pub use self::sync::{Reconciler, SyncError};
