mod entry;
mod rule_index;

pub use self::entry::CachedCondition;
pub use self::rule_index::RuleIndex;
