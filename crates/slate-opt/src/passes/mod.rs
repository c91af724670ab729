//! Pass pipeline. Each pass exposes `run(items, config) -> bool` and reports
//! whether it changed the stream.

pub mod inline;

use slate_asm::AsmItem;

use self::inline::InlineConfig;

/// Runs the pass pipeline over `items` once. Returns whether anything
/// changed; callers that want a fixed point re-invoke until it reports
/// `false`.
pub fn optimise(items: &mut Vec<AsmItem>, config: &InlineConfig) -> bool {
    inline::run(items, config)
}
