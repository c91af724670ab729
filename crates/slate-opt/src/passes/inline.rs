//! Function-body inlining.
//!
//! Calls in Slate assembly are a four-item idiom: push the return label, push
//! the target label, `jump [in]`, then define the return label. The called
//! block ends in `jump [out]`, which consumes the pushed return address. This
//! pass replaces the `push :target; jump [in]` pair with a physical copy of
//! the target block whenever the one-time byte deposit of the copies is
//! cheaper than the recurring call overhead over the program's expected
//! lifetime. The copy's trailing jump becomes an ordinary jump to the return
//! label defined immediately after it, which later cleanup can collapse.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use slate_asm::{semantics, AsmItem, JumpKind, Label, Opcode, VmVersion, LABEL_ADDRESS_BYTES};
use slate_gas::{deposit_gas, GasConsumption, GasMeter};

/// Inliner tuning for one optimisation run.
#[derive(Debug, Clone, Copy)]
pub struct InlineConfig {
    /// VM revision the program targets; selects the gas schedule.
    pub version: VmVersion,
    /// Assumed number of executions over the program's lifetime. Weights the
    /// recurring call overhead against the one-time deposit of inlined
    /// copies.
    pub expected_runs: u64,
    /// Whether the stream is top-level constructor code, whose bytes are
    /// priced as transaction data rather than as a deposited runtime object.
    pub is_constructor_context: bool,
}

impl Default for InlineConfig {
    fn default() -> Self {
        InlineConfig {
            version: VmVersion::latest(),
            expected_runs: 200,
            is_constructor_context: false,
        }
    }
}

/// A straight-line block eligible for inlining, plus the number of call sites
/// that currently push its label.
#[derive(Debug, Clone, Copy)]
pub struct InlinableBlock<'a> {
    /// Body items, up to and including the terminating `jump [out]`.
    pub items: &'a [AsmItem],
    /// Live `push :label` occurrences targeting this block.
    pub push_count: u64,
}

/// What a call site costs each time it executes when left uninlined.
const CALL_SITE_PATTERN: [AsmItem; 4] = [
    AsmItem::PushLabel(Label::ZERO),
    AsmItem::PushLabel(Label::ZERO),
    AsmItem::Op {
        op: Opcode::Jump,
        jump: JumpKind::Ordinary,
    },
    AsmItem::LabelDef(Label::ZERO),
];

/// The label definition and return jump wrapping an uninlined body.
const ENTRY_EXIT_PATTERN: [AsmItem; 2] = [
    AsmItem::LabelDef(Label::ZERO),
    AsmItem::Op {
        op: Opcode::Jump,
        jump: JumpKind::Ordinary,
    },
];

fn is_inline_candidate(label: Label, items: &[AsmItem]) -> bool {
    assert!(!items.is_empty(), "inline candidate block must be non-empty");

    // Only blocks that end in an unconditional jump can replace a call site
    // without re-analysing control flow.
    if !items[items.len() - 1].is_unconditional_jump() {
        return false;
    }

    // Never inline a block that pushes its own label; substituting it would
    // recurse.
    items.iter().all(|item| item.pushed_label() != Some(label))
}

/// Scans `items` once and returns, per label, the straight-line block an
/// inliner could substitute for calls to that label, along with how often the
/// label is pushed anywhere in the program.
///
/// A label that is defined but never pushed is dropped; no call site reaches
/// it through this idiom. A label pushed but never defined produces no block
/// in the first place. Should a label be defined twice, the last candidate
/// wins; well-formed streams never do this, the rule only pins down
/// determinism.
pub fn inlinable_blocks(items: &[AsmItem]) -> BTreeMap<Label, InlinableBlock<'_>> {
    let mut candidates: BTreeMap<Label, &[AsmItem]> = BTreeMap::new();
    let mut push_counts: BTreeMap<Label, u64> = BTreeMap::new();
    let mut open_label: Option<usize> = None;

    for (index, item) in items.iter().enumerate() {
        // The number of pushes of a label approximates its call-site count.
        if let Some(label) = item.pushed_label() {
            *push_counts.entry(label).or_default() += 1;
        }

        if let Some(start) = open_label {
            if semantics::breaks_straight_line_block(item, false) {
                let label = items[start]
                    .defined_label()
                    .expect("open label indexes a label definition");
                let block = &items[start + 1..=index];
                if is_inline_candidate(label, block) {
                    candidates.insert(label, block);
                }
                open_label = None;
            }
        }

        if item.defined_label().is_some() {
            open_label = Some(index);
        }
    }

    // Keep only blocks someone actually calls, and attach the tally.
    candidates
        .into_iter()
        .filter_map(|(label, block)| {
            let push_count = push_counts.get(&label).copied().unwrap_or(0);
            (push_count > 0).then_some((
                label,
                InlinableBlock {
                    items: block,
                    push_count,
                },
            ))
        })
        .collect()
}

/// Worst-case execution gas of `items`, saturating to `u128::MAX` when any
/// term is unbounded.
fn execution_cost(items: &[AsmItem], version: VmVersion) -> u128 {
    let meter = GasMeter::new(version);
    let mut total = GasConsumption::default();
    for item in items {
        total = total.add(meter.estimate_max(item, false));
    }
    if total.unbounded {
        u128::MAX
    } else {
        u128::from(total.value)
    }
}

/// Encoded size of `items` in bytes, assuming the configured address width
/// for label references.
fn code_size(items: &[AsmItem]) -> u64 {
    items
        .iter()
        .map(|item| item.encoded_size(LABEL_ADDRESS_BYTES))
        .sum()
}

/// Whether substituting `block` for every one of its `push_count` call sites
/// is a net win.
///
/// The body executes equally often either way, so only the surrounding idiom
/// is compared: uninlined, every call executes the call-site and entry/exit
/// patterns and their bytes are deposited once per site (call pattern) or
/// once overall (entry/exit and body); inlined, that execution overhead
/// vanishes but each site deposits its own copy of the body. The body's
/// trailing jump is excluded from the copy's size: once re-tagged ordinary
/// it jumps to the label defined immediately after it and is assumed to fold
/// away.
pub fn should_inline_full_function_body(
    block: &[AsmItem],
    push_count: u64,
    config: &InlineConfig,
) -> bool {
    let body_size = code_size(&block[..block.len() - 1]);

    // Pushes of the label approximate both the number of call sites and the
    // number of calls per run.
    let call_pattern_cost = execution_cost(&CALL_SITE_PATTERN, config.version)
        .saturating_add(execution_cost(&ENTRY_EXIT_PATTERN, config.version));
    let uninlined_execution_cost = u128::from(push_count).saturating_mul(call_pattern_cost);

    let uninlined_deposit = u128::from(deposit_gas(
        push_count
            .saturating_mul(code_size(&CALL_SITE_PATTERN))
            .saturating_add(code_size(&ENTRY_EXIT_PATTERN))
            .saturating_add(body_size),
        config.is_constructor_context,
        config.version,
    ));
    let inlined_deposit = u128::from(deposit_gas(
        push_count.saturating_mul(body_size),
        config.is_constructor_context,
        config.version,
    ));

    u128::from(config.expected_runs)
        .saturating_mul(uninlined_execution_cost)
        .saturating_add(uninlined_deposit)
        > inlined_deposit
}

/// Checks one call site against its target block.
///
/// `call_jump` and the block's terminating jump must both be unconditional
/// jumps; anything else is a broken invariant upstream and panics. Only a
/// `jump [in]` site targeting a block that returns via `jump [out]` is the
/// call idiom this pass understands. Returns the classification to force
/// onto the inlined copy's trailing jump when inlining pays off.
pub fn should_inline(
    call_jump: &AsmItem,
    block: &InlinableBlock<'_>,
    config: &InlineConfig,
) -> Option<JumpKind> {
    let exit_jump = block.items.last().expect("inlinable block is never empty");
    assert!(
        call_jump.is_unconditional_jump() && exit_jump.is_unconditional_jump(),
        "call site and block exit must both be unconditional jumps"
    );

    if call_jump.jump_kind() == Some(JumpKind::IntoCall)
        && exit_jump.jump_kind() == Some(JumpKind::OutOfCall)
        && should_inline_full_function_body(block.items, block.push_count, config)
    {
        Some(JumpKind::Ordinary)
    } else {
        None
    }
}

/// Runs the inlining pass over `items`. Returns whether anything changed.
///
/// Single forward pass with one item of lookahead. Each approved call site
/// is replaced by an independent copy of the target block; the block's
/// push count drops by one (that site is gone) and every candidate label
/// pushed inside the copied body gains one (the copy is a new live push), so
/// later sites in the same pass see accurate counts. Sites already emitted
/// are never revisited.
pub fn run(items: &mut Vec<AsmItem>, config: &InlineConfig) -> bool {
    let program = std::mem::take(items);
    let mut blocks = inlinable_blocks(&program);
    if blocks.is_empty() {
        *items = program;
        return false;
    }
    debug!(candidates = blocks.len(), "inline: extracted candidate blocks");

    let mut out: Vec<AsmItem> = Vec::with_capacity(program.len());
    let mut changed = false;
    let mut index = 0;
    while index < program.len() {
        let item = program[index];

        let call = match (item.pushed_label(), program.get(index + 1)) {
            (Some(label), Some(next)) if next.is_unconditional_jump() => Some((label, next)),
            _ => None,
        };

        if let Some((label, call_jump)) = call {
            let mut approved: Option<(&[AsmItem], JumpKind)> = None;
            if let Some(block) = blocks.get_mut(&label) {
                if let Some(exit_kind) = should_inline(call_jump, block, config) {
                    trace!(%label, push_count = block.push_count, "inline: substituting call site");
                    // This call site is consumed by the substitution.
                    block.push_count -= 1;
                    approved = Some((block.items, exit_kind));
                }
            }

            if let Some((body, exit_kind)) = approved {
                out.extend_from_slice(body);
                let exit = out.last_mut().expect("inlinable block is never empty");
                let retagged = exit.with_jump_kind(exit_kind);
                *exit = retagged;

                // The copied body may push labels of other candidates; each
                // copy is a new live call site for whatever it targets.
                for nested in body {
                    if let Some(nested_label) = nested.pushed_label() {
                        if let Some(nested_block) = blocks.get_mut(&nested_label) {
                            nested_block.push_count += 1;
                        }
                    }
                }

                changed = true;
                index += 2;
                continue;
            }
        }

        out.push(item);
        index += 1;
    }

    *items = out;
    changed
}
