use proptest::collection::vec;
use proptest::prelude::*;

use slate_asm::{AsmItem, JumpKind, Label, Opcode};
use slate_opt::passes::inline;
use slate_opt::{inlinable_blocks, InlineConfig};

fn arb_plain_item() -> impl Strategy<Value = AsmItem> {
    prop_oneof![
        prop_oneof![
            Just(Opcode::Add),
            Just(Opcode::Mul),
            Just(Opcode::Pop),
            Just(Opcode::Load),
            Just(Opcode::Store),
            Just(Opcode::Stop),
        ]
        .prop_map(AsmItem::op),
        (0u64..4).prop_map(|id| AsmItem::PushLabel(Label::from_u64(id))),
        (0u64..4).prop_map(|id| AsmItem::LabelDef(Label::from_u64(id))),
        any::<u32>().prop_map(|v| AsmItem::PushData(u64::from(v))),
    ]
}

fn arb_item() -> impl Strategy<Value = AsmItem> {
    prop_oneof![
        4 => arb_plain_item(),
        1 => prop_oneof![
            Just(JumpKind::Ordinary),
            Just(JumpKind::IntoCall),
            Just(JumpKind::OutOfCall),
        ]
        .prop_map(AsmItem::jump),
        1 => Just(AsmItem::op(Opcode::JumpIf)),
    ]
}

fn defined_labels(items: &[AsmItem]) -> Vec<Label> {
    items.iter().filter_map(AsmItem::defined_label).collect()
}

proptest! {
    #[test]
    fn jump_free_programs_are_untouched(
        items in vec(arb_plain_item(), 0..40),
        runs in 0u64..10_000,
    ) {
        prop_assert!(inlinable_blocks(&items).is_empty());

        let mut optimised = items.clone();
        let config = InlineConfig { expected_runs: runs, ..InlineConfig::default() };
        prop_assert!(!inline::run(&mut optimised, &config));
        prop_assert_eq!(optimised, items);
    }

    #[test]
    fn push_counts_match_label_occurrences(items in vec(arb_item(), 0..60)) {
        for (label, block) in inlinable_blocks(&items) {
            let occurrences = items
                .iter()
                .filter(|item| item.pushed_label() == Some(label))
                .count() as u64;
            prop_assert_eq!(block.push_count, occurrences);
            prop_assert!(!block.items.is_empty());
            prop_assert!(block.items[block.items.len() - 1].is_unconditional_jump());
            prop_assert!(block.items.iter().all(|item| item.pushed_label() != Some(label)));
        }
    }

    #[test]
    fn rewriting_preserves_label_definitions(
        items in vec(arb_item(), 0..60),
        runs in 0u64..100_000,
    ) {
        let mut optimised = items.clone();
        let config = InlineConfig { expected_runs: runs, ..InlineConfig::default() };
        inline::run(&mut optimised, &config);

        // Inlined bodies contain no label definitions and removed call sites
        // are push/jump pairs, so the definitions survive in order.
        prop_assert_eq!(defined_labels(&optimised), defined_labels(&items));
    }

    #[test]
    fn more_expected_runs_never_disables_inlining(
        body_ops in 0usize..40,
        sites in 1u64..60,
        runs in 0u64..50_000,
        extra in 0u64..50_000,
    ) {
        let mut body = vec![AsmItem::op(Opcode::Add); body_ops];
        body.push(AsmItem::jump(JumpKind::OutOfCall));

        let base = InlineConfig { expected_runs: runs, ..InlineConfig::default() };
        let more = InlineConfig { expected_runs: runs + extra, ..InlineConfig::default() };
        if inline::should_inline_full_function_body(&body, sites, &base) {
            prop_assert!(inline::should_inline_full_function_body(&body, sites, &more));
        }
    }
}
