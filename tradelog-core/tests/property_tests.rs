//! Property tests for the per-position calculator and the sorter.
//!
//! Uses proptest to verify:
//! 1. Directional symmetry — a long and its short twin mirror each other's P&L
//! 2. Close consistency — realized P&L equals unrealized P&L at the exit price
//! 3. Sort reversal — descending is the exact reverse of ascending for distinct keys
//! 4. Sort stability — equal keys keep their input order

use proptest::prelude::*;
use tradelog_core::position::{close, unrealized_pl};
use tradelog_core::sort::{sort_by_key, SortDirection};
use tradelog_core::{TradeId, TradeRecord, TradeType};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_quantity() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|q| (q * 100.0).round() / 100.0)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn open_position(trade_type: TradeType, entry: f64, quantity: f64) -> TradeRecord {
    TradeRecord {
        id: TradeId::new("pos"),
        date: "2024-05-01".into(),
        symbol: "SPY".into(),
        trade_type,
        quantity,
        entry_price: entry,
        exit_price: 0.0,
        stop_loss: None,
        risk_amount: None,
        strategy: "Untagged".into(),
        profit_loss: 0.0,
        risk_reward_ratio: None,
        notes: None,
        created_at: None,
        updated_at: None,
    }
}

// ── 1. Directional symmetry ──────────────────────────────────────────

proptest! {
    #[test]
    fn long_and_short_twin_are_mirror_images(
        entry in arb_price(),
        qty in arb_quantity(),
        price in arb_price(),
    ) {
        let long = open_position(TradeType::Long, entry, qty);
        let short = open_position(TradeType::Short, entry, qty);
        let l = unrealized_pl(&long, Some(price));
        let s = unrealized_pl(&short, Some(price));
        prop_assert!((l + s).abs() < 1e-9);
    }

    #[test]
    fn close_books_the_unrealized_pl(
        entry in arb_price(),
        qty in arb_quantity(),
        exit in arb_price(),
        short in any::<bool>(),
    ) {
        let side = if short { TradeType::Short } else { TradeType::Long };
        let pos = open_position(side, entry, qty);
        let expected = unrealized_pl(&pos, Some(exit));
        let closed = close(&pos, exit, "2024-05-02").unwrap();
        prop_assert_eq!(closed.profit_loss, expected);
        prop_assert!(closed.is_closed());
    }

    #[test]
    fn rr_is_non_negative_when_present(
        entry in arb_price(),
        qty in arb_quantity(),
        exit in arb_price(),
        stop in arb_price(),
    ) {
        let mut pos = open_position(TradeType::Long, entry, qty);
        pos.stop_loss = Some(stop);
        let closed = close(&pos, exit, "2024-05-02").unwrap();
        if let Some(rr) = closed.risk_reward_ratio {
            prop_assert!(rr >= 0.0);
        }
    }
}

// ── 3. & 4. Sorting ──────────────────────────────────────────────────

fn trades_with_pl(values: &[f64]) -> Vec<TradeRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, &pl)| {
            let mut t = open_position(TradeType::Long, 10.0, 1.0);
            t.id = TradeId::new(format!("t{i}"));
            t.profit_loss = pl;
            t.exit_price = 11.0;
            t
        })
        .collect()
}

proptest! {
    #[test]
    fn descending_reverses_ascending_for_distinct_keys(
        values in prop::collection::btree_set(-10_000i64..10_000, 0..40),
    ) {
        // btree_set → distinct; shuffle deterministically by reversing halves
        let mut pls: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
        let mid = pls.len() / 2;
        pls[..mid].reverse();
        let trades = trades_with_pl(&pls);

        let asc = sort_by_key(&trades, "profitLoss", SortDirection::Ascending);
        let mut desc = sort_by_key(&trades, "profitLoss", SortDirection::Descending);
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    #[test]
    fn equal_keys_keep_input_order(
        values in prop::collection::vec(0i64..3, 0..40),
    ) {
        let pls: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
        let trades = trades_with_pl(&pls);

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let sorted = sort_by_key(&trades, "profitLoss", direction);
            for pair in sorted.windows(2) {
                if pair[0].profit_loss == pair[1].profit_loss {
                    let a: usize = pair[0].id.as_str()[1..].parse().unwrap();
                    let b: usize = pair[1].id.as_str()[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}
