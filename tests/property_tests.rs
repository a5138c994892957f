//! Property tests for the rule invariants.
//!
//! - Reversible actions: `unact` after `act` restores every stat
//! - Minion auras: add then remove is net-zero on the board
//! - Selectors: selecting twice equals selecting once, and `select` agrees
//!   with `matches`
//! - Condition gating: the callback runs once per qualifying occurrence

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use hearth_rules::core::{stat, Game, GameConfig, PlayerId};
use hearth_rules::effects::{
    AllMinions, ChangeAttack, ChangeHealth, Damaged, HasLowestHealth, HasTaunt, MinionAura, NotSelf, ReversibleAction,
    Selector, Taunt,
};
use hearth_rules::triggers::{AmountAtLeast, Event, EventArgs, Listener};
use hearth_rules::EntityId;

const KEYS: [&str; 4] = [stat::ATTACK, stat::HEALTH, stat::MAX_HEALTH, stat::TAUNT];

fn reversible(kind: u8, amount: i64) -> Box<dyn ReversibleAction> {
    match kind % 3 {
        0 => Box::new(ChangeAttack { amount }),
        1 => Box::new(ChangeHealth { amount }),
        _ => Box::new(Taunt),
    }
}

fn selector(kind: u8) -> Box<dyn Selector> {
    match kind % 5 {
        0 => Box::new(AllMinions),
        1 => Box::new(NotSelf),
        2 => Box::new(Damaged),
        3 => Box::new(HasTaunt),
        _ => Box::new(HasLowestHealth),
    }
}

/// Minion profile: (attack, health, damage taken, taunt grants).
fn minion_profile() -> impl Strategy<Value = (i64, i64, i64, i64)> {
    (0..10i64, 1..12i64, 0..5i64, 0..3i64)
}

fn build_board(profiles: &[(i64, i64, i64, i64)]) -> (Game, Vec<EntityId>) {
    let mut game = Game::new(GameConfig::new(2));
    let mut ids = Vec::new();
    for (i, (attack, health, damage, taunts)) in profiles.iter().enumerate() {
        let player = PlayerId::new((i % 2) as u8);
        let id = game.summon(player, "M", *attack, *health).unwrap();
        if *damage > 0 {
            game.deal_damage(None, id, *damage).unwrap();
        }
        game.modify_stat(id, stat::TAUNT, *taunts).unwrap();
        ids.push(id);
    }
    (game, ids)
}

fn snapshot(game: &Game, ids: &[EntityId]) -> Vec<[Option<i64>; 4]> {
    ids.iter()
        .map(|id| KEYS.map(|key| game.stat(*id, key)))
        .collect()
}

proptest! {
    #[test]
    fn prop_unact_restores_act(
        profile in minion_profile(),
        kind in 0u8..3,
        amount in -20i64..20,
    ) {
        let (mut game, ids) = build_board(&[profile]);
        let action = reversible(kind, amount);
        let before = snapshot(&game, &ids);

        action.act(&mut game, ids[0]).unwrap();
        action.unact(&mut game, ids[0]).unwrap();

        prop_assert_eq!(snapshot(&game, &ids), before);
    }

    #[test]
    fn prop_minion_aura_net_zero(
        profiles in prop::collection::vec(minion_profile(), 1..8),
        action_kind in 0u8..3,
        selector_kind in 0u8..5,
        amount in -5i64..6,
        owner_index in 0usize..8,
    ) {
        let (mut game, ids) = build_board(&profiles);
        let owner = ids[owner_index % ids.len()];
        let controller = game.controller_of(owner).unwrap();
        let before = snapshot(&game, &ids);

        let aura = MinionAura::from_parts(
            Rc::from(reversible(action_kind, amount)),
            Rc::from(selector(selector_kind)),
        );
        let id = game.add_aura(controller, owner, Box::new(aura)).unwrap();
        game.remove_aura(id).unwrap();

        prop_assert_eq!(snapshot(&game, &ids), before);
    }

    #[test]
    fn prop_selection_is_idempotent(
        profiles in prop::collection::vec(minion_profile(), 0..10),
        selector_kind in 0u8..5,
    ) {
        let (game, ids) = build_board(&profiles);
        let selector = selector(selector_kind);
        let source = ids.first().copied().unwrap_or(EntityId(0));

        let once = selector.select(&game, source, &ids);
        let twice = selector.select(&game, source, &once);
        prop_assert_eq!(&once, &twice);

        // Selection keeps candidate order.
        let positions: Vec<usize> = once
            .iter()
            .map(|id| ids.iter().position(|c| c == id).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_select_agrees_with_matches(
        profiles in prop::collection::vec(minion_profile(), 0..10),
        selector_kind in 0u8..5,
    ) {
        let (game, ids) = build_board(&profiles);
        let selector = selector(selector_kind);
        let source = ids.first().copied().unwrap_or(EntityId(0));
        let mut candidates = vec![EntityId(0), EntityId(1)];
        candidates.extend(&ids);

        let selected = selector.select(&game, source, &candidates);
        for candidate in &candidates {
            let alone = selector.select(&game, source, &[*candidate]);
            prop_assert_eq!(selector.matches(&game, source, *candidate), alone == vec![*candidate]);
            if selector.is_aggregate() {
                if selected.contains(candidate) {
                    prop_assert!(selector.matches(&game, source, *candidate));
                }
            } else {
                prop_assert_eq!(selected.contains(candidate), selector.matches(&game, source, *candidate));
            }
        }
    }

    #[test]
    fn prop_gated_callback_runs_per_qualifying_occurrence(
        min in 0i64..10,
        amounts in prop::collection::vec(0i64..12, 0..20),
    ) {
        let mut game = Game::new(GameConfig::new(2));
        let minion = game.summon(PlayerId::new(0), "M", 1, 1).unwrap();

        let hits = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&hits);
        let callback: Listener = Rc::new(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        let event = Event::minion("ping").with_condition(AmountAtLeast { min });
        let binding = event.bind(&mut game, minion, callback).unwrap();
        for amount in &amounts {
            game.fire(minion, "ping", &EventArgs::new().with_amount(*amount)).unwrap();
        }
        prop_assert_eq!(hits.get(), amounts.iter().filter(|a| **a >= min).count());

        event.unbind(&mut game, binding).unwrap();
        game.fire(minion, "ping", &EventArgs::new().with_amount(min)).unwrap();
        prop_assert_eq!(hits.get(), amounts.iter().filter(|a| **a >= min).count());
    }
}
