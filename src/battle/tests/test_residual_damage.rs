#[cfg(test)]
mod tests {
    use crate::battle::decision::Intent;
    use crate::battle::state::BattleEvent;
    use crate::battle::tests::common::{
        assert_hp_invariants, create_team_battle, create_test_battle, p1, predictable_rng, scripted_battle,
        TestCombatantBuilder,
    };
    use crate::player::{CombatantId, SideId};
    use pretty_assertions::assert_eq;
    use schema::StatusKind;

    fn residual_damage_to(events: &[BattleEvent], id: CombatantId) -> Vec<u16> {
        events
            .iter()
            .filter_map(|event| match event {
                BattleEvent::StatusDamage { target, damage, .. } if *target == id => Some(*damage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_toxic_damage_strictly_increases_until_faint() {
        // Arrange
        let snorlax = TestCombatantBuilder::new("Snorlax", 50)
            .with_moves(&["Harden"])
            .with_status(StatusKind::Toxic)
            .build();
        let eevee = TestCombatantBuilder::new("Eevee", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_test_battle(snorlax, eevee), vec![], vec![], predictable_rng());

        // Act
        for _ in 0..20 {
            if battle.is_over() {
                break;
            }
            battle.run_turn().unwrap();
            assert_hp_invariants(battle.state());
        }

        // Assert: the fatal tick is capped by the hp left, so only surviving ticks are compared.
        let damages: Vec<u16> = battle
            .log()
            .events()
            .iter()
            .filter_map(|event| match event {
                BattleEvent::StatusDamage {
                    target,
                    damage,
                    remaining_hp,
                    ..
                } if *target == p1(0) && *remaining_hp > 0 => Some(*damage),
                _ => None,
            })
            .collect();
        assert!(damages.len() >= 3, "expected several toxic ticks, got {damages:?}");
        assert!(damages.windows(2).all(|pair| pair[0] < pair[1]), "{damages:?}");
        assert_eq!(damages[0], 13);
        assert_eq!(battle.outcome().and_then(|outcome| outcome.winner), Some(SideId::Player2));
    }

    #[test]
    fn test_toxic_counter_resets_while_benched() {
        // Arrange: Snorlax takes one toxic tick, switches out, then comes back.
        let team = vec![
            TestCombatantBuilder::new("Snorlax", 50)
                .with_moves(&["Harden"])
                .with_status(StatusKind::Toxic)
                .build(),
            TestCombatantBuilder::new("Eevee", 50).with_moves(&["Harden"]).build(),
        ];
        let lapras = TestCombatantBuilder::new("Lapras", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(
            create_team_battle(team, vec![lapras]),
            vec![Intent::Switch(1), Intent::Switch(0)],
            vec![],
            predictable_rng(),
        );

        // Act
        let switch_out_turn = battle.run_turn().unwrap();
        let return_turn = battle.run_turn().unwrap();

        // Assert: 220 hp, so 13 is the first tick and 27 would be the second.
        assert_eq!(residual_damage_to(switch_out_turn.events(), p1(0)), vec![13]);
        assert_eq!(residual_damage_to(return_turn.events(), p1(0)).first(), Some(&13));
    }

    #[test]
    fn test_poison_deals_an_eighth_per_invocation() {
        let pikachu = TestCombatantBuilder::new("Pikachu", 50)
            .with_moves(&["Harden"])
            .with_status(StatusKind::Poison)
            .build();
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_test_battle(pikachu, snorlax), vec![], vec![], predictable_rng());

        let bus = battle.run_turn().unwrap();

        // hp_max 95: 95 / 8 = 11 every time.
        let damages = residual_damage_to(bus.events(), p1(0));
        assert!(!damages.is_empty());
        assert!(damages.iter().all(|damage| *damage == 11), "{damages:?}");
        assert_hp_invariants(battle.state());
    }

    #[test]
    fn test_poison_keeps_ticking_on_the_bench() {
        // Arrange: Eevee is poisoned but never leaves the bench.
        let team = vec![
            TestCombatantBuilder::new("Pikachu", 50).with_moves(&["Harden"]).build(),
            TestCombatantBuilder::new("Eevee", 50)
                .with_moves(&["Harden"])
                .with_status(StatusKind::Poison)
                .build(),
        ];
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_team_battle(team, vec![snorlax]), vec![], vec![], predictable_rng());

        // Act
        let bus = battle.run_turn().unwrap();

        // Assert: hp_max 115, so 14 per tick.
        let eevee = battle.state().combatant(p1(1)).unwrap();
        let damages = residual_damage_to(bus.events(), p1(1));
        assert!(!battle.state().is_active(p1(1)));
        assert!(!damages.is_empty());
        assert!(damages.iter().all(|damage| *damage == 14), "{damages:?}");
        assert_eq!(eevee.hp(), eevee.hp_max() - 14 * damages.len() as u16);
        assert_hp_invariants(battle.state());
    }

    #[test]
    fn test_residual_damage_is_capped_by_remaining_hp() {
        let rattata = TestCombatantBuilder::new("Rattata", 50)
            .with_moves(&["Harden"])
            .with_status(StatusKind::Burn)
            .with_hp(1)
            .build();
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_test_battle(rattata, snorlax), vec![], vec![], predictable_rng());

        let bus = battle.run_turn().unwrap();

        assert!(bus.events().contains(&BattleEvent::StatusDamage {
            target: p1(0),
            status: StatusKind::Burn,
            damage: 1,
            remaining_hp: 0,
        }));
        assert!(bus.events().contains(&BattleEvent::Fainted { target: p1(0) }));
        assert_hp_invariants(battle.state());
    }
}
